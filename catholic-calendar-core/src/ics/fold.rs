//! Content line folding.

/// Longest physical line, in characters.
pub const MAX_LINE_LENGTH: usize = 75;

/// Split a content line into physical lines.
///
/// The first line keeps up to 75 characters; every continuation line is a
/// single space followed by up to 74 characters. Lengths are counted in
/// characters, so multi-byte text is never split inside a character.
pub fn fold_line(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= MAX_LINE_LENGTH {
        return vec![line.to_string()];
    }

    let (first, rest) = chars.split_at(MAX_LINE_LENGTH);
    let mut lines = vec![first.iter().collect::<String>()];
    for chunk in rest.chunks(MAX_LINE_LENGTH - 1) {
        let mut continuation = String::with_capacity(chunk.len() + 1);
        continuation.push(' ');
        continuation.extend(chunk);
        lines.push(continuation);
    }
    lines
}
