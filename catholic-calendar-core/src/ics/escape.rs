//! TEXT value escaping (RFC 5545 §3.3.11).

/// Escape a free-text property value.
///
/// Backslashes are escaped first so that the escapes introduced for
/// newlines, commas and semicolons are not doubled. Carriage returns are
/// dropped.
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
