//! ICS feed generation.
//!
//! This module writes the calendar document by hand rather than through an
//! iCalendar builder: output has to be byte-exact (escaping, folding at 75
//! characters, property order) so that regenerated feeds diff cleanly.

mod escape;
mod fold;
mod generate;

pub use escape::escape_text;
pub use fold::{MAX_LINE_LENGTH, fold_line};
pub use generate::{build_icalendar, build_icalendar_at, generate_feed, generate_feed_at};
