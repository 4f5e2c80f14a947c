//! Feed-ready event type.
//!
//! An `Event` is what the normalizer produces from one romcal record and
//! what the ICS generator consumes. Events are whole-day and never carry a
//! time of day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A normalized liturgical celebration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// `local@domain`, stable across runs for derived identifiers
    pub uid: String,
    pub summary: String,
    /// Newline separated `Label: value` facts, possibly empty
    pub description: String,
    /// Never empty
    pub categories: Vec<String>,
    pub date: NaiveDate,
}

impl Event {
    /// The exclusive end date of the all-day entry.
    ///
    /// The normalizer rejects `NaiveDate::MAX`, so events it produces always
    /// end on the following day.
    pub fn end_date(&self) -> NaiveDate {
        self.date.succ_opt().unwrap_or(self.date)
    }
}
