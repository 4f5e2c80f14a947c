//! Error types for calendar generation.

use thiserror::Error;

/// Errors that can occur while normalizing, serializing or fetching events.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Event has neither a 'date' nor a 'start' entry")]
    MissingDate,

    #[error("Cannot parse date from {0}")]
    UnparseableDate(String),

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("Node.js not found in PATH (required to run the romcal bridge)")]
    RomcalNotInstalled,

    #[error("romcal bridge script not found at {0}")]
    RomcalScriptNotFound(String),

    #[error("romcal error: {0}")]
    Romcal(String),

    #[error("romcal bridge timed out after {0}s")]
    RomcalTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
