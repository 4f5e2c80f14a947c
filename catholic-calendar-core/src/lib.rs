//! Liturgical calendar feeds from romcal data.
//!
//! The crate is organised around a one-way pipeline:
//! - `source` fetches loosely-typed records from romcal
//! - `normalize` turns each record into an [`Event`]
//! - `ics` serializes events into an RFC 5545 document

pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod normalize;
pub mod source;
pub mod value;

pub use config::FeedConfig;
pub use error::{CalendarError, CalendarResult};
pub use event::Event;
pub use ics::{build_icalendar, build_icalendar_at, generate_feed, generate_feed_at};
pub use normalize::normalize;
pub use source::{CalendarSource, RomcalBridge, collect_records};
pub use value::{RawRecord, RawValue};
