//! Feed serialization.

use chrono::{DateTime, Utc};

use super::{escape_text, fold_line};
use crate::config::FeedConfig;
use crate::error::CalendarResult;
use crate::event::Event;
use crate::normalize::normalize;
use crate::value::RawRecord;

const DTSTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_FORMAT: &str = "%Y%m%d";

/// Normalize romcal records and serialize them as a feed.
///
/// Fails on the first record that cannot be normalized; nothing is
/// generated in that case.
pub fn build_icalendar(records: &[RawRecord], config: &FeedConfig) -> CalendarResult<String> {
    build_icalendar_at(records, config, Utc::now())
}

/// [`build_icalendar`] with a fixed generation timestamp.
pub fn build_icalendar_at(
    records: &[RawRecord],
    config: &FeedConfig,
    generated: DateTime<Utc>,
) -> CalendarResult<String> {
    let events = records
        .iter()
        .map(|record| normalize(record, config))
        .collect::<CalendarResult<Vec<_>>>()?;
    Ok(generate_feed_at(&events, config, generated))
}

/// Serialize events as an ICS document, stamped with the current time.
pub fn generate_feed(events: &[Event], config: &FeedConfig) -> String {
    generate_feed_at(events, config, Utc::now())
}

/// Serialize events as an ICS document.
///
/// Events are ordered by date, then by summary. `generated` becomes the
/// DTSTAMP of every entry, so the output is fully determined by the inputs.
pub fn generate_feed_at(events: &[Event], config: &FeedConfig, generated: DateTime<Utc>) -> String {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| (a.date, &a.summary).cmp(&(b.date, &b.summary)));

    let dtstamp = generated.format(DTSTAMP_FORMAT).to_string();
    let mut feed = FeedWriter::default();

    feed.property("BEGIN", "VCALENDAR");
    feed.property("PRODID", &config.prodid);
    feed.property("VERSION", "2.0");
    feed.property("CALSCALE", "GREGORIAN");
    feed.property("X-WR-CALNAME", &escape_text(&config.name));
    feed.property("X-WR-TIMEZONE", &escape_text(&config.timezone));
    feed.optional_property("METHOD", config.method.as_deref());
    feed.optional_property(
        "REFRESH-INTERVAL;VALUE=DURATION",
        config.refresh_interval.as_deref(),
    );
    feed.optional_property("X-PUBLISHED-TTL", config.published_ttl.as_deref());

    for event in &sorted {
        feed.property("BEGIN", "VEVENT");
        // UIDs are identifier-safe already
        feed.property("UID", &event.uid);
        feed.property("DTSTAMP", &dtstamp);
        feed.property("DTSTART;VALUE=DATE", &event.date.format(DATE_FORMAT).to_string());
        feed.property(
            "DTEND;VALUE=DATE",
            &event.end_date().format(DATE_FORMAT).to_string(),
        );
        feed.property("SUMMARY", &escape_text(&event.summary));
        if !event.description.is_empty() {
            feed.property("DESCRIPTION", &escape_text(&event.description));
        }
        for category in &event.categories {
            feed.property("CATEGORIES", &escape_text(category));
        }
        feed.property("END", "VEVENT");
    }

    feed.property("END", "VCALENDAR");

    tracing::debug!(events = sorted.len(), dtstamp = %dtstamp, "generated feed");
    feed.output
}

/// Accumulates folded, CRLF-terminated content lines.
#[derive(Default)]
struct FeedWriter {
    output: String,
}

impl FeedWriter {
    fn property(&mut self, name: &str, value: &str) {
        for line in fold_line(&format!("{name}:{value}")) {
            self.output.push_str(&line);
            self.output.push_str("\r\n");
        }
    }

    /// Emitted only for a non-empty value.
    fn optional_property(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.property(name, value);
        }
    }
}
