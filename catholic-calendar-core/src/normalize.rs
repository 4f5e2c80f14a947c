//! Turn romcal records into feed-ready events.
//!
//! romcal output is loosely structured and several keys may carry the same
//! information. Every field is resolved from a fixed list of candidate keys
//! in priority order; the first candidate that is set (not falsy) and renders
//! to non-empty text wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Number;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::error::{CalendarError, CalendarResult};
use crate::event::Event;
use crate::value::{RawRecord, RawValue};

pub const DEFAULT_SUMMARY: &str = "Unnamed Celebration";
pub const DEFAULT_CATEGORY: &str = "Celebration";

const DATE_KEYS: &[&str] = &["date", "start"];
const SUMMARY_KEYS: &[&str] = &["name", "title", "celebration", "id"];
const CATEGORY_KEYS: &[&str] = &["rankName", "rank", "type", "classification"];
const UID_KEYS: &[&str] = &["uid", "identifier"];
const SLUG_KEYS: &[&str] = &["slug"];
const COMMEMORATION_KEYS: &[&str] = &["commemorations", "secondaryCelebrations"];
const METADATA_KEYS: &[&str] = &["metadata", "meta"];

const NOTE_KEYS: &[&str] = &["note", "notes"];

/// Labeled description lines, in output order. Notes follow these.
const DESCRIPTION_FIELDS: &[(&str, &[&str])] = &[
    ("Rank", &["rankName", "rank"]),
    ("Liturgical color", &["liturgicalColor", "liturgicalColors"]),
    ("Season", &["season", "liturgicalSeason"]),
    ("Type", &["type", "liturgicalType"]),
    ("Holy day of obligation", &["isHolyDayOfObligation"]),
    ("Optional memorial", &["isOptional"]),
    ("Week", &["week", "liturgicalWeek"]),
    ("Cycle", &["cycle", "liturgicalCycle"]),
];

/// Basic-format datetimes (`20250101T120000Z`); extended forms are caught
/// by the date prefix.
const DATETIME_FORMATS: &[&str] = &["%Y%m%dT%H%M%S%.f", "%Y%m%dT%H%M%S", "%Y%m%dT%H%M"];
const ZONED_DATETIME_FORMATS: &[&str] = &["%Y%m%dT%H%M%S%.f%z", "%Y%m%dT%H%M%S%z"];

/// Normalize a single romcal record.
pub fn normalize(record: &RawRecord, config: &FeedConfig) -> CalendarResult<Event> {
    let date_value = DATE_KEYS
        .iter()
        .find_map(|key| record.get(key))
        .ok_or(CalendarError::MissingDate)?;
    let date = parse_date(date_value)?;
    // Whole-day events need a following day for DTEND
    if date.succ_opt().is_none() {
        return Err(CalendarError::UnparseableDate(format!(
            "{date} has no following day"
        )));
    }

    let summary = first_text(record, SUMMARY_KEYS)?.unwrap_or_else(|| DEFAULT_SUMMARY.to_string());
    let categories = resolve_categories(record)?;
    let uid = resolve_uid(record, &summary, date, config)?;
    let description = build_description(record)?;

    let event = Event {
        uid,
        summary,
        description,
        categories,
        date,
    };
    tracing::debug!(uid = %event.uid, date = %event.date, summary = %event.summary, "normalized event");
    Ok(event)
}

/// Lowercase `value` and collapse every run outside `[a-z0-9]` into a hyphen.
pub fn slugify(value: &str) -> String {
    let slug = value
        .to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "event".to_string()
    } else {
        slug
    }
}

/// Deterministic identifier for an event without an explicit UID.
///
/// UUIDv5 of `{YYYY-MM-DD}-{slug}` in the URL namespace, so feeds generated
/// on different machines agree on the identity of an event.
pub fn derive_uid(date: NaiveDate, slug: &str) -> Uuid {
    let seed = format!("{}-{}", date.format("%Y-%m-%d"), slug);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes())
}

/// Interpret a date-like value, truncating any time of day.
pub fn parse_date(value: &RawValue) -> CalendarResult<NaiveDate> {
    match value {
        RawValue::Structured(structured) => Ok(structured.date()),
        RawValue::Number(n) => parse_timestamp(n),
        RawValue::String(s) => parse_date_str(s),
        other => Err(CalendarError::UnparseableDate(format!("{other:?}"))),
    }
}

/// Unix timestamp in seconds, read as UTC.
fn parse_timestamp(n: &Number) -> CalendarResult<NaiveDate> {
    let datetime = match n.as_i64() {
        Some(secs) => DateTime::from_timestamp(secs, 0),
        None => n.as_f64().and_then(|secs| {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
        }),
    };

    datetime
        .map(|dt| dt.date_naive())
        .ok_or_else(|| CalendarError::UnparseableDate(n.to_string()))
}

fn parse_date_str(s: &str) -> CalendarResult<NaiveDate> {
    let prefix: String = s.chars().take(10).collect();
    parse_iso_date(&prefix)
        .or_else(|| parse_iso_datetime(s))
        .ok_or_else(|| CalendarError::UnparseableDate(format!("{s:?}")))
}

/// Strict `YYYY-MM-DD` or `YYYYMMDD`.
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    if !s.is_ascii() {
        return None;
    }

    let bytes = s.as_bytes();
    let (year, month, day) = match bytes.len() {
        10 if bytes[4] == b'-' && bytes[7] == b'-' => (&s[0..4], &s[5..7], &s[8..10]),
        8 => (&s[0..4], &s[4..6], &s[6..8]),
        _ => return None,
    };

    let all_digits = [year, month, day]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()));
    if !all_digits {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDate> {
    if let Some(dt) = ZONED_DATETIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(s, format).ok())
    {
        return Some(dt.date_naive());
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|dt| dt.date())
}

/// Candidates among `keys` that are set, in priority order.
fn candidates<'a>(record: &'a RawRecord, keys: &'a [&str]) -> impl Iterator<Item = &'a RawValue> {
    keys.iter()
        .filter_map(|key| record.get(key))
        .filter(|value| !value.is_falsy())
}

/// Text of the first set candidate that renders to something.
fn first_text(record: &RawRecord, keys: &[&str]) -> CalendarResult<Option<String>> {
    for value in candidates(record, keys) {
        let text = value.to_text()?;
        if !text.is_empty() {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

/// Like [`first_text`], but when no candidate is set the last key is shown
/// as is, so an explicit `false` or `0` still yields a line.
fn description_text(record: &RawRecord, keys: &[&str]) -> CalendarResult<Option<String>> {
    if let Some(text) = first_text(record, keys)? {
        return Ok(Some(text));
    }
    match keys.last().and_then(|key| record.get(key)) {
        Some(value) => {
            let text = value.to_text()?;
            Ok((!text.is_empty()).then_some(text))
        }
        None => Ok(None),
    }
}

/// A string is the only category, a sequence yields one per element and a
/// mapping one per key. Candidates that produce nothing fall through to the
/// next key.
fn resolve_categories(record: &RawRecord) -> CalendarResult<Vec<String>> {
    for value in candidates(record, CATEGORY_KEYS) {
        let texts = match value {
            RawValue::Sequence(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(RawValue::to_text)
                .collect::<CalendarResult<Vec<_>>>()?,
            RawValue::Mapping(entries) => entries.iter().map(|(key, _)| key.to_string()).collect(),
            other => vec![other.to_text()?],
        };

        let categories: Vec<String> = texts.into_iter().filter(|t| !t.is_empty()).collect();
        if !categories.is_empty() {
            return Ok(categories);
        }
    }

    Ok(vec![DEFAULT_CATEGORY.to_string()])
}

fn resolve_uid(
    record: &RawRecord,
    summary: &str,
    date: NaiveDate,
    config: &FeedConfig,
) -> CalendarResult<String> {
    let mut explicit = None;
    for value in candidates(record, UID_KEYS) {
        let text = match value {
            // `True`, as in feeds published before
            RawValue::Bool(true) => "True".to_string(),
            other => other.to_text()?,
        };
        if !text.is_empty() {
            explicit = Some(text);
            break;
        }
    }

    if let Some(uid) = explicit {
        if uid.contains('@') {
            return Ok(uid);
        }
        return Ok(format!("{}@{}", uid, config.domain));
    }

    let slug = first_text(record, SLUG_KEYS)?.unwrap_or_else(|| slugify(summary));
    Ok(format!("{}@{}", derive_uid(date, &slug), config.domain))
}

fn build_description(record: &RawRecord) -> CalendarResult<String> {
    let mut lines = Vec::new();

    if let Some(commemorations) = first_text(record, COMMEMORATION_KEYS)? {
        lines.push(format!("Commemorations: {commemorations}"));
    }

    if let Some(metadata) = first_text(record, METADATA_KEYS)? {
        lines.push(metadata);
    }

    for (label, keys) in DESCRIPTION_FIELDS {
        if let Some(text) = description_text(record, keys)? {
            lines.push(format!("{label}: {text}"));
        }
    }

    if let Some(notes) = first_text(record, NOTE_KEYS)? {
        lines.push(format!("Notes: {notes}"));
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn record(value: Value) -> RawRecord {
        RawRecord::try_from(value).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn normalize_json(value: Value) -> CalendarResult<Event> {
        normalize(&record(value), &FeedConfig::default())
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Mary, Mother of God"), "mary-mother-of-god");
        assert_eq!(slugify("  --Easter  Sunday!-- "), "easter-sunday");
        assert_eq!(slugify("Saint Thérèse"), "saint-th-r-se");
        assert_eq!(slugify("Week 3"), "week-3");
        assert_eq!(slugify(""), "event");
        assert_eq!(slugify("!!!"), "event");
    }

    #[test]
    fn test_derive_uid_matches_known_values() {
        assert_eq!(
            derive_uid(ymd(2025, 1, 1), "mary-mother-of-god").to_string(),
            "f0fb1524-a955-535d-8e4d-bbdf2d92d5b4"
        );
        assert_eq!(
            derive_uid(ymd(2025, 4, 20), "easter-sunday").to_string(),
            "bd9a750a-c234-5992-ad32-3d4a2996315e"
        );
    }

    #[test]
    fn test_parse_date_shapes() {
        let expected = ymd(2025, 1, 2);
        assert_eq!(parse_date(&RawValue::from("2025-01-02")).unwrap(), expected);
        assert_eq!(
            parse_date(&RawValue::from("2025-01-02T23:59:00.000Z")).unwrap(),
            expected
        );
        assert_eq!(parse_date(&RawValue::from("20250102")).unwrap(), expected);
        assert_eq!(
            parse_date(&RawValue::from("20250102T101500Z")).unwrap(),
            expected
        );
        assert_eq!(
            parse_date(&RawValue::from("20250102T101500+0200")).unwrap(),
            expected
        );
        assert_eq!(parse_date(&RawValue::from(1_735_776_000i64)).unwrap(), expected);
        assert_eq!(parse_date(&RawValue::from(1_735_776_000.5f64)).unwrap(), expected);
        assert_eq!(parse_date(&RawValue::from(expected)).unwrap(), expected);
        assert_eq!(
            parse_date(&RawValue::from(Utc.with_ymd_and_hms(2025, 1, 2, 18, 0, 0).unwrap()))
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        for value in [
            RawValue::from("not a date"),
            RawValue::from("2025-13-01"),
            RawValue::from("20é5010"),
            RawValue::from(""),
            RawValue::from(true),
            RawValue::Null,
            RawValue::from(vec!["2025-01-01"]),
        ] {
            let result = parse_date(&value);
            assert!(
                matches!(result, Err(CalendarError::UnparseableDate(_))),
                "{value:?} should be unparseable, got {result:?}"
            );
        }
    }

    #[test]
    fn test_missing_date() {
        let result = normalize_json(json!({"name": "No date"}));
        assert!(matches!(result, Err(CalendarError::MissingDate)));
    }

    #[test]
    fn test_null_date_is_unparseable_not_missing() {
        let result = normalize_json(json!({"date": null, "start": "2025-01-01"}));
        assert!(matches!(result, Err(CalendarError::UnparseableDate(_))));
    }

    #[test]
    fn test_start_is_used_without_date() {
        let event = normalize_json(json!({"start": "2025-03-19", "name": "Joseph"})).unwrap();
        assert_eq!(event.date, ymd(2025, 3, 19));
    }

    #[test]
    fn test_summary_precedence_and_default() {
        let event = normalize_json(json!({
            "date": "2025-01-01", "id": "id", "celebration": "celebration", "title": "title"
        }))
        .unwrap();
        assert_eq!(event.summary, "title");

        let event = normalize_json(json!({"date": "2025-01-01", "name": null, "id": "solemnity_mary"}))
            .unwrap();
        assert_eq!(event.summary, "solemnity_mary");

        let event = normalize_json(json!({"date": "2025-01-01"})).unwrap();
        assert_eq!(event.summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn test_categories_from_string_and_sequence() {
        let event = normalize_json(json!({"date": "2025-01-01", "rankName": "SOLEMNITY", "rank": "x"}))
            .unwrap();
        assert_eq!(event.categories, vec!["SOLEMNITY"]);

        let event = normalize_json(json!({
            "date": "2025-01-01", "type": ["Proper of Time", null, "Triduum"]
        }))
        .unwrap();
        assert_eq!(event.categories, vec!["Proper of Time", "Triduum"]);

        let event = normalize_json(json!({"date": "2025-01-01"})).unwrap();
        assert_eq!(event.categories, vec![DEFAULT_CATEGORY]);
    }

    #[test]
    fn test_empty_category_sequence_falls_through() {
        let event = normalize_json(json!({
            "date": "2025-01-01", "rankName": [], "rank": [null], "type": "Sanctorale"
        }))
        .unwrap();
        assert_eq!(event.categories, vec!["Sanctorale"]);

        let event = normalize_json(json!({"date": "2025-01-01", "rankName": []})).unwrap();
        assert_eq!(event.categories, vec![DEFAULT_CATEGORY]);
    }

    #[test]
    fn test_explicit_uid() {
        let event = normalize_json(json!({"date": "2025-01-01", "uid": "abc"})).unwrap();
        assert_eq!(event.uid, "abc@catholic.calendar");

        let event =
            normalize_json(json!({"date": "2025-01-01", "identifier": "abc@example.com"})).unwrap();
        assert_eq!(event.uid, "abc@example.com");

        let event = normalize_json(json!({"date": "2025-01-01", "uid": 42})).unwrap();
        assert_eq!(event.uid, "42@catholic.calendar");
    }

    #[test]
    fn test_derived_uid_uses_slug_or_summary() {
        let from_summary =
            normalize_json(json!({"date": "2025-01-01", "name": "Mary, Mother of God"})).unwrap();
        assert_eq!(
            from_summary.uid,
            "f0fb1524-a955-535d-8e4d-bbdf2d92d5b4@catholic.calendar"
        );

        let from_slug = normalize_json(json!({
            "date": "2025-01-01", "name": "Something else", "slug": "mary-mother-of-god"
        }))
        .unwrap();
        assert_eq!(from_slug.uid, from_summary.uid);

        let unnamed = normalize(
            &record(json!({"date": "2025-01-01", "uid": ""})),
            &FeedConfig::default().with_domain("example.com"),
        )
        .unwrap();
        assert_eq!(
            unnamed.uid,
            "de93b4b9-ae3f-579e-84aa-69d0a50cc5e4@example.com"
        );
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let value = json!({
            "date": "2025-04-20", "name": "Easter Sunday", "rankName": "SOLEMNITY",
            "commemorations": ["Resurrection of the Lord"]
        });
        assert_eq!(normalize_json(value.clone()).unwrap(), normalize_json(value).unwrap());
    }

    #[test]
    fn test_description_order_and_formatting() {
        let event = normalize_json(json!({
            "date": "2025-01-01",
            "note": "Patronal feast in many countries.",
            "cycle": "Year C",
            "week": 1,
            "isOptional": false,
            "isHolyDayOfObligation": true,
            "type": "Proper of Time",
            "season": "Christmastide",
            "liturgicalColors": ["white", "gold"],
            "rankName": "SOLEMNITY",
            "metadata": {"source": "General Roman Calendar", "skipped": null},
            "secondaryCelebrations": ["Octave Day of Christmas"]
        }))
        .unwrap();

        assert_eq!(
            event.description,
            [
                "Commemorations: Octave Day of Christmas",
                "source: General Roman Calendar",
                "Rank: SOLEMNITY",
                "Liturgical color: white, gold",
                "Season: Christmastide",
                "Type: Proper of Time",
                "Holy day of obligation: Yes",
                "Optional memorial: No",
                "Week: 1",
                "Cycle: Year C",
                "Notes: Patronal feast in many countries.",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_description_skips_absent_and_empty() {
        let event = normalize_json(json!({
            "date": "2025-01-01", "season": "", "liturgicalSeason": null, "notes": [null]
        }))
        .unwrap();
        assert_eq!(event.description, "");
    }

    #[test]
    fn test_false_and_zero_candidates_are_skipped() {
        let event = normalize_json(json!({
            "date": "2025-01-01", "name": false, "title": "T", "rankName": 0, "rank": "FEAST",
            "uid": true
        }))
        .unwrap();
        assert_eq!(event.summary, "T");
        assert_eq!(event.categories, vec!["FEAST"]);
        assert_eq!(event.uid, "True@catholic.calendar");

        let event = normalize_json(json!({"date": "2025-01-01", "name": "Mary", "uid": false}))
            .unwrap();
        assert_eq!(
            event.uid,
            format!("{}@catholic.calendar", derive_uid(ymd(2025, 1, 1), "mary"))
        );
    }

    #[test]
    fn test_description_falls_back_to_last_key() {
        let event = normalize_json(json!({
            "date": "2025-01-01", "week": 0, "liturgicalWeek": 3, "cycle": 0, "note": 0
        }))
        .unwrap();
        assert_eq!(event.description, "Week: 3");

        let event = normalize_json(json!({
            "date": "2025-01-01", "liturgicalWeek": 0, "isHolyDayOfObligation": false
        }))
        .unwrap();
        assert_eq!(event.description, "Holy day of obligation: No\nWeek: 0");
    }

    #[test]
    fn test_mapping_category_yields_one_per_key() {
        let event = normalize_json(json!({
            "date": "2025-01-01", "rankName": {"SOLEMNITY": true, "FEAST": null}
        }))
        .unwrap();
        assert_eq!(event.categories, vec!["SOLEMNITY", "FEAST"]);
    }

    #[test]
    fn test_last_representable_date_is_rejected() {
        let result = normalize(
            &RawRecord::new().with("date", NaiveDate::MAX),
            &FeedConfig::default(),
        );
        assert!(matches!(result, Err(CalendarError::UnparseableDate(_))), "{result:?}");

        let event = normalize(
            &RawRecord::new().with("date", NaiveDate::MAX.pred_opt().unwrap()),
            &FeedConfig::default(),
        )
        .unwrap();
        assert_eq!(event.end_date(), NaiveDate::MAX);
    }
}
