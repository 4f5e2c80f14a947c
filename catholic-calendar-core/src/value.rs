//! Loosely-typed event records as produced by romcal.
//!
//! Records arrive as JSON objects with no guaranteed keys. They are kept
//! in document order so that nested mappings stringify deterministically.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{CalendarError, CalendarResult};

/// A single value inside a raw event record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<RawValue>),
    Mapping(RawRecord),
    /// Already-structured date values handed over by in-process callers
    Structured(Structured),
}

/// Date-like values that do not come from JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Structured {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl Structured {
    /// The calendar date, dropping any time of day.
    pub fn date(&self) -> NaiveDate {
        match self {
            Structured::Date(d) => *d,
            Structured::DateTime(dt) => dt.date(),
            Structured::Zoned(dt) => dt.date_naive(),
        }
    }
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Null, `false`, zero, or an empty string, sequence or mapping.
    ///
    /// romcal's optional keys may carry any of these to mean "not set".
    pub fn is_falsy(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Bool(b) => !b,
            RawValue::Number(n) => n.as_f64() == Some(0.0),
            RawValue::String(s) => s.is_empty(),
            RawValue::Sequence(items) => items.is_empty(),
            RawValue::Mapping(record) => record.is_empty(),
            RawValue::Structured(_) => false,
        }
    }

    /// Render the value as human readable text.
    ///
    /// Booleans become `Yes`/`No`, sequences are comma separated and
    /// mappings become `key: value` pairs separated by semicolons. Null
    /// elements are skipped at every level.
    pub fn to_text(&self) -> CalendarResult<String> {
        match self {
            RawValue::Null => Ok(String::new()),
            RawValue::Bool(b) => Ok(if *b { "Yes" } else { "No" }.to_string()),
            RawValue::Number(n) => Ok(n.to_string()),
            RawValue::String(s) => Ok(s.clone()),
            RawValue::Sequence(items) => {
                let parts = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(RawValue::to_text)
                    .collect::<CalendarResult<Vec<_>>>()?;
                Ok(parts.join(", "))
            }
            RawValue::Mapping(record) => {
                let parts = record
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, value)| Ok(format!("{}: {}", key, value.to_text()?)))
                    .collect::<CalendarResult<Vec<_>>>()?;
                Ok(parts.join("; "))
            }
            RawValue::Structured(value) => serde_json::to_string(value)
                .map_err(|e| CalendarError::UnsupportedValue(format!("{value:?}: {e}"))),
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => RawValue::Number(n),
            Value::String(s) => RawValue::String(s),
            Value::Array(items) => RawValue::Sequence(items.into_iter().map(RawValue::from).collect()),
            Value::Object(map) => RawValue::Mapping(RawRecord::from(map)),
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value.into())
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(value.into())
    }
}

/// Non-finite floats have no JSON representation and become `Null`.
impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(RawValue::Null, RawValue::Number)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        RawValue::Structured(Structured::Date(value))
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(value: NaiveDateTime) -> Self {
        RawValue::Structured(Structured::DateTime(value))
    }
}

impl From<DateTime<FixedOffset>> for RawValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        RawValue::Structured(Structured::Zoned(value))
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(value: DateTime<Utc>) -> Self {
        RawValue::Structured(Structured::Zoned(value.fixed_offset()))
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

impl From<RawRecord> for RawValue {
    fn from(record: RawRecord) -> Self {
        RawValue::Mapping(record)
    }
}

/// An ordered mapping from keys to raw values (one romcal event).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct RawRecord(Vec<(String, RawValue)>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder-style [`RawRecord::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        RawRecord(map.into_iter().map(|(k, v)| (k, RawValue::from(v))).collect())
    }
}

impl TryFrom<Value> for RawRecord {
    type Error = CalendarError;

    fn try_from(value: Value) -> CalendarResult<Self> {
        match value {
            Value::Object(map) => Ok(RawRecord::from(map)),
            other => Err(CalendarError::UnsupportedValue(format!(
                "event record must be a mapping, got {other}"
            ))),
        }
    }
}
