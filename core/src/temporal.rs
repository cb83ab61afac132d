//! Opaque date-time values and their multi-strategy parser.
//!
//! A [`Temporal`] compares by instant: two values built from different
//! inputs (a string, a `{date: ...}` map, a pre-built instance) are equal
//! when they denote the same point in time.

use std::fmt;

use chrono::{
    DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};

use crate::error::{DtoError, Result};
use crate::options::{TemporalOptions, parse_offset};
use crate::value::Value;

/// Date-time layouts without an offset, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-time layouts carrying a numeric offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// A parsed instant with the offset it was expressed in.
///
/// # Examples
///
/// ```
/// use schema_dto_core::Temporal;
///
/// let a = Temporal::parse("2018-08-17 13:50:45.150374").unwrap();
/// let b = Temporal::parse("2018-08-17T15:50:45.150374+02:00").unwrap();
/// assert_eq!(a, b);
/// assert!(Temporal::parse("2018-0:45.150374").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temporal(DateTime<FixedOffset>);

impl Temporal {
    /// The current instant in UTC.
    pub fn now() -> Self {
        Temporal(Utc::now().fixed_offset())
    }

    /// Parses `input` with default [`TemporalOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`DtoError::InvalidTemporalValue`] when no strategy accepts the input.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, &TemporalOptions::default())
    }

    /// Parses `input`, applying the configured default offset and extra formats.
    pub fn parse_with(input: &str, options: &TemporalOptions) -> Result<Self> {
        parse_in(input, options.offset(), &options.extra_formats).ok_or_else(|| {
            DtoError::InvalidTemporalValue(format!("'{input}' is not a recognised date-time"))
        })
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }

    /// Canonical external representation, microsecond precision.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<FixedOffset>> for Temporal {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Temporal(dt)
    }
}

impl From<DateTime<Utc>> for Temporal {
    fn from(dt: DateTime<Utc>) -> Self {
        Temporal(dt.fixed_offset())
    }
}

/// Converts a raw value into an instant when one of the strategies applies.
///
/// Pre-built temporals pass through unchanged, strings are parsed, and maps
/// with a `date` key recurse into it. A sibling `timezone` holding `UTC`,
/// `Z` or a numeric offset localizes a naive `date`; named zones such as
/// `Europe/Amsterdam` fall back to the default offset.
pub(crate) fn from_value(value: &Value, options: &TemporalOptions) -> Option<Temporal> {
    match value {
        Value::Temporal(t) => Some(*t),
        Value::String(s) => parse_in(s, options.offset(), &options.extra_formats),
        Value::Map(map) => {
            let date = map.get("date")?;
            let offset = map
                .get("timezone")
                .and_then(Value::as_str)
                .and_then(parse_offset);
            match (date, offset) {
                (Value::String(s), Some(offset)) => parse_in(s, offset, &options.extra_formats),
                (other, _) => from_value(other, options),
            }
        }
        _ => None,
    }
}

fn parse_in(input: &str, offset: FixedOffset, extra_formats: &[String]) -> Option<Temporal> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(t) = parse_keyword(input, offset) {
        return Some(t);
    }

    if let Some(seconds) = input.strip_prefix('@') {
        let seconds = seconds.parse::<i64>().ok()?;
        return DateTime::from_timestamp(seconds, 0).map(Temporal::from);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(Temporal(dt));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(Temporal(dt));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return localize(naive, offset);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return localize(date.and_hms_opt(0, 0, 0)?, offset);
    }

    for format in extra_formats {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(Temporal(dt));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return localize(naive, offset);
        }
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return localize(date.and_hms_opt(0, 0, 0)?, offset);
        }
    }

    None
}

fn parse_keyword(input: &str, offset: FixedOffset) -> Option<Temporal> {
    let keyword = input.to_ascii_lowercase();
    if keyword == "now" {
        return Some(Temporal(Utc::now().with_timezone(&offset)));
    }

    let today = Utc::now().with_timezone(&offset).date_naive();
    let date = match keyword.as_str() {
        "today" => today,
        "yesterday" => today.checked_sub_days(Days::new(1))?,
        "tomorrow" => today.checked_add_days(Days::new(1))?,
        _ => return None,
    };
    localize(date.and_hms_opt(0, 0, 0)?, offset)
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> Option<Temporal> {
    offset.from_local_datetime(&naive).single().map(Temporal)
}
