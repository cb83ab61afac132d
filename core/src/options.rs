//! Engine configuration.
//!
//! [`EngineOptions`] is plain serde data so it can be embedded in YAML or
//! JSON configuration files by callers.
//!
//! ```
//! use schema_dto_core::EngineOptions;
//!
//! let options: EngineOptions = serde_json::from_str(r#"{ "max_reference_hops": 8 }"#).unwrap();
//! assert_eq!(options.max_reference_hops, 8);
//! assert!(options.nullable_strings);
//! ```

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Default upper bound on `$ref` hops followed for a single resolution.
pub const DEFAULT_MAX_REFERENCE_HOPS: usize = 64;

/// Settings shared by every validator of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Maximum number of `$ref` hops followed before resolution gives up.
    pub max_reference_hops: usize,
    /// String-typed properties accept `null`; their scalar projection is `""`.
    pub nullable_strings: bool,
    /// Temporal parsing settings.
    pub temporal: TemporalOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_reference_hops: DEFAULT_MAX_REFERENCE_HOPS,
            nullable_strings: true,
            temporal: TemporalOptions::default(),
        }
    }
}

/// How strings without an explicit offset become instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalOptions {
    /// Offset applied to naive date-times, e.g. `"+00:00"` or `"-05:00"`.
    pub default_offset: String,
    /// Additional `chrono` format strings tried after the built-in ones.
    pub extra_formats: Vec<String>,
}

impl Default for TemporalOptions {
    fn default() -> Self {
        Self {
            default_offset: "+00:00".to_string(),
            extra_formats: Vec::new(),
        }
    }
}

impl TemporalOptions {
    /// Parsed form of [`default_offset`](Self::default_offset).
    ///
    /// Falls back to UTC when the configured string is not a valid offset.
    pub fn offset(&self) -> FixedOffset {
        match parse_offset(&self.default_offset) {
            Some(offset) => offset,
            None => {
                tracing::warn!(
                    offset = %self.default_offset,
                    "Invalid default temporal offset, using UTC"
                );
                utc()
            }
        }
    }
}

pub(crate) fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parses `Z`, `UTC`, `GMT`, `+HH:MM`, `+HHMM` or `+HH`.
pub(crate) fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("gmt") {
        return Some(utc());
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.max_reference_hops, DEFAULT_MAX_REFERENCE_HOPS);
        assert!(options.nullable_strings);
        assert_eq!(options.temporal.offset(), utc());
    }

    #[test]
    fn test_parse_offset_forms() {
        assert_eq!(parse_offset("Z"), Some(utc()));
        assert_eq!(parse_offset("UTC"), Some(utc()));
        assert_eq!(parse_offset("+02:00"), FixedOffset::east_opt(7200));
        assert_eq!(parse_offset("-0530"), FixedOffset::east_opt(-(5 * 3600 + 30 * 60)));
        assert_eq!(parse_offset("+01"), FixedOffset::east_opt(3600));
        assert_eq!(parse_offset("Europe/Paris"), None);
        assert_eq!(parse_offset("+25:00"), None);
    }

    #[test]
    fn test_invalid_configured_offset_falls_back_to_utc() {
        let options = TemporalOptions {
            default_offset: "nowhere".into(),
            extra_formats: Vec::new(),
        };
        assert_eq!(options.offset(), utc());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let options: EngineOptions =
            serde_json::from_str(r#"{ "temporal": { "default_offset": "+01:00" } }"#).unwrap();
        assert_eq!(options.max_reference_hops, DEFAULT_MAX_REFERENCE_HOPS);
        assert_eq!(options.temporal.offset(), FixedOffset::east_opt(3600).unwrap());
        assert!(options.temporal.extra_formats.is_empty());
    }
}
