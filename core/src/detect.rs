//! Runtime classification of raw values.

use std::collections::BTreeMap;
use std::fmt;

use crate::options::TemporalOptions;
use crate::temporal::{self, Temporal};
use crate::value::Value;

/// The fundamental kind of a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Object,
    Sequence,
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Temporal,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Object => "object",
            Kind::Sequence => "sequence",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
            Kind::Temporal => "timestamp",
        };
        f.write_str(name)
    }
}

/// Classifies raw values without mutating them.
///
/// Strings are never reported as [`Kind::Temporal`]; only an explicit
/// temporal probe ([`is_temporal`](Self::is_temporal)) parses them.
///
/// # Examples
///
/// ```
/// use schema_dto_core::{Kind, TypeDetector, Value};
/// use serde_json::json;
///
/// let detector = TypeDetector::default();
/// assert_eq!(detector.classify(&Value::from(json!({"0": "a", "1": "b"}))), Kind::Sequence);
/// assert_eq!(detector.classify(&Value::from(json!({"1": "a"}))), Kind::Object);
/// assert_eq!(detector.classify(&Value::from("2018-08-17")), Kind::String);
/// assert!(detector.is_temporal(&Value::from("2018-08-17")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeDetector {
    temporal: TemporalOptions,
}

impl TypeDetector {
    pub fn new(temporal: TemporalOptions) -> Self {
        Self { temporal }
    }

    /// Reports the structural kind of `value`.
    ///
    /// Empty maps classify as objects and empty sequences as sequences;
    /// schema-aware callers should use [`is_object`](Self::is_object) and
    /// [`is_sequence`](Self::is_sequence), which accept either.
    pub fn classify(&self, value: &Value) -> Kind {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Integer(_) => Kind::Integer,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Temporal(_) => Kind::Temporal,
            Value::Sequence(_) => Kind::Sequence,
            Value::Map(map) if !map.is_empty() && has_sequential_keys(map) => Kind::Sequence,
            Value::Map(_) => Kind::Object,
        }
    }

    /// Map-like and not sequence-shaped, or an empty container.
    pub fn is_object(&self, value: &Value) -> bool {
        match value {
            Value::Map(map) => map.is_empty() || !has_sequential_keys(map),
            Value::Sequence(items) => items.is_empty(),
            _ => false,
        }
    }

    /// A sequence, a map keyed exactly `0..n-1`, or an empty container.
    pub fn is_sequence(&self, value: &Value) -> bool {
        match value {
            Value::Sequence(_) => true,
            Value::Map(map) => map.is_empty() || has_sequential_keys(map),
            _ => false,
        }
    }

    pub fn is_string(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }

    pub fn is_integer(&self, value: &Value) -> bool {
        matches!(value, Value::Integer(_))
    }

    /// Integers are numbers too.
    pub fn is_number(&self, value: &Value) -> bool {
        matches!(value, Value::Integer(_) | Value::Number(_))
    }

    pub fn is_boolean(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    pub fn is_null(&self, value: &Value) -> bool {
        matches!(value, Value::Null)
    }

    /// Probes whether `value` is, or can be parsed into, a temporal instant.
    pub fn is_temporal(&self, value: &Value) -> bool {
        self.temporal(value).is_some()
    }

    /// The instant `value` denotes, if any.
    pub fn temporal(&self, value: &Value) -> Option<Temporal> {
        temporal::from_value(value, &self.temporal)
    }
}

/// Elements of a sequence-shaped value in index order.
pub(crate) fn sequence_items(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Sequence(items) => Some(items.iter().collect()),
        Value::Map(map) if map.is_empty() || has_sequential_keys(map) => {
            let mut indexed: Vec<(usize, &Value)> = map
                .iter()
                .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                .collect();
            indexed.sort_by_key(|(i, _)| *i);
            Some(indexed.into_iter().map(|(_, v)| v).collect())
        }
        _ => None,
    }
}

/// `true` when the keys are exactly the canonical decimals `0..n-1`.
fn has_sequential_keys(map: &BTreeMap<String, Value>) -> bool {
    let len = map.len();
    map.keys().all(|key| match key.parse::<usize>() {
        Ok(index) => index < len && index.to_string() == *key,
        Err(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn detector() -> TypeDetector {
        TypeDetector::default()
    }

    #[test]
    fn test_classify_scalars() {
        let d = detector();
        assert_eq!(d.classify(&Value::Null), Kind::Null);
        assert_eq!(d.classify(&Value::Bool(false)), Kind::Boolean);
        assert_eq!(d.classify(&Value::Integer(3)), Kind::Integer);
        assert_eq!(d.classify(&Value::Number(3.5)), Kind::Number);
        assert_eq!(d.classify(&Value::from("x")), Kind::String);
        assert_eq!(d.classify(&Value::Temporal(Temporal::now())), Kind::Temporal);
    }

    #[test]
    fn test_integer_is_a_number() {
        let d = detector();
        assert!(d.is_number(&Value::Integer(1)));
        assert!(!d.is_integer(&Value::Number(1.0)));
    }

    #[test]
    fn test_map_shapes() {
        let d = detector();
        let seq_like = Value::from(json!({ "1": "b", "0": "a" }));
        let gap = Value::from(json!({ "0": "a", "2": "c" }));
        let padded = Value::from(json!({ "00": "a" }));
        let named = Value::from(json!({ "name": "Bob" }));

        assert_eq!(d.classify(&seq_like), Kind::Sequence);
        assert_eq!(d.classify(&gap), Kind::Object);
        assert_eq!(d.classify(&padded), Kind::Object);
        assert_eq!(d.classify(&named), Kind::Object);
        assert!(d.is_sequence(&seq_like) && !d.is_object(&seq_like));
    }

    #[test]
    fn test_empty_containers_are_ambiguous() {
        let d = detector();
        for empty in [Value::Map(BTreeMap::new()), Value::Sequence(Vec::new())] {
            assert!(d.is_object(&empty));
            assert!(d.is_sequence(&empty));
        }
    }

    #[test]
    fn test_sequence_items_orders_by_index() {
        let map = Value::from(json!({ "1": "b", "0": "a", "2": "c" }));
        let items = sequence_items(&map).unwrap();
        assert_eq!(
            items,
            vec![&Value::from("a"), &Value::from("b"), &Value::from("c")]
        );
    }

    #[test]
    fn test_temporal_probe() {
        let d = detector();
        assert!(d.is_temporal(&Value::Temporal(Temporal::now())));
        assert!(d.is_temporal(&Value::from("2018-08-17 13:50:45.150374")));
        assert!(d.is_temporal(&Value::from(json!({ "date": "2018-08-17 13:50:45.150374" }))));
        assert!(!d.is_temporal(&Value::from("hello")));
        assert!(!d.is_temporal(&Value::Integer(254)));
    }
}
