//! One validator per schema type.
//!
//! Each validator checks the [`Kind`] reported by the detector and either
//! returns the coerced value or fails without side effects. Object and array
//! validators recurse through the [`ValidationContext`] so nested `$ref`s and
//! unions are handled uniformly.

use std::collections::BTreeMap;

use crate::detect::{Kind, sequence_items};
use crate::engine::ValidationContext;
use crate::error::{DtoError, Result};
use crate::types::{SchemaNode, SchemaType};
use crate::value::Value;

/// Validates and coerces a raw value against a resolved node of one type.
pub trait TypeValidator {
    fn schema_type(&self) -> SchemaType;

    fn validate(&self, raw: &Value, node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value>;
}

/// Returns the validator for `ty`.
pub fn validator_for(ty: SchemaType) -> &'static dyn TypeValidator {
    match ty {
        SchemaType::String => &StringValidator,
        SchemaType::Integer => &IntegerValidator,
        SchemaType::Number => &NumberValidator,
        SchemaType::Boolean => &BooleanValidator,
        SchemaType::Null => &NullValidator,
        SchemaType::Timestamp => &TimestampValidator,
        SchemaType::Object => &ObjectValidator,
        SchemaType::Array => &ArrayValidator,
    }
}

fn wrong_kind(expected: SchemaType, found: Kind) -> DtoError {
    DtoError::InvalidDataType(format!("expected {expected}, got {found}"))
}

/// Strings only; `null` is admitted when nullable strings are enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringValidator;

impl TypeValidator for StringValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::String
    }

    fn validate(&self, raw: &Value, _node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        match cx.detector().classify(raw) {
            Kind::String => Ok(raw.clone()),
            Kind::Null if cx.options().nullable_strings => Ok(Value::Null),
            kind => Err(wrong_kind(SchemaType::String, kind)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerValidator;

impl TypeValidator for IntegerValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Integer
    }

    fn validate(&self, raw: &Value, _node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        match (cx.detector().classify(raw), raw) {
            (Kind::Integer, _) => Ok(raw.clone()),
            (Kind::Number, Value::Number(n)) => integral(*n)
                .map(Value::Integer)
                .ok_or_else(|| DtoError::InvalidNumberValue(format!("{n} is not an integer"))),
            (Kind::String, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| DtoError::InvalidNumberValue(format!("'{s}' is not an integer"))),
            (kind, _) => Err(wrong_kind(SchemaType::Integer, kind)),
        }
    }
}

/// Floats with no fractional part that fit in `i64`.
fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// Integers stay integers; numeric strings are parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberValidator;

impl TypeValidator for NumberValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Number
    }

    fn validate(&self, raw: &Value, _node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        match (cx.detector().classify(raw), raw) {
            (Kind::Integer, _) => Ok(raw.clone()),
            (Kind::Number, Value::Number(n)) if n.is_finite() => Ok(raw.clone()),
            (Kind::Number, Value::Number(n)) => {
                Err(DtoError::InvalidNumberValue(format!("{n} is not a finite number")))
            }
            (Kind::String, Value::String(s)) => parse_number(s)
                .ok_or_else(|| DtoError::InvalidNumberValue(format!("'{s}' is not a number"))),
            (kind, _) => Err(wrong_kind(SchemaType::Number, kind)),
        }
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::Number)
}

/// Booleans only; no truthy coercion.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanValidator;

impl TypeValidator for BooleanValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Boolean
    }

    fn validate(&self, raw: &Value, _node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        match cx.detector().classify(raw) {
            Kind::Boolean => Ok(raw.clone()),
            kind => Err(wrong_kind(SchemaType::Boolean, kind)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullValidator;

impl TypeValidator for NullValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Null
    }

    fn validate(&self, raw: &Value, _node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        match cx.detector().classify(raw) {
            Kind::Null => Ok(Value::Null),
            kind => Err(wrong_kind(SchemaType::Null, kind)),
        }
    }
}

/// Pre-built instants pass through; strings and `{date: ...}` maps are parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampValidator;

impl TypeValidator for TimestampValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Timestamp
    }

    fn validate(&self, raw: &Value, _node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        cx.detector()
            .temporal(raw)
            .map(Value::Temporal)
            .ok_or_else(|| {
                DtoError::InvalidTemporalValue(
                    "timestamp could not be resolved to a temporal object".to_string(),
                )
            })
    }
}

/// Declared properties are validated and unknown keys dropped; without
/// `properties` every key passes through untyped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectValidator;

impl TypeValidator for ObjectValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Object
    }

    fn validate(&self, raw: &Value, node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        if !cx.detector().is_object(raw) {
            return Err(wrong_kind(SchemaType::Object, cx.detector().classify(raw)));
        }
        let empty = BTreeMap::new();
        let entries = match raw {
            Value::Map(map) => map,
            _ => &empty,
        };

        let Some(properties) = &node.properties else {
            return Ok(Value::Map(entries.clone()));
        };

        let mut typed = BTreeMap::new();
        for (name, child) in properties {
            if let Some(value) = entries.get(name) {
                let value = cx.validate(value, child).map_err(|err| err.at(name))?;
                typed.insert(name.clone(), value);
            }
        }
        Ok(Value::Map(typed))
    }
}

/// Every element is validated against the shared `items` node.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayValidator;

impl TypeValidator for ArrayValidator {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Array
    }

    fn validate(&self, raw: &Value, node: &SchemaNode, cx: &ValidationContext<'_>) -> Result<Value> {
        let Some(elements) = sequence_items(raw) else {
            return Err(wrong_kind(SchemaType::Array, cx.detector().classify(raw)));
        };

        let Some(items) = &node.items else {
            return Ok(Value::Sequence(elements.into_iter().cloned().collect()));
        };

        elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                cx.validate(element, items)
                    .map_err(|err| err.at(&index.to_string()))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::Engine;
    use crate::options::EngineOptions;
    use crate::temporal::Temporal;
    use crate::types::SchemaDocument;

    fn check(node: SchemaNode, raw: Value) -> Result<Value> {
        let engine = Engine::default();
        let doc = SchemaDocument::new(node);
        engine.validate(&raw, doc.root(), &doc)
    }

    fn of(ty: SchemaType) -> SchemaNode {
        SchemaNode::of(ty)
    }

    #[test]
    fn test_string_rejects_numbers() {
        assert_eq!(check(of(SchemaType::String), Value::from("a")).unwrap(), Value::from("a"));
        assert!(matches!(
            check(of(SchemaType::String), Value::Integer(1)),
            Err(DtoError::InvalidDataType(_))
        ));
    }

    #[test]
    fn test_string_null_policy() {
        assert_eq!(check(of(SchemaType::String), Value::Null).unwrap(), Value::Null);

        let engine = Engine::new(EngineOptions {
            nullable_strings: false,
            ..EngineOptions::default()
        });
        let doc = SchemaDocument::new(of(SchemaType::String));
        assert!(engine.validate(&Value::Null, doc.root(), &doc).is_err());
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(check(of(SchemaType::Integer), Value::from("42")).unwrap(), Value::Integer(42));
        assert_eq!(check(of(SchemaType::Integer), Value::Number(7.0)).unwrap(), Value::Integer(7));
        assert!(matches!(
            check(of(SchemaType::Integer), Value::from("4.2")),
            Err(DtoError::InvalidNumberValue(_))
        ));
        assert!(matches!(
            check(of(SchemaType::Integer), Value::Number(4.2)),
            Err(DtoError::InvalidNumberValue(_))
        ));
        assert!(matches!(
            check(of(SchemaType::Integer), Value::Number(9_223_372_036_854_775_808.0)),
            Err(DtoError::InvalidNumberValue(_))
        ));
        assert_eq!(
            check(of(SchemaType::Integer), Value::Number(-9_223_372_036_854_775_808.0)).unwrap(),
            Value::Integer(i64::MIN)
        );
        assert!(matches!(
            check(of(SchemaType::Integer), Value::Bool(true)),
            Err(DtoError::InvalidDataType(_))
        ));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(check(of(SchemaType::Number), Value::Integer(3)).unwrap(), Value::Integer(3));
        assert_eq!(check(of(SchemaType::Number), Value::from("2.5")).unwrap(), Value::Number(2.5));
        let err = check(of(SchemaType::Number), Value::from("abc")).unwrap_err();
        assert!(matches!(err, DtoError::InvalidNumberValue(_)));
        assert!(err.is_scalar_violation());
        assert!(check(of(SchemaType::Number), Value::from("NaN")).is_err());
    }

    #[test]
    fn test_boolean_and_null_are_strict() {
        assert!(check(of(SchemaType::Boolean), Value::Integer(1)).is_err());
        assert!(check(of(SchemaType::Boolean), Value::from("true")).is_err());
        assert_eq!(check(of(SchemaType::Null), Value::Null).unwrap(), Value::Null);
        assert!(matches!(
            check(of(SchemaType::Null), Value::from("")),
            Err(DtoError::InvalidDataType(_))
        ));
    }

    #[test]
    fn test_timestamp_inputs() {
        let expected = Temporal::parse("2018-08-17 13:50:45.150374").unwrap();
        let node = || of(SchemaType::Timestamp);

        assert_eq!(
            check(node(), Value::Temporal(expected)).unwrap(),
            Value::Temporal(expected)
        );
        assert_eq!(
            check(node(), Value::from("2018-08-17 13:50:45.150374")).unwrap(),
            Value::Temporal(expected)
        );
        assert_eq!(
            check(node(), Value::from(json!({ "date": "2018-08-17 13:50:45.150374", "timezone_type": 3 }))).unwrap(),
            Value::Temporal(expected)
        );
        assert_eq!(
            check(node(), Value::Integer(254)).unwrap_err(),
            DtoError::InvalidTemporalValue(
                "timestamp could not be resolved to a temporal object".into()
            )
        );
    }

    #[test]
    fn test_object_drops_undeclared_keys() {
        let node = of(SchemaType::Object)
            .with_property("a", of(SchemaType::String))
            .with_property("i", of(SchemaType::Integer));
        let out = check(node, Value::from(json!({ "a": "apple", "i": "42", "zzz": true }))).unwrap();
        assert_eq!(out, Value::from(json!({ "a": "apple", "i": 42 })));
    }

    #[test]
    fn test_object_without_properties_passes_through() {
        let raw = Value::from(json!({ "x": "xray", "n": [1, 2] }));
        assert_eq!(check(of(SchemaType::Object), raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_object_rejects_sequences() {
        let err = check(of(SchemaType::Object), Value::from(json!(["a"]))).unwrap_err();
        assert_eq!(err, DtoError::InvalidDataType("expected object, got sequence".into()));
    }

    #[test]
    fn test_array_items_and_error_path() {
        let node = of(SchemaType::Array).with_items(of(SchemaType::Integer));
        assert_eq!(
            check(node.clone(), Value::from(json!(["1", 2]))).unwrap(),
            Value::from(json!([1, 2]))
        );
        let err = check(node, Value::from(json!([1, "x"]))).unwrap_err();
        assert_eq!(err, DtoError::InvalidNumberValue("/1: 'x' is not an integer".into()));
    }

    #[test]
    fn test_array_accepts_index_keyed_maps() {
        let node = of(SchemaType::Array).with_items(of(SchemaType::String));
        assert_eq!(
            check(node, Value::from(json!({ "1": "b", "0": "a" }))).unwrap(),
            Value::from(json!(["a", "b"]))
        );
    }

    #[test]
    fn test_nested_error_path() {
        let node = of(SchemaType::Object).with_property(
            "mother",
            of(SchemaType::Object).with_property("age", of(SchemaType::Integer)),
        );
        let err = check(node, Value::from(json!({ "mother": { "age": "old" } }))).unwrap_err();
        assert_eq!(
            err,
            DtoError::InvalidNumberValue("/mother/age: 'old' is not an integer".into())
        );
    }

    #[test]
    fn test_validator_for_is_exhaustive() {
        for ty in [
            SchemaType::String,
            SchemaType::Integer,
            SchemaType::Number,
            SchemaType::Boolean,
            SchemaType::Null,
            SchemaType::Object,
            SchemaType::Array,
            SchemaType::Timestamp,
        ] {
            assert_eq!(validator_for(ty).schema_type(), ty);
        }
    }
}
