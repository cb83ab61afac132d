use std::sync::Arc;

use schema_dto_core::{
    Dto, DtoError, Engine, EngineOptions, SchemaDocument, SchemaNode, Temporal, TemporalOptions,
    Value,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn schema(value: serde_json::Value) -> SchemaDocument {
    SchemaDocument::from_json(value).unwrap()
}

fn time_schema(types: serde_json::Value) -> SchemaDocument {
    schema(json!({
        "type": "object",
        "properties": { "time": { "type": types } }
    }))
}

fn person_schema() -> SchemaDocument {
    schema(json!({
        "id": "person",
        "$ref": "#/definitions/person",
        "definitions": {
            "person": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "mother": { "$ref": "#/definitions/person" },
                    "father": { "$ref": "#/definitions/person" }
                }
            }
        }
    }))
}

const SAMPLE_TIME: &str = "2018-08-17 13:50:45.150374";

fn sample_time() -> Temporal {
    Temporal::parse(SAMPLE_TIME).unwrap()
}

// ---------------------------------------------------------------------------
// Recursive schemas
// ---------------------------------------------------------------------------

#[test]
fn test_person_with_a_name() {
    let mut person = Dto::with_schema(person_schema()).unwrap();
    person.set("name", "Bob").unwrap();
    assert_eq!(*person.get("name").unwrap(), "Bob");
}

#[test]
fn test_person_created_with_relations() {
    let person = Dto::from_data(
        json!({ "name": "Bob", "mother": { "name": "Mary" }, "father": { "name": "Frank" } }),
        Some(person_schema()),
    )
    .unwrap();

    assert_eq!(*person.get("name").unwrap(), "Bob");
    assert_eq!(*person.get("mother").unwrap().get("name").unwrap(), "Mary");
    assert_eq!(*person.get("father").unwrap().get("name").unwrap(), "Frank");
}

#[test]
fn test_person_depth_follows_the_data() {
    let mut data = json!({ "name": "gen-0" });
    for generation in 1..40 {
        data = json!({ "name": format!("gen-{generation}"), "mother": data });
    }
    let person = Dto::from_data(data, Some(person_schema())).unwrap();

    let mut current = &person;
    let mut depth = 0;
    while let Some(mother) = current.get("mother") {
        current = mother;
        depth += 1;
    }
    assert_eq!(depth, 39);
    assert_eq!(*current.get("name").unwrap(), "gen-0");
}

#[test]
fn test_shared_engine_and_document() {
    let engine = Arc::new(Engine::default());
    let document = Arc::new(person_schema());

    let mut bob = Dto::with_engine(Arc::clone(&engine), Arc::clone(&document)).unwrap();
    let mut lily = Dto::with_engine(engine, document).unwrap();
    lily.set("name", "Lily").unwrap();
    bob.set("name", "Bob").unwrap();
    bob.set("mother", &lily).unwrap();

    assert_eq!(
        bob.to_json(),
        json!({ "name": "Bob", "mother": { "name": "Lily" } })
    );
    assert!(Arc::ptr_eq(bob.document().unwrap(), lily.document().unwrap()));
}

// ---------------------------------------------------------------------------
// Timestamps and unions
// ---------------------------------------------------------------------------

#[test]
fn test_prebuilt_temporal_passes_through() {
    let now = Temporal::now();
    let dto = Dto::from_data(
        Value::map([("time", now)]),
        Some(time_schema(json!("timestamp"))),
    )
    .unwrap();
    assert_eq!(*dto.get("time").unwrap(), now);
}

#[test]
fn test_string_timestamp() {
    let dto = Dto::from_data(json!({ "time": SAMPLE_TIME }), Some(time_schema(json!("timestamp"))))
        .unwrap();
    assert_eq!(*dto.get("time").unwrap(), sample_time());
}

#[test]
fn test_nullable_timestamp_to_array_keeps_instant() {
    let dto = Dto::from_data(
        json!({ "time": SAMPLE_TIME }),
        Some(time_schema(json!(["null", "timestamp"]))),
    )
    .unwrap();
    assert_eq!(
        dto.to_array().get("time"),
        Some(&Value::Temporal(sample_time()))
    );
}

#[test]
fn test_timestamp_before_null() {
    let types = json!(["timestamp", "null"]);
    let parsed = Dto::from_data(json!({ "time": SAMPLE_TIME }), Some(time_schema(types.clone())))
        .unwrap();
    assert_eq!(*parsed.get("time").unwrap(), sample_time());

    let null = Dto::from_data(json!({ "time": null }), Some(time_schema(types))).unwrap();
    assert!(null.get("time").unwrap().is_null());
}

#[test]
fn test_single_element_null_union() {
    let dto = Dto::from_data(json!({ "time": null }), Some(time_schema(json!(["null"])))).unwrap();
    assert!(dto.get("time").unwrap().is_null());
    assert!(matches!(
        Dto::from_data(json!({ "time": "x" }), Some(time_schema(json!(["null"])))),
        Err(DtoError::InvalidDataType(_))
    ));
}

#[test]
fn test_null_timestamp_string_union() {
    let types = json!(["null", "timestamp", "string"]);
    let build = |raw: Value| {
        Dto::from_data(Value::map([("time", raw)]), Some(time_schema(types.clone()))).unwrap()
    };

    assert_eq!(*build(Value::from("hello")).get("time").unwrap(), "hello");
    assert_eq!(*build(Value::from(SAMPLE_TIME)).get("time").unwrap(), sample_time());
    assert!(build(Value::Null).get("time").unwrap().is_null());
    let now = Temporal::now();
    assert_eq!(*build(Value::Temporal(now)).get("time").unwrap(), now);
    assert_eq!(
        *build(Value::from("2018-0:45.150374")).get("time").unwrap(),
        "2018-0:45.150374"
    );
}

#[test]
fn test_wrong_timestamp() {
    let err = Dto::from_data(json!({ "time": 254 }), Some(time_schema(json!("timestamp"))))
        .unwrap_err();
    assert!(matches!(err, DtoError::InvalidTemporalValue(_)));

    let err = Dto::from_data(
        json!({ "time": 254 }),
        Some(time_schema(json!(["null", "timestamp", "string"]))),
    )
    .unwrap_err();
    assert!(matches!(err, DtoError::InvalidDataType(_)));
    assert!(err.is_scalar_violation());
}

#[test]
fn test_timestamp_map_with_timezone() {
    let dto = Dto::from_data(
        json!({ "time": { "date": "2018-08-17 15:50:45.150374", "timezone": "+02:00" } }),
        Some(time_schema(json!("timestamp"))),
    )
    .unwrap();
    assert_eq!(*dto.get("time").unwrap(), sample_time());
}

#[test]
fn test_timestamp_map_with_named_zone_uses_date() {
    let raw = json!({
        "time": { "date": SAMPLE_TIME, "timezone_type": 3, "timezone": "Europe/Amsterdam" }
    });

    let dto = Dto::from_data(raw.clone(), Some(time_schema(json!("timestamp")))).unwrap();
    assert_eq!(*dto.get("time").unwrap(), sample_time());

    let dto = Dto::from_data(raw, Some(time_schema(json!(["null", "timestamp", "string"])))).unwrap();
    assert_eq!(*dto.get("time").unwrap(), sample_time());
}

#[test]
fn test_engine_default_offset_applies_to_naive_strings() {
    let engine = Arc::new(Engine::new(EngineOptions {
        temporal: TemporalOptions {
            default_offset: "+02:00".into(),
            ..TemporalOptions::default()
        },
        ..EngineOptions::default()
    }));
    let mut dto = Dto::with_engine(engine, Arc::new(time_schema(json!("timestamp")))).unwrap();
    dto.set("time", "2018-08-17 15:50:45.150374").unwrap();
    assert_eq!(*dto.get("time").unwrap(), sample_time());
}

// ---------------------------------------------------------------------------
// Coercion and pass-through
// ---------------------------------------------------------------------------

#[test]
fn test_hydrate_performs_typecasting() {
    let mut dto = Dto::with_schema(schema(json!({
        "type": "object",
        "properties": { "a": { "type": "string" }, "i": { "type": "integer" } }
    })))
    .unwrap();
    dto.hydrate(json!({ "a": "apple", "i": "42" })).unwrap();
    assert_eq!(dto.to_json(), json!({ "a": "apple", "i": 42 }));
}

#[test]
fn test_object_schema_without_properties() {
    let dto = Dto::from_data(json!({ "x": "xray" }), Some(schema(json!({ "type": "object" }))))
        .unwrap();
    assert_eq!(*dto.get("x").unwrap(), "xray");
}

#[test]
fn test_array_of_objects_is_typed_per_element() {
    let doc = schema(json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": { "n": { "type": "number" } }
        }
    }));
    let mut dto = Dto::from_data(json!([{ "n": "1.5" }, { "n": 2 }]), Some(doc)).unwrap();
    dto.push(json!({ "n": "3" })).unwrap();

    assert_eq!(dto.to_json(), json!([{ "n": 1.5 }, { "n": 2 }, { "n": 3 }]));
    let err = dto.push(json!({ "n": "three" })).unwrap_err();
    assert_eq!(
        err,
        DtoError::InvalidNumberValue("/n: 'three' is not a number".into())
    );
    assert_eq!(dto.len(), 3);
}

#[test]
fn test_string_coercion_of_integer_property() {
    let mut dto = Dto::with_schema(schema(json!({
        "type": "object",
        "properties": { "i": { "type": "integer" } }
    })))
    .unwrap();
    dto.set("i", 5).unwrap();
    assert_eq!(dto.get("i").unwrap().to_string(), "5");
}

#[test]
fn test_schema_errors_surface_at_construction() {
    let err = Dto::with_schema(schema(json!({ "$ref": 42 }))).unwrap_err();
    assert!(matches!(err, DtoError::InvalidReference(_)));

    let err = Dto::with_schema(schema(json!({
        "$ref": "#/definitions/a",
        "definitions": { "a": { "$ref": "#/definitions/a" } }
    })))
    .unwrap_err();
    assert!(matches!(err, DtoError::CyclicReference(_)));
}

#[test]
fn test_unknown_type_name_is_a_parse_error() {
    let err = SchemaDocument::from_json(json!({ "type": "uuid" })).unwrap_err();
    assert!(matches!(err, DtoError::SchemaParse(_)));
}

#[test]
fn test_definition_lookup() {
    let doc = schema(json!({
        "definitions": { "foo": { "title": "bar" } }
    }));
    assert_eq!(
        doc.get_definition("foo").unwrap().title.as_deref(),
        Some("bar")
    );
    assert_eq!(
        doc.get_definition("baz").unwrap_err(),
        DtoError::DefinitionNotFound("baz".into())
    );
    assert_eq!(SchemaNode::default().reference().unwrap(), None);
}
