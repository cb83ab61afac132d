//! Schema-driven data transfer objects.
//!
//! This crate hydrates loosely-typed data into typed, schema-validated
//! objects:
//!
//! - [`SchemaDocument`] / [`SchemaNode`]: a restricted JSON-Schema-like
//!   document with `type`, `properties`, `items`, `$ref` and `definitions`,
//!   plus the `timestamp` extension type.
//! - [`SchemaResolver`]: follows `$ref` chains against `definitions` with
//!   cycle protection, so self-referential schemas describe unbounded data.
//! - [`TypeDetector`]: classifies raw [`Value`]s into a [`Kind`].
//! - [`TypeValidator`] implementations and [`UnionResolver`]: coerce or
//!   reject a value for one schema type, or for an ordered list of types.
//! - [`Dto`]: the engine surface: hydrate, `get`/`set` with automatic
//!   deepening of nested structures, `to_array`, `to_scalar`.
//!
//! [`validate_document`] lints a schema without hydrating data.
//!
//! # Example
//!
//! ```
//! use schema_dto_core::*;
//! use serde_json::json;
//!
//! let schema = SchemaDocument::from_json(json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer" },
//!         "born": { "type": ["null", "timestamp"] }
//!     }
//! }))
//! .unwrap();
//!
//! let mut dto = Dto::from_data(json!({ "name": "Bob", "age": "42" }), Some(schema)).unwrap();
//! dto.set("born", "1982-03-01").unwrap();
//!
//! assert_eq!(*dto.get("age").unwrap(), 42i64);
//! assert!(dto.set("age", "forty-two").unwrap_err().is_scalar_violation());
//! assert_eq!(
//!     dto.to_json(),
//!     json!({ "name": "Bob", "age": 42, "born": "1982-03-01T00:00:00.000000Z" })
//! );
//! ```

mod detect;
mod dto;
mod engine;
mod error;
mod options;
mod resolve;
mod temporal;
mod types;
mod union;
mod validate;
mod validators;
mod value;

pub use detect::{Kind, TypeDetector};
pub use dto::Dto;
pub use engine::{Engine, ValidationContext};
pub use error::{DtoError, Result};
pub use options::{DEFAULT_MAX_REFERENCE_HOPS, EngineOptions, TemporalOptions};
pub use resolve::{Pointer, SchemaResolver};
pub use temporal::Temporal;
pub use types::{SchemaDocument, SchemaNode, SchemaType, TypeDecl};
pub use union::UnionResolver;
pub use validate::{SchemaIssue, validate_document, validate_document_with};
pub use validators::{
    ArrayValidator, BooleanValidator, IntegerValidator, NullValidator, NumberValidator,
    ObjectValidator, StringValidator, TimestampValidator, TypeValidator, validator_for,
};
pub use value::Value;
