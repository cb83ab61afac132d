//! Ordered trial of union type candidates.

use tracing::debug;

use crate::engine::ValidationContext;
use crate::error::{DtoError, Result};
use crate::types::{SchemaNode, SchemaType};
use crate::validators::validator_for;
use crate::value::Value;

/// Tries each candidate type in schema order; the first success wins.
///
/// Order is a tie-break: with `["null", "timestamp", "string"]`, `null`
/// stays null, parseable strings become instants, and other strings are
/// kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionResolver;

impl UnionResolver {
    /// # Errors
    ///
    /// Returns [`DtoError::InvalidDataType`] naming the candidates and the
    /// last underlying failure when no candidate accepts `raw`. Schema
    /// errors raised by a candidate are returned immediately.
    pub fn validate(
        &self,
        raw: &Value,
        candidates: &[SchemaType],
        node: &SchemaNode,
        cx: &ValidationContext<'_>,
    ) -> Result<Value> {
        let mut last_error: Option<DtoError> = None;

        for candidate in candidates {
            match validator_for(*candidate).validate(raw, node, cx) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_schema_error() => return Err(err),
                Err(err) => {
                    debug!(candidate = %candidate, error = %err, "Union candidate rejected value");
                    last_error = Some(err);
                }
            }
        }

        let names: Vec<&str> = candidates.iter().map(SchemaType::as_str).collect();
        let mut message = format!("{} matched none of [{}]", raw.type_name(), names.join(", "));
        if let Some(err) = last_error {
            message.push_str(&format!(" (last error: {err})"));
        }
        Err(DtoError::InvalidDataType(message))
    }
}
