//! Error types for schema resolution and value validation.
//!
//! Every failure the engine can report is a variant of [`DtoError`]. None of
//! them are retried internally: a failed hydration aborts construction and a
//! failed `set` leaves the previous value in place.

use thiserror::Error;

/// Errors raised while resolving schemas or validating values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DtoError {
    /// `$ref` is present but is not a string, or uses an unsupported pointer form.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The referenced name does not exist in `definitions`.
    #[error("definition not found: {0}")]
    DefinitionNotFound(String),

    /// A `$ref` chain never reaches a concrete node.
    #[error("cyclic reference chain: {0}")]
    CyclicReference(String),

    /// The raw value's kind does not match the resolved schema type, or no
    /// union candidate accepted it.
    #[error("invalid data type: {0}")]
    InvalidDataType(String),

    /// A numeric property was given a value that cannot become a number.
    #[error("invalid number value: {0}")]
    InvalidNumberValue(String),

    /// Generic scalar constraint violation.
    #[error("invalid scalar value: {0}")]
    InvalidScalarValue(String),

    /// A temporal property was given a value that cannot be parsed to an instant.
    #[error("invalid timestamp value: {0}")]
    InvalidTemporalValue(String),

    /// Keyed or indexed access on a Dto that holds a scalar.
    #[error("not a container: {0}")]
    NotAContainer(String),

    /// The schema document itself could not be parsed.
    #[error("schema parse error: {0}")]
    SchemaParse(String),

    /// `set` on a key the object schema does not declare.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl DtoError {
    /// Returns `true` for the scalar-violation family: data type, number,
    /// temporal and generic scalar errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_dto_core::DtoError;
    ///
    /// assert!(DtoError::InvalidNumberValue("abc".into()).is_scalar_violation());
    /// assert!(!DtoError::DefinitionNotFound("person".into()).is_scalar_violation());
    /// ```
    pub fn is_scalar_violation(&self) -> bool {
        matches!(
            self,
            DtoError::InvalidDataType(_)
                | DtoError::InvalidNumberValue(_)
                | DtoError::InvalidScalarValue(_)
                | DtoError::InvalidTemporalValue(_)
        )
    }

    /// Returns `true` for failures that come from the schema document rather
    /// than from the data.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            DtoError::InvalidReference(_)
                | DtoError::DefinitionNotFound(_)
                | DtoError::CyclicReference(_)
                | DtoError::SchemaParse(_)
        )
    }

    /// Prefixes the message with the property or index it occurred under,
    /// building a pointer-like path as errors bubble out of nested values.
    pub(crate) fn at(self, segment: &str) -> Self {
        let prefix = |msg: String| {
            if msg.starts_with('/') {
                format!("/{segment}{msg}")
            } else {
                format!("/{segment}: {msg}")
            }
        };
        match self {
            DtoError::InvalidReference(m) => DtoError::InvalidReference(prefix(m)),
            DtoError::DefinitionNotFound(m) => DtoError::DefinitionNotFound(m),
            DtoError::CyclicReference(m) => DtoError::CyclicReference(m),
            DtoError::InvalidDataType(m) => DtoError::InvalidDataType(prefix(m)),
            DtoError::InvalidNumberValue(m) => DtoError::InvalidNumberValue(prefix(m)),
            DtoError::InvalidScalarValue(m) => DtoError::InvalidScalarValue(prefix(m)),
            DtoError::InvalidTemporalValue(m) => DtoError::InvalidTemporalValue(prefix(m)),
            DtoError::NotAContainer(m) => DtoError::NotAContainer(prefix(m)),
            DtoError::UnknownProperty(m) => DtoError::UnknownProperty(prefix(m)),
            other => other,
        }
    }
}

impl From<serde_json::Error> for DtoError {
    fn from(err: serde_json::Error) -> Self {
        DtoError::SchemaParse(err.to_string())
    }
}

/// Convenience alias for results with [`DtoError`].
pub type Result<T> = std::result::Result<T, DtoError>;
