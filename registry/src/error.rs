//! Error types for registry operations.
//!
//! Covers file access, the JSON and YAML decoders, and schema problems
//! reported by the core engine.

use std::path::PathBuf;

use schema_dto_core::DtoError;
use thiserror::Error;

/// Errors that can occur while loading or using a [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Schema resolution or data validation failure.
    #[error(transparent)]
    Dto(#[from] DtoError),

    /// A schema file parsed but does not describe a valid schema document.
    #[error("invalid schema in {path}: {source}")]
    InvalidSchema { path: PathBuf, source: DtoError },

    /// No schema is registered under the requested name.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// All configured loader sources failed.
    #[error("no schema sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
