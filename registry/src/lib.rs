//! Named schema registry for schema-driven DTOs.
//!
//! This crate loads schema documents from directories and bundles, keeps
//! them under names that act as DTO classes, and builds [`Dto`]s that share
//! one configured engine.
//!
//! # Quick start
//!
//! ```no_run
//! use schema_dto_registry::{RegistryConfig, SchemaRegistry};
//! use serde_json::json;
//!
//! // Everything a config file names, merged
//! let registry = SchemaRegistry::from_config_file("schema-dto.yml").unwrap();
//! let bob = registry.instantiate("person", json!({ "name": "Bob" })).unwrap();
//! println!("{}", bob.to_json());
//!
//! // Or a fallback chain: the first source that loads wins
//! let registry = SchemaRegistry::builder()
//!     .from_dir("schemas/")
//!     .from_bundle("schemas.json")
//!     .build()
//!     .unwrap();
//!
//! let config = RegistryConfig::load("schema-dto.yml").unwrap();
//! assert!(config.has_sources());
//! ```
//!
//! [`Dto`]: schema_dto_core::Dto

mod config;
mod error;
mod loader;

pub use config::{CONFIG_VERSION, RegistryConfig};
pub use error::{RegistryError, Result};
pub use loader::{RegistryBuilder, RegistrySource, SchemaRegistry, read_schema_file};
