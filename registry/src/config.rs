//! Registry configuration.
//!
//! Defines the YAML-serializable configuration naming the schema sources a
//! registry loads and the engine options its Dtos share.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! schema_dirs:
//!   - schemas/
//! bundles:
//!   - vendor/schemas.json
//! engine:
//!   max_reference_hops: 32
//!   nullable_strings: true
//!   temporal:
//!     default_offset: "+02:00"
//!     extra_formats:
//!       - "%d/%m/%Y %H:%M"
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use schema_dto_core::EngineOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Current configuration format version.
pub const CONFIG_VERSION: &str = "1.0";

/// Top-level registry configuration.
///
/// Every source is loaded and merged; on name clashes the later source wins
/// (directories first, then bundles, each in listed order).
///
/// # Examples
///
/// ```
/// use schema_dto_registry::RegistryConfig;
///
/// let config: RegistryConfig = serde_yaml::from_str("schema_dirs: [schemas]").unwrap();
/// assert_eq!(config.version, "1.0");
/// assert!(config.bundles.is_empty());
/// assert_eq!(config.engine.max_reference_hops, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Configuration format version.
    pub version: String,
    /// Directories of `*.json`, `*.yaml` and `*.yml` schema files.
    pub schema_dirs: Vec<PathBuf>,
    /// JSON files holding an object of `name -> schema`.
    pub bundles: Vec<PathBuf>,
    /// Options for the engine shared by every Dto the registry builds.
    pub engine: EngineOptions,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            schema_dirs: Vec::new(),
            bundles: Vec::new(),
            engine: EngineOptions::default(),
        }
    }
}

impl RegistryConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::RegistryError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Rewrites relative source paths as relative to `base`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use schema_dto_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig {
    ///     schema_dirs: vec!["schemas".into(), "/opt/schemas".into()],
    ///     ..RegistryConfig::default()
    /// }
    /// .relative_to("/etc/app");
    /// assert_eq!(
    ///     config.schema_dirs,
    ///     vec![PathBuf::from("/etc/app/schemas"), PathBuf::from("/opt/schemas")]
    /// );
    /// ```
    pub fn relative_to(mut self, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        self.schema_dirs.iter_mut().for_each(rebase);
        self.bundles.iter_mut().for_each(rebase);
        self
    }

    /// Returns `true` when no source is configured.
    pub fn has_sources(&self) -> bool {
        !self.schema_dirs.is_empty() || !self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
schema_dirs:
  - schemas
  - /opt/shared
bundles:
  - vendor/bundle.json
engine:
  max_reference_hops: 8
  nullable_strings: false
  temporal:
    default_offset: "-05:00"
    extra_formats:
      - "%d/%m/%Y"
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: RegistryConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.schema_dirs.len(), 2);
        assert_eq!(config.bundles, vec![PathBuf::from("vendor/bundle.json")]);
        assert_eq!(config.engine.max_reference_hops, 8);
        assert!(!config.engine.nullable_strings);
        assert_eq!(config.engine.temporal.default_offset, "-05:00");
        assert_eq!(config.engine.temporal.extra_formats, vec!["%d/%m/%Y"]);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: RegistryConfig = serde_yaml::from_str("version: \"1.0\"").unwrap();
        assert!(!config.has_sources());
        assert_eq!(config.engine, EngineOptions::default());
    }

    #[test]
    fn test_relative_to_keeps_absolute_paths() {
        let config: RegistryConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let config = config.relative_to("/srv/app");
        assert_eq!(
            config.schema_dirs,
            vec![PathBuf::from("/srv/app/schemas"), PathBuf::from("/opt/shared")]
        );
        assert_eq!(
            config.bundles,
            vec![PathBuf::from("/srv/app/vendor/bundle.json")]
        );
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.yml");

        let original: RegistryConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = RegistryConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegistryConfig::load(dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, crate::RegistryError::IoError(_)));
    }
}
