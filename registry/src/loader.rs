//! Schema registry loading with builder pattern and fallback chains.
//!
//! A [`SchemaRegistry`] maps names to shared schema documents. A registered
//! name plays the role of a DTO class: [`SchemaRegistry::instantiate`]
//! builds a [`Dto`] bound to that schema and the registry's engine.
//!
//! # Loading patterns
//!
//! ```no_run
//! use schema_dto_registry::SchemaRegistry;
//!
//! // Load from a directory of JSON/YAML schema files
//! let registry = SchemaRegistry::from_dir("schemas/").unwrap();
//! let person = registry.instantiate("person", serde_json::json!({ "name": "Bob" })).unwrap();
//!
//! // Load from a single JSON bundle `{ "person": {...}, "pet": {...} }`
//! let registry = SchemaRegistry::from_bundle("schemas.json").unwrap();
//!
//! // Use the builder for a fallback chain
//! let registry = SchemaRegistry::builder()
//!     .from_dir("schemas/")
//!     .from_bundle("schemas.json")
//!     .build()
//!     .unwrap();
//! ```

use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use schema_dto_core::{Dto, Engine, EngineOptions, SchemaDocument, SchemaIssue, Value, validate_document_with};
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

/// Describes where a [`SchemaRegistry`] was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrySource {
    /// Built in memory.
    Manual,
    /// Loaded from a directory of individual schema files.
    Directory(PathBuf),
    /// Loaded from a single JSON bundle file.
    Bundle(PathBuf),
    /// Loaded via several sources, either merged or as a fallback chain.
    Multiple(Vec<RegistrySource>),
}

/// Named schema documents plus the engine their Dtos share.
///
/// # Examples
///
/// ```
/// use schema_dto_core::{SchemaDocument, SchemaNode, SchemaType};
/// use schema_dto_registry::SchemaRegistry;
/// use serde_json::json;
///
/// let mut registry = SchemaRegistry::new();
/// registry.insert(
///     "point",
///     SchemaDocument::new(
///         SchemaNode::of(SchemaType::Object)
///             .with_property("x", SchemaNode::of(SchemaType::Integer))
///             .with_property("y", SchemaNode::of(SchemaType::Integer)),
///     ),
/// );
///
/// let point = registry.instantiate("point", json!({ "x": "1", "y": 2 })).unwrap();
/// assert_eq!(point.to_json(), json!({ "x": 1, "y": 2 }));
/// assert!(registry.instantiate("line", json!({})).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<SchemaDocument>>,
    engine: Arc<Engine>,
    source: RegistrySource,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Creates an empty registry with default engine options.
    pub fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
            engine: Arc::new(Engine::default()),
            source: RegistrySource::Manual,
        }
    }

    /// Returns a new [`RegistryBuilder`] for configuring a fallback chain.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Replaces the engine options used for every Dto built from now on.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.engine = Arc::new(Engine::new(options));
        self
    }

    /// Loads schemas from a directory of `*.json`, `*.yaml` and `*.yml` files.
    ///
    /// Each document is registered under its root `id`, or under the file
    /// stem when it has none. Other files are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IoError`] if the directory or a file cannot be
    /// read, a decoder error for malformed JSON/YAML, or
    /// [`RegistryError::InvalidSchema`] when a file is not a schema document.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if schema_format(&file_path).is_some() {
                files.push(file_path);
            }
        }
        files.sort();

        let mut registry = Self {
            source: RegistrySource::Directory(path.to_path_buf()),
            ..Self::new()
        };
        for file_path in files {
            let document = read_schema_file(&file_path)?;
            let name = match document.id() {
                Some(id) => id.to_string(),
                None => file_stem(&file_path),
            };
            debug!(name = %name, path = %file_path.display(), "Loaded schema file");
            registry.insert(name, document);
        }

        info!(path = %path.display(), count = registry.len(), "Loaded schema directory");
        Ok(registry)
    }

    /// Loads schemas from a JSON object mapping names to schema documents.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IoError`] if the file cannot be read,
    /// [`RegistryError::JsonError`] if it is not a JSON object, or
    /// [`RegistryError::InvalidSchema`] for an entry that is not a schema.
    pub fn from_bundle(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let entries: BTreeMap<String, serde_json::Value> = serde_json::from_reader(reader)?;

        let mut registry = Self {
            source: RegistrySource::Bundle(path.to_path_buf()),
            ..Self::new()
        };
        for (name, raw) in entries {
            let document = SchemaDocument::from_json(raw).map_err(|source| {
                RegistryError::InvalidSchema {
                    path: path.join(&name),
                    source,
                }
            })?;
            registry.insert(name, document);
        }

        info!(path = %path.display(), count = registry.len(), "Loaded schema bundle");
        Ok(registry)
    }

    /// Loads and merges every source named by `config`.
    ///
    /// Unlike the [builder](Self::builder), every source must load.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        if !config.has_sources() {
            return Err(RegistryError::NoSourcesAvailable);
        }

        let mut registry = Self::new().with_options(config.engine.clone());
        let mut sources = Vec::new();
        for dir in &config.schema_dirs {
            registry.merge(Self::from_dir(dir)?);
            sources.push(RegistrySource::Directory(dir.clone()));
        }
        for bundle in &config.bundles {
            registry.merge(Self::from_bundle(bundle)?);
            sources.push(RegistrySource::Bundle(bundle.clone()));
        }
        registry.source = RegistrySource::Multiple(sources);
        Ok(registry)
    }

    /// Loads a YAML config file, resolving its relative paths against the
    /// file's directory, and builds the registry it describes.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = RegistryConfig::load(path)?.relative_to(base);
        Self::from_config(&config)
    }

    /// Adds every schema of `other`, replacing same-named entries.
    pub fn merge(&mut self, other: SchemaRegistry) {
        for (name, document) in other.schemas {
            if self.schemas.insert(name.clone(), document).is_some() {
                warn!(name = %name, "Schema replaced by a later source");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<SchemaDocument>> {
        self.schemas.get(name)
    }

    /// Registers a schema, replacing any existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, document: impl Into<Arc<SchemaDocument>>) {
        self.schemas.insert(name.into(), document.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<SchemaDocument>> {
        self.schemas.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Creates an empty Dto for the schema registered as `name`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::SchemaNotFound`] for an unknown name, or
    /// [`RegistryError::Dto`] when the schema fails its checks.
    pub fn create(&self, name: &str) -> Result<Dto> {
        let document = self
            .get(name)
            .ok_or_else(|| RegistryError::SchemaNotFound(name.to_string()))?;
        Ok(Dto::with_engine(Arc::clone(&self.engine), Arc::clone(document))?)
    }

    /// Creates a Dto for `name` and hydrates it from `data`.
    pub fn instantiate(&self, name: &str, data: impl Into<Value>) -> Result<Dto> {
        let mut dto = self.create(name)?;
        dto.hydrate(data)?;
        Ok(dto)
    }

    /// Runs the schema checks over every registered document.
    pub fn lint(&self) -> Vec<(String, SchemaIssue)> {
        let max_hops = self.engine.options().max_reference_hops;
        self.schemas
            .iter()
            .flat_map(|(name, document)| {
                validate_document_with(document, max_hops)
                    .into_iter()
                    .map(move |issue| (name.clone(), issue))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
}

fn schema_format(path: &Path) -> Option<FileFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Some(FileFormat::Json),
        Some("yaml" | "yml") => Some(FileFormat::Yaml),
        _ => None,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads one schema document from a JSON or YAML file.
pub fn read_schema_file(path: impl AsRef<Path>) -> Result<SchemaDocument> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let raw: serde_json::Value = match schema_format(path) {
        Some(FileFormat::Yaml) => serde_yaml::from_reader(reader)?,
        _ => serde_json::from_reader(reader)?,
    };
    SchemaDocument::from_json(raw).map_err(|source| RegistryError::InvalidSchema {
        path: path.to_path_buf(),
        source,
    })
}

/// Builder for constructing a [`SchemaRegistry`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`RegistryError::NoSourcesAvailable`] is returned.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    sources: Vec<RegistrySource>,
    options: Option<EngineOptions>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory of schema files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::Directory(path.into()));
        self
    }

    /// Adds a JSON bundle file as a source.
    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::Bundle(path.into()));
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Attempts to load schemas from configured sources in order.
    pub fn build(self) -> Result<SchemaRegistry> {
        if self.sources.is_empty() {
            return Err(RegistryError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                RegistrySource::Directory(path) => SchemaRegistry::from_dir(path),
                RegistrySource::Bundle(path) => SchemaRegistry::from_bundle(path),
                RegistrySource::Manual | RegistrySource::Multiple(_) => continue,
            };

            match result {
                Ok(mut registry) => {
                    registry.source = RegistrySource::Multiple(all_sources);
                    if let Some(options) = self.options {
                        registry = registry.with_options(options);
                    }
                    return Ok(registry);
                }
                Err(err) => warn!(source = ?source, error = %err, "Schema source failed, trying next"),
            }
        }

        Err(RegistryError::NoSourcesAvailable)
    }
}
