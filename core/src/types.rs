//! Schema type definitions.
//!
//! A restricted JSON-Schema dialect: `type` (a name or an ordered list of
//! names), `properties`, `items`, `$ref` and root-level `definitions`. The
//! non-standard `"timestamp"` type requests temporal coercion. Keywords
//! outside this set are accepted and ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DtoError, Result};

/// A primitive schema type name.
///
/// # Examples
///
/// ```
/// use schema_dto_core::SchemaType;
///
/// let ty: SchemaType = serde_json::from_str(r#""timestamp""#).unwrap();
/// assert_eq!(ty, SchemaType::Timestamp);
/// assert!(SchemaType::Array.is_container());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Object,
    Array,
    /// Temporal value (extension to JSON-Schema).
    Timestamp,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Timestamp => "timestamp",
        }
    }

    /// `true` for `object` and `array`.
    pub fn is_container(&self) -> bool {
        matches!(self, SchemaType::Object | SchemaType::Array)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` keyword: a single type or an ordered union of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    Single(SchemaType),
    /// Candidates in schema order; the first that accepts a value wins.
    Union(Vec<SchemaType>),
}

impl TypeDecl {
    /// The declared candidates in order.
    pub fn types(&self) -> &[SchemaType] {
        match self {
            TypeDecl::Single(ty) => std::slice::from_ref(ty),
            TypeDecl::Union(types) => types,
        }
    }

    pub fn includes(&self, ty: SchemaType) -> bool {
        self.types().contains(&ty)
    }
}

impl From<SchemaType> for TypeDecl {
    fn from(ty: SchemaType) -> Self {
        TypeDecl::Single(ty)
    }
}

/// One node of a schema document.
///
/// Child nodes are reference-counted so resolved nodes can be shared by
/// many Dto instances without copying.
///
/// # Examples
///
/// ```
/// use schema_dto_core::{SchemaNode, SchemaType};
///
/// let node = SchemaNode::of(SchemaType::Object)
///     .with_property("name", SchemaNode::of(SchemaType::String))
///     .with_property("mother", SchemaNode::reference_to("#/definitions/person"));
///
/// assert_eq!(node.property("mother").unwrap().reference().unwrap(), Some("#/definitions/person"));
/// assert_eq!(node.reference().unwrap(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared type or union of types.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeDecl>,
    /// Declared properties. `None` means arbitrary keys pass through untyped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Arc<SchemaNode>>>,
    /// Shared schema for every array element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Arc<SchemaNode>>,
    /// Raw `$ref`; kept untyped so a malformed reference is reported on use.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<serde_json::Value>,
    /// Named reusable nodes. Only read from the document root.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Arc<SchemaNode>>,
}

impl SchemaNode {
    /// Creates a node of a single type.
    pub fn of(ty: SchemaType) -> Self {
        Self {
            types: Some(TypeDecl::Single(ty)),
            ..Default::default()
        }
    }

    /// Creates a node accepting any of `types`, tried in order.
    pub fn union(types: impl IntoIterator<Item = SchemaType>) -> Self {
        Self {
            types: Some(TypeDecl::Union(types.into_iter().collect())),
            ..Default::default()
        }
    }

    /// Creates a `$ref` node.
    pub fn reference_to(pointer: &str) -> Self {
        Self {
            reference: Some(serde_json::Value::String(pointer.to_string())),
            ..Default::default()
        }
    }

    /// Adds a declared property.
    pub fn with_property(mut self, name: &str, node: SchemaNode) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), Arc::new(node));
        self
    }

    /// Sets the item schema.
    pub fn with_items(mut self, node: SchemaNode) -> Self {
        self.items = Some(Arc::new(node));
        self
    }

    /// Adds a named definition.
    pub fn with_definition(mut self, name: &str, node: SchemaNode) -> Self {
        self.definitions.insert(name.to_string(), Arc::new(node));
        self
    }

    /// Returns the `$ref` pointer, or `None` when the node has no reference.
    ///
    /// # Errors
    ///
    /// Returns [`DtoError::InvalidReference`] when `$ref` is present but is
    /// not a string.
    pub fn reference(&self) -> Result<Option<&str>> {
        match &self.reference {
            None => Ok(None),
            Some(serde_json::Value::String(pointer)) => Ok(Some(pointer)),
            Some(other) => Err(DtoError::InvalidReference(format!(
                "$ref must be a string, got {other}"
            ))),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Arc<SchemaNode>> {
        self.properties.as_ref()?.get(name)
    }

    /// The type used for dispatch.
    ///
    /// Without an explicit `type`, a node with `properties` is an object and
    /// a node with `items` is an array; anything else is untyped (`None`).
    pub fn effective_type(&self) -> Option<TypeDecl> {
        if let Some(types) = &self.types {
            return Some(types.clone());
        }
        if self.properties.is_some() {
            Some(TypeDecl::Single(SchemaType::Object))
        } else if self.items.is_some() {
            Some(TypeDecl::Single(SchemaType::Array))
        } else {
            None
        }
    }

    /// `true` when the effective type includes `ty`.
    pub fn accepts(&self, ty: SchemaType) -> bool {
        self.effective_type().is_some_and(|decl| decl.includes(ty))
    }
}

/// A schema document: the root node plus its `definitions`.
///
/// Read-only after construction and cheap to share behind an [`Arc`].
///
/// # Examples
///
/// ```
/// use schema_dto_core::SchemaDocument;
/// use serde_json::json;
///
/// let doc = SchemaDocument::from_json(json!({
///     "$ref": "#/definitions/person",
///     "definitions": {
///         "person": { "type": "object", "properties": { "name": { "type": "string" } } }
///     }
/// }))
/// .unwrap();
///
/// assert!(doc.get_definition("person").is_ok());
/// assert!(doc.get_definition("pet").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument {
    root: Arc<SchemaNode>,
}

impl SchemaDocument {
    pub fn new(root: SchemaNode) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// Builds a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`DtoError::SchemaParse`] for structurally invalid schemas,
    /// e.g. an unknown type name.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parses a document from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn root(&self) -> &Arc<SchemaNode> {
        &self.root
    }

    /// The document's `id`, if declared on the root.
    pub fn id(&self) -> Option<&str> {
        self.root.id.as_deref()
    }

    pub fn definitions(&self) -> &BTreeMap<String, Arc<SchemaNode>> {
        &self.root.definitions
    }

    /// Returns the raw (unresolved) definition named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DtoError::DefinitionNotFound`] when no such definition exists.
    pub fn get_definition(&self, name: &str) -> Result<&Arc<SchemaNode>> {
        self.root
            .definitions
            .get(name)
            .ok_or_else(|| DtoError::DefinitionNotFound(name.to_string()))
    }
}

impl From<SchemaNode> for SchemaDocument {
    fn from(root: SchemaNode) -> Self {
        Self::new(root)
    }
}
