//! Schema-bound data transfer objects.
//!
//! A [`Dto`] owns a validated value tree and the resolved schema node it was
//! checked against. Nested containers are validated eagerly on hydration but
//! only wrapped into child Dtos on first access; writes always validate
//! before touching stored state, so a failed `set` leaves the previous value
//! in place.
//!
//! # Examples
//!
//! ```
//! use schema_dto_core::{Dto, SchemaDocument};
//! use serde_json::json;
//!
//! let person = SchemaDocument::from_json(json!({
//!     "$ref": "#/definitions/person",
//!     "definitions": {
//!         "person": {
//!             "type": "object",
//!             "properties": {
//!                 "name": { "type": "string" },
//!                 "mother": { "$ref": "#/definitions/person" }
//!             }
//!         }
//!     }
//! }))
//! .unwrap();
//!
//! let mut bob = Dto::from_data(json!({ "name": "Bob" }), Some(person)).unwrap();
//! bob.set("mother", json!({ "name": "Lily" })).unwrap();
//!
//! assert_eq!(*bob.get("name").unwrap(), "Bob");
//! assert_eq!(*bob.get("mother").unwrap().get("name").unwrap(), "Lily");
//! ```

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::engine::{Engine, ValidationContext};
use crate::error::{DtoError, Result};
use crate::temporal::Temporal;
use crate::types::{SchemaDocument, SchemaNode, SchemaType};
use crate::validate::validate_document_with;
use crate::value::Value;

/// Engine and document shared by a Dto and every child it materializes.
#[derive(Debug, Clone)]
struct Context {
    engine: Arc<Engine>,
    document: Option<Arc<SchemaDocument>>,
}

impl Context {
    fn resolve(&self, node: &Arc<SchemaNode>) -> Result<Arc<SchemaNode>> {
        match &self.document {
            Some(document) => self.engine.resolver(document).resolve(node),
            None => Ok(Arc::clone(node)),
        }
    }

    /// Validates `raw` against an already-resolved node. Free values pass through.
    fn validate(&self, raw: &Value, node: Option<&Arc<SchemaNode>>) -> Result<Value> {
        match (&self.document, node) {
            (Some(document), Some(node)) => {
                ValidationContext::new(&self.engine, document).validate_resolved(raw, node)
            }
            _ => Ok(raw.clone()),
        }
    }

    /// Wraps an already-validated value.
    fn materialize(&self, node: Option<Arc<SchemaNode>>, value: Value) -> Dto {
        if value.is_container() {
            debug!(kind = value.type_name(), "Materializing nested value");
        }
        let mut dto = Dto {
            cx: self.clone(),
            node,
            body: Body::Scalar(Value::Null),
        };
        dto.body = dto.body_from(value);
        dto
    }
}

#[derive(Debug, Clone)]
enum Body {
    Scalar(Value),
    Object(BTreeMap<String, Slot>),
    Array(Vec<Slot>),
}

/// Storage for one child. Absent keys are the uninitialized state.
#[derive(Debug, Clone)]
enum Slot {
    /// Validated but not yet wrapped; `view` caches the wrapper once read.
    Pending {
        value: Value,
        node: Option<Arc<SchemaNode>>,
        view: OnceCell<Dto>,
    },
    Typed(Dto),
}

impl Slot {
    fn pending(value: Value, node: Option<Arc<SchemaNode>>) -> Self {
        Slot::Pending {
            value,
            node,
            view: OnceCell::new(),
        }
    }

    fn view(&self, cx: &Context) -> &Dto {
        match self {
            Slot::Pending { value, node, view } => {
                view.get_or_init(|| cx.materialize(node.clone(), value.clone()))
            }
            Slot::Typed(dto) => dto,
        }
    }

    fn typed_mut(&mut self, cx: &Context) -> Option<&mut Dto> {
        if let Slot::Pending { value, node, view } = self {
            let dto = match view.take() {
                Some(dto) => dto,
                None => cx.materialize(node.take(), std::mem::take(value)),
            };
            *self = Slot::Typed(dto);
        }
        match self {
            Slot::Typed(dto) => Some(dto),
            Slot::Pending { .. } => None,
        }
    }

    fn into_dto(self, cx: &Context) -> Dto {
        match self {
            Slot::Pending { value, node, view } => view
                .into_inner()
                .unwrap_or_else(|| cx.materialize(node, value)),
            Slot::Typed(dto) => dto,
        }
    }

    fn to_array(&self) -> Value {
        match self {
            Slot::Pending { value, .. } => value.clone(),
            Slot::Typed(dto) => dto.to_array(),
        }
    }
}

/// A typed view over data validated against a schema node.
///
/// A Dto without a schema is *free*: every value passes through untyped.
/// Property and index access return child Dtos, so scalar leaves expose
/// [`to_scalar`](Self::to_scalar) and compare directly against plain values.
#[derive(Debug, Clone)]
pub struct Dto {
    cx: Context,
    node: Option<Arc<SchemaNode>>,
    body: Body,
}

impl Default for Dto {
    fn default() -> Self {
        Self::new()
    }
}

impl Dto {
    /// Creates an empty free Dto.
    pub fn new() -> Self {
        Self {
            cx: Context {
                engine: Arc::new(Engine::default()),
                document: None,
            },
            node: None,
            body: Body::Object(BTreeMap::new()),
        }
    }

    /// Creates an empty Dto bound to `document` with default engine options.
    ///
    /// # Errors
    ///
    /// Returns the first broken `$ref` (malformed, missing or cyclic) found
    /// anywhere in `document`.
    pub fn with_schema(document: impl Into<Arc<SchemaDocument>>) -> Result<Self> {
        Self::with_engine(Arc::new(Engine::default()), document.into())
    }

    /// Creates an empty Dto bound to `document` using a shared engine.
    ///
    /// Broken references anywhere in the document fail construction.
    /// Type declarations that can never hold are left to
    /// [`validate_document`](crate::validate_document).
    pub fn with_engine(engine: Arc<Engine>, document: Arc<SchemaDocument>) -> Result<Self> {
        let max_hops = engine.options().max_reference_hops;
        if let Some(issue) = validate_document_with(&document, max_hops)
            .into_iter()
            .find(|issue| !matches!(issue.error, DtoError::SchemaParse(_)))
        {
            return Err(issue.error);
        }
        let node = engine.resolver(&document).resolve(document.root())?;
        let body = empty_body(Some(&node));
        Ok(Self {
            cx: Context {
                engine,
                document: Some(document),
            },
            node: Some(node),
            body,
        })
    }

    /// Creates a Dto and hydrates it from `data` in one step.
    ///
    /// # Errors
    ///
    /// Fails when the schema is malformed or `data` does not validate; no
    /// Dto is produced in either case.
    pub fn from_data(data: impl Into<Value>, schema: Option<SchemaDocument>) -> Result<Self> {
        let mut dto = match schema {
            Some(document) => Self::with_schema(document)?,
            None => Self::new(),
        };
        dto.hydrate(data)?;
        Ok(dto)
    }

    /// Replaces the whole content with `data` validated against the root node.
    ///
    /// Declared-but-absent properties stay uninitialized; undeclared keys
    /// are dropped when the node declares `properties`.
    pub fn hydrate(&mut self, data: impl Into<Value>) -> Result<()> {
        let raw = data.into();
        let validated = self.cx.validate(&raw, self.node.as_ref())?;
        self.body = self.body_from(validated);
        Ok(())
    }

    /// The resolved schema node, or `None` for a free Dto.
    pub fn node(&self) -> Option<&Arc<SchemaNode>> {
        self.node.as_ref()
    }

    pub fn document(&self) -> Option<&Arc<SchemaDocument>> {
        self.cx.document.as_ref()
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.cx.engine
    }

    /// Returns the child stored under `key`, materializing it on first access.
    ///
    /// Sequences accept decimal index keys.
    pub fn get(&self, key: &str) -> Option<&Dto> {
        match &self.body {
            Body::Object(entries) => entries.get(key).map(|slot| slot.view(&self.cx)),
            Body::Array(_) => key.parse().ok().and_then(|index| self.at(index)),
            Body::Scalar(_) => None,
        }
    }

    /// Shorthand for `get(key)` unwrapped to its plain value.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.get(key).map(Dto::to_array)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Dto> {
        let Dto { cx, body, .. } = self;
        let slot = match body {
            Body::Object(entries) => entries.get_mut(key)?,
            Body::Array(items) => items.get_mut(key.parse::<usize>().ok()?)?,
            Body::Scalar(_) => return None,
        };
        slot.typed_mut(cx)
    }

    /// Validates `value` against the property's schema and stores it.
    ///
    /// Raw maps and sequences assigned to a nested object or array property
    /// become typed child Dtos. On sequences, `key` must be a decimal index.
    ///
    /// # Errors
    ///
    /// - [`DtoError::UnknownProperty`] when the object declares `properties`
    ///   and `key` is not among them.
    /// - [`DtoError::NotAContainer`] when this Dto holds a scalar.
    /// - Any validation error for `value`; the stored value is unchanged.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        match &self.body {
            Body::Array(_) => {
                let index = key.parse::<usize>().map_err(|_| {
                    DtoError::NotAContainer(format!("sequence cannot be indexed by '{key}'"))
                })?;
                self.set_at(index, value)
            }
            Body::Scalar(current) => Err(DtoError::NotAContainer(format!(
                "cannot set '{key}' on a {} value",
                current.type_name()
            ))),
            Body::Object(_) => {
                let node = self.property_node(key)?;
                let validated = self.cx.validate(&value.into(), node.as_ref())?;
                let child = self.cx.materialize(node, validated);
                if let Body::Object(entries) = &mut self.body {
                    entries.insert(key.to_string(), Slot::Typed(child));
                }
                Ok(())
            }
        }
    }

    /// Appends to a sequence. An empty free or untyped Dto becomes a sequence.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.promote_to_array();
        let len = self.sequence_len()?;
        self.set_at(len, value)
    }

    pub fn at(&self, index: usize) -> Option<&Dto> {
        match &self.body {
            Body::Array(items) => items.get(index).map(|slot| slot.view(&self.cx)),
            _ => None,
        }
    }

    /// Replaces the element at `index`, or appends when `index == len()`.
    ///
    /// # Errors
    ///
    /// [`DtoError::IndexOutOfBounds`] past the end, [`DtoError::NotAContainer`]
    /// on a non-sequence, or a validation error for `value`.
    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let len = self.sequence_len()?;
        if index > len {
            return Err(DtoError::IndexOutOfBounds { index, len });
        }
        let node = self.item_node()?;
        let validated = self.cx.validate(&value.into(), node.as_ref())?;
        let child = Slot::Typed(self.cx.materialize(node, validated));
        if let Body::Array(items) = &mut self.body {
            if index == len {
                items.push(child);
            } else {
                items[index] = child;
            }
        }
        Ok(())
    }

    /// Removes and returns the child under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Dto> {
        let slot = match &mut self.body {
            Body::Object(entries) => entries.remove(key)?,
            Body::Array(items) => {
                let index = key.parse::<usize>().ok().filter(|i| *i < items.len())?;
                items.remove(index)
            }
            Body::Scalar(_) => return None,
        };
        Some(slot.into_dto(&self.cx))
    }

    pub fn contains(&self, key: &str) -> bool {
        match &self.body {
            Body::Object(entries) => entries.contains_key(key),
            Body::Array(items) => key.parse::<usize>().is_ok_and(|i| i < items.len()),
            Body::Scalar(_) => false,
        }
    }

    /// Number of initialized children; `0` for scalars.
    pub fn len(&self) -> usize {
        match &self.body {
            Body::Object(entries) => entries.len(),
            Body::Array(items) => items.len(),
            Body::Scalar(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Property names in sorted order, or decimal indices for a sequence.
    pub fn keys(&self) -> Vec<String> {
        match &self.body {
            Body::Object(entries) => entries.keys().cloned().collect(),
            Body::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            Body::Scalar(_) => Vec::new(),
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.body, Body::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.body, Body::Object(_))
    }

    /// `true` when this Dto holds a null scalar, including a null string.
    pub fn is_null(&self) -> bool {
        matches!(self.body, Body::Scalar(Value::Null))
    }

    /// Recursively unwraps the graph into plain maps, sequences and scalars.
    ///
    /// Temporals stay [`Value::Temporal`]; use [`to_json`](Self::to_json)
    /// for their RFC 3339 rendering.
    pub fn to_array(&self) -> Value {
        match &self.body {
            Body::Scalar(value) => value.clone(),
            Body::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(key, slot)| (key.clone(), slot.to_array()))
                    .collect(),
            ),
            Body::Array(items) => Value::Sequence(items.iter().map(Slot::to_array).collect()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.to_array().to_json()
    }

    /// The bare scalar, or `None` for containers.
    ///
    /// A null held by a property typed `string` (without `null` in its type)
    /// projects to `""` while [`is_null`](Self::is_null) still reports `true`.
    pub fn to_scalar(&self) -> Option<Value> {
        match &self.body {
            Body::Scalar(Value::Null) if self.null_renders_empty() => Some(Value::String(String::new())),
            Body::Scalar(value) => Some(value.clone()),
            _ => None,
        }
    }

    fn null_renders_empty(&self) -> bool {
        self.cx.engine.options().nullable_strings
            && self
                .node
                .as_ref()
                .is_some_and(|node| node.accepts(SchemaType::String) && !node.accepts(SchemaType::Null))
    }

    /// Builds the body for an already-validated value.
    fn body_from(&self, value: Value) -> Body {
        match value {
            Value::Map(entries) => Body::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| {
                        let node = self.declared_child(&key);
                        (key, Slot::pending(value, node))
                    })
                    .collect(),
            ),
            Value::Sequence(items) => {
                let node = self.item_node().ok().flatten();
                Body::Array(
                    items
                        .into_iter()
                        .map(|value| Slot::pending(value, node.clone()))
                        .collect(),
                )
            }
            scalar => Body::Scalar(scalar),
        }
    }

    /// Resolved node of a declared property; validation has already
    /// resolved it once, so a failure here cannot occur for stored values.
    fn declared_child(&self, key: &str) -> Option<Arc<SchemaNode>> {
        let child = self.node.as_ref()?.property(key)?;
        self.cx.resolve(child).ok()
    }

    fn property_node(&self, key: &str) -> Result<Option<Arc<SchemaNode>>> {
        let Some(node) = &self.node else {
            return Ok(None);
        };
        let Some(properties) = &node.properties else {
            return Ok(None);
        };
        match properties.get(key) {
            Some(child) => self.cx.resolve(child).map(Some),
            None => Err(DtoError::UnknownProperty(key.to_string())),
        }
    }

    fn item_node(&self) -> Result<Option<Arc<SchemaNode>>> {
        match self.node.as_ref().and_then(|node| node.items.as_ref()) {
            Some(items) => self.cx.resolve(items).map(Some),
            None => Ok(None),
        }
    }

    fn sequence_len(&self) -> Result<usize> {
        match &self.body {
            Body::Array(items) => Ok(items.len()),
            Body::Object(_) => Err(DtoError::NotAContainer(
                "object cannot be indexed by position".to_string(),
            )),
            Body::Scalar(value) => Err(DtoError::NotAContainer(format!(
                "cannot index into a {} value",
                value.type_name()
            ))),
        }
    }

    fn promote_to_array(&mut self) {
        let untyped = self
            .node
            .as_ref()
            .is_none_or(|node| node.effective_type().is_none());
        if untyped && matches!(&self.body, Body::Object(entries) if entries.is_empty()) {
            self.body = Body::Array(Vec::new());
        }
    }
}

fn empty_body(node: Option<&Arc<SchemaNode>>) -> Body {
    let Some(decl) = node.and_then(|node| node.effective_type()) else {
        return Body::Object(BTreeMap::new());
    };
    if decl.includes(SchemaType::Object) {
        Body::Object(BTreeMap::new())
    } else if decl.includes(SchemaType::Array) {
        Body::Array(Vec::new())
    } else {
        Body::Scalar(Value::Null)
    }
}

impl fmt::Display for Dto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_scalar() {
            Some(scalar) => write!(f, "{scalar}"),
            None => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Dto {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl PartialEq for Dto {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

impl PartialEq<str> for Dto {
    fn eq(&self, other: &str) -> bool {
        self.to_scalar().as_ref().and_then(Value::as_str) == Some(other)
    }
}

impl PartialEq<&str> for Dto {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<i64> for Dto {
    fn eq(&self, other: &i64) -> bool {
        self.to_scalar().as_ref().and_then(Value::as_i64) == Some(*other)
    }
}

impl PartialEq<Temporal> for Dto {
    fn eq(&self, other: &Temporal) -> bool {
        self.to_scalar().as_ref().and_then(Value::as_temporal) == Some(other)
    }
}

impl From<&Dto> for Value {
    fn from(dto: &Dto) -> Self {
        dto.to_array()
    }
}

impl From<Dto> for Value {
    fn from(dto: Dto) -> Self {
        dto.to_array()
    }
}
