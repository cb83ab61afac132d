//! Validation dispatch.
//!
//! [`Engine`] bundles the detector, options and union resolver; a
//! [`ValidationContext`] pairs an engine with the document being validated
//! against and routes each resolved node to the matching validator.

use std::sync::Arc;

use crate::detect::TypeDetector;
use crate::error::Result;
use crate::options::EngineOptions;
use crate::resolve::SchemaResolver;
use crate::types::{SchemaDocument, SchemaNode, TypeDecl};
use crate::union::UnionResolver;
use crate::validators::validator_for;
use crate::value::Value;

/// The validation services shared by every Dto built from it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use schema_dto_core::{Engine, SchemaDocument, SchemaNode, SchemaType, Value};
///
/// let engine = Engine::default();
/// let doc = SchemaDocument::new(SchemaNode::of(SchemaType::Integer));
/// assert_eq!(engine.validate(&Value::from("42"), doc.root(), &doc).unwrap(), Value::Integer(42));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
    detector: TypeDetector,
    unions: UnionResolver,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            detector: TypeDetector::new(options.temporal.clone()),
            options,
            unions: UnionResolver,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn detector(&self) -> &TypeDetector {
        &self.detector
    }

    /// A resolver for `document` bounded by this engine's hop limit.
    pub fn resolver<'d>(&self, document: &'d SchemaDocument) -> SchemaResolver<'d> {
        SchemaResolver::new(document).with_max_hops(self.options.max_reference_hops)
    }

    /// Resolves `node` within `document` and validates `raw` against it.
    pub fn validate(
        &self,
        raw: &Value,
        node: &Arc<SchemaNode>,
        document: &SchemaDocument,
    ) -> Result<Value> {
        ValidationContext::new(self, document).validate(raw, node)
    }
}

/// An engine bound to one document for the duration of a validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    engine: &'a Engine,
    document: &'a SchemaDocument,
}

impl<'a> ValidationContext<'a> {
    pub fn new(engine: &'a Engine, document: &'a SchemaDocument) -> Self {
        Self { engine, document }
    }

    pub fn detector(&self) -> &'a TypeDetector {
        &self.engine.detector
    }

    pub fn options(&self) -> &'a EngineOptions {
        &self.engine.options
    }

    pub fn resolve(&self, node: &Arc<SchemaNode>) -> Result<Arc<SchemaNode>> {
        self.engine.resolver(self.document).resolve(node)
    }

    /// Resolves `node`, then validates `raw` against the concrete node.
    pub fn validate(&self, raw: &Value, node: &Arc<SchemaNode>) -> Result<Value> {
        let node = self.resolve(node)?;
        self.validate_resolved(raw, &node)
    }

    /// Validates against a node that carries no `$ref`.
    ///
    /// Untyped nodes pass the value through unchanged; one-element unions
    /// behave as their single type so specific error kinds survive.
    pub fn validate_resolved(&self, raw: &Value, node: &SchemaNode) -> Result<Value> {
        match node.effective_type() {
            None => Ok(raw.clone()),
            Some(TypeDecl::Single(ty)) => validator_for(ty).validate(raw, node, self),
            Some(TypeDecl::Union(types)) => match types.as_slice() {
                [ty] => validator_for(*ty).validate(raw, node, self),
                candidates => self.engine.unions.validate(raw, candidates, node, self),
            },
        }
    }
}
