//! `$ref` resolution against a document's `definitions`.
//!
//! Supported pointers are `#` (the document root), `#/definitions/<name>`
//! and the bare shorthand `<name>`. Chains are followed until a node without
//! a reference is reached; revisiting a target or exceeding the hop bound is
//! reported as [`DtoError::CyclicReference`].

use std::sync::Arc;

use tracing::trace;

use crate::error::{DtoError, Result};
use crate::options::DEFAULT_MAX_REFERENCE_HOPS;
use crate::types::{SchemaDocument, SchemaNode};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Where a `$ref` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pointer {
    Root,
    Definition(String),
}

impl Pointer {
    /// Parses a `$ref` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_dto_core::Pointer;
    ///
    /// assert_eq!(Pointer::parse("#").unwrap(), Pointer::Root);
    /// assert_eq!(
    ///     Pointer::parse("#/definitions/a~1b").unwrap(),
    ///     Pointer::Definition("a/b".into())
    /// );
    /// assert!(Pointer::parse("#/properties/name").is_err());
    /// ```
    pub fn parse(reference: &str) -> Result<Self> {
        if reference == "#" || reference == "#/" {
            return Ok(Pointer::Root);
        }
        if let Some(name) = reference.strip_prefix(DEFINITIONS_PREFIX) {
            if name.is_empty() || name.contains('/') {
                return Err(DtoError::InvalidReference(format!(
                    "unsupported pointer '{reference}'"
                )));
            }
            return Ok(Pointer::Definition(unescape(name)));
        }
        if reference.is_empty() || reference.contains('#') || reference.contains('/') {
            return Err(DtoError::InvalidReference(format!(
                "unsupported pointer '{reference}'"
            )));
        }
        Ok(Pointer::Definition(reference.to_string()))
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Resolves schema nodes against one document.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use schema_dto_core::{SchemaDocument, SchemaNode, SchemaResolver, SchemaType};
///
/// let doc = SchemaDocument::new(
///     SchemaNode::reference_to("#/definitions/a")
///         .with_definition("a", SchemaNode::reference_to("b"))
///         .with_definition("b", SchemaNode::of(SchemaType::String)),
/// );
/// let resolved = SchemaResolver::new(&doc).resolve(doc.root()).unwrap();
/// assert_eq!(*resolved, SchemaNode::of(SchemaType::String));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'a> {
    document: &'a SchemaDocument,
    max_hops: usize,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(document: &'a SchemaDocument) -> Self {
        Self {
            document,
            max_hops: DEFAULT_MAX_REFERENCE_HOPS,
        }
    }

    /// Overrides the hop bound.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn document(&self) -> &'a SchemaDocument {
        self.document
    }

    /// Follows `node`'s reference chain to a concrete node.
    ///
    /// A node without `$ref` resolves to itself.
    ///
    /// # Errors
    ///
    /// - [`DtoError::InvalidReference`] for a non-string or unsupported `$ref`.
    /// - [`DtoError::DefinitionNotFound`] when a target name is missing.
    /// - [`DtoError::CyclicReference`] when the chain loops or exceeds the hop bound.
    pub fn resolve(&self, node: &Arc<SchemaNode>) -> Result<Arc<SchemaNode>> {
        let mut current = Arc::clone(node);
        let mut chain: Vec<Pointer> = Vec::new();

        while let Some(reference) = current.reference()? {
            let pointer = Pointer::parse(reference)?;
            if chain.contains(&pointer) || chain.len() >= self.max_hops {
                chain.push(pointer);
                return Err(DtoError::CyclicReference(describe_chain(&chain)));
            }
            trace!(reference, hop = chain.len(), "Following schema reference");
            let target = self.lookup(&pointer)?;
            chain.push(pointer);
            current = target;
        }

        Ok(current)
    }

    /// Performs a single hop without following further references.
    pub fn lookup(&self, pointer: &Pointer) -> Result<Arc<SchemaNode>> {
        match pointer {
            Pointer::Root => Ok(Arc::clone(self.document.root())),
            Pointer::Definition(name) => self.get_definition(name).map(Arc::clone),
        }
    }

    /// Returns the raw definition named `name`.
    pub fn get_definition(&self, name: &str) -> Result<&'a Arc<SchemaNode>> {
        self.document.get_definition(name)
    }
}

fn describe_chain(chain: &[Pointer]) -> String {
    chain
        .iter()
        .map(|pointer| match pointer {
            Pointer::Root => "#".to_string(),
            Pointer::Definition(name) => format!("{DEFINITIONS_PREFIX}{name}"),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::SchemaType;

    fn person_document() -> SchemaDocument {
        SchemaDocument::from_json(json!({
            "id": "person",
            "$ref": "#/definitions/person",
            "definitions": {
                "person": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "mother": { "$ref": "#/definitions/person" },
                        "father": { "$ref": "#/definitions/person" }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_node_without_reference_is_identity() {
        let doc = person_document();
        let node = Arc::new(SchemaNode::of(SchemaType::Integer));
        let resolved = SchemaResolver::new(&doc).resolve(&node).unwrap();
        assert!(Arc::ptr_eq(&node, &resolved));
    }

    #[test]
    fn test_self_referential_definition_resolves() {
        let doc = person_document();
        let resolver = SchemaResolver::new(&doc);
        let person = resolver.resolve(doc.root()).unwrap();
        let mother = resolver.resolve(person.property("mother").unwrap()).unwrap();
        assert!(Arc::ptr_eq(&person, &mother));
    }

    #[test]
    fn test_missing_definition() {
        let doc = SchemaDocument::new(SchemaNode::reference_to("#/definitions/ghost"));
        let err = SchemaResolver::new(&doc).resolve(doc.root()).unwrap_err();
        assert_eq!(err, DtoError::DefinitionNotFound("ghost".into()));
    }

    #[test]
    fn test_cycle_is_detected() {
        let doc = SchemaDocument::new(
            SchemaNode::reference_to("#/definitions/a")
                .with_definition("a", SchemaNode::reference_to("#/definitions/b"))
                .with_definition("b", SchemaNode::reference_to("a")),
        );
        let err = SchemaResolver::new(&doc).resolve(doc.root()).unwrap_err();
        assert_eq!(
            err,
            DtoError::CyclicReference(
                "#/definitions/a -> #/definitions/b -> #/definitions/a".into()
            )
        );
    }

    #[test]
    fn test_root_self_reference_is_a_cycle() {
        let doc = SchemaDocument::new(SchemaNode::reference_to("#"));
        let err = SchemaResolver::new(&doc).resolve(doc.root()).unwrap_err();
        assert!(matches!(err, DtoError::CyclicReference(_)));
    }

    #[test]
    fn test_hop_bound() {
        let mut root = SchemaNode::reference_to("d0");
        for i in 0..5 {
            root = root.with_definition(&format!("d{i}"), SchemaNode::reference_to(&format!("d{}", i + 1)));
        }
        root = root.with_definition("d5", SchemaNode::of(SchemaType::Null));
        let doc = SchemaDocument::new(root);

        assert!(SchemaResolver::new(&doc).resolve(doc.root()).is_ok());
        let err = SchemaResolver::new(&doc)
            .with_max_hops(3)
            .resolve(doc.root())
            .unwrap_err();
        assert!(matches!(err, DtoError::CyclicReference(_)));
    }

    #[test]
    fn test_invalid_pointer_forms() {
        for bad in ["", "#/properties/x", "#/definitions/", "other.json#/x"] {
            assert!(
                matches!(Pointer::parse(bad), Err(DtoError::InvalidReference(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
