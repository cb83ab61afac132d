//! Static checks over a schema document.
//!
//! Walks the root node and every definition without hydrating anything,
//! resolving each `$ref` and flagging type declarations that can never be
//! satisfied. Dto construction runs these checks and rejects documents
//! with broken references up front rather than on the first write that
//! reaches them.
//!
//! # Examples
//!
//! ```
//! use schema_dto_core::*;
//! use serde_json::json;
//!
//! let good = SchemaDocument::from_json(json!({
//!     "$ref": "#/definitions/person",
//!     "definitions": {
//!         "person": { "properties": { "mother": { "$ref": "#/definitions/person" } } }
//!     }
//! }))
//! .unwrap();
//! assert!(validate_document(&good).is_empty());
//!
//! let bad = SchemaDocument::from_json(json!({
//!     "properties": { "pet": { "$ref": "#/definitions/pet" } }
//! }))
//! .unwrap();
//! let issues = validate_document(&bad);
//! assert_eq!(issues[0].path, "#/properties/pet");
//! assert_eq!(issues[0].error, DtoError::DefinitionNotFound("pet".into()));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::DtoError;
use crate::options::DEFAULT_MAX_REFERENCE_HOPS;
use crate::resolve::SchemaResolver;
use crate::types::{SchemaDocument, SchemaNode, SchemaType, TypeDecl};

/// A problem found at one location of a schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIssue {
    /// JSON-pointer-style location, e.g. `#/definitions/person/properties/name`.
    pub path: String,
    pub error: DtoError,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Checks `document` with the default hop bound.
pub fn validate_document(document: &SchemaDocument) -> Vec<SchemaIssue> {
    validate_document_with(document, DEFAULT_MAX_REFERENCE_HOPS)
}

/// Checks `document`, following at most `max_hops` references per chain.
pub fn validate_document_with(document: &SchemaDocument, max_hops: usize) -> Vec<SchemaIssue> {
    let resolver = SchemaResolver::new(document).with_max_hops(max_hops);
    let mut issues = Vec::new();

    check_node(&resolver, document.root(), "#".to_string(), &mut issues);
    for (name, definition) in document.definitions() {
        let path = format!("#/definitions/{}", escape(name));
        check_node(&resolver, definition, path, &mut issues);
    }

    issues
}

fn check_node(
    resolver: &SchemaResolver<'_>,
    node: &Arc<SchemaNode>,
    path: String,
    issues: &mut Vec<SchemaIssue>,
) {
    if node.reference.is_some() {
        if let Err(error) = resolver.resolve(node) {
            issues.push(SchemaIssue {
                path: path.clone(),
                error,
            });
        }
    }

    if let Some(decl) = &node.types {
        check_type_decl(node, decl, &path, issues);
    }

    if let Some(properties) = &node.properties {
        for (name, child) in properties {
            let child_path = format!("{path}/properties/{}", escape(name));
            check_node(resolver, child, child_path, issues);
        }
    }
    if let Some(items) = &node.items {
        check_node(resolver, items, format!("{path}/items"), issues);
    }
}

fn check_type_decl(node: &SchemaNode, decl: &TypeDecl, path: &str, issues: &mut Vec<SchemaIssue>) {
    let mut push = |message: String| {
        issues.push(SchemaIssue {
            path: path.to_string(),
            error: DtoError::SchemaParse(message),
        })
    };

    let types = decl.types();
    if types.is_empty() {
        push("type list cannot be empty".to_string());
        return;
    }

    let mut seen = HashSet::new();
    for ty in types {
        if !seen.insert(*ty) {
            push(format!("duplicate type '{ty}' in union"));
        }
    }

    if node.properties.is_some() && !decl.includes(SchemaType::Object) {
        push("'properties' declared on a node that is never an object".to_string());
    }
    if node.items.is_some() && !decl.includes(SchemaType::Array) {
        push("'items' declared on a node that is never an array".to_string());
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
