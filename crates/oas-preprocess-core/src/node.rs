//! Transient tree nodes produced by the collector and the walker.

use crate::schema_utils::{PathSegment, SchemaPath};

/// The `$ref` object a node was reached through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSite {
    /// Location of the `{"$ref": ...}` object.
    pub path: SchemaPath,
    /// The reference string as written.
    pub reference: String,
}

/// A schema location visited during one preprocessing run.
///
/// The schema value itself stays in the owning document; the node only
/// addresses it. Parents are supplied by the walker alongside the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    /// Canonical location of the concrete schema.
    pub path: SchemaPath,
    /// Property name this node was reached under (`properties/<name>`).
    pub property: Option<String>,
    /// Set when the node was reached by dereferencing a `$ref`.
    pub ref_site: Option<RefSite>,
}

impl SchemaNode {
    pub fn root(path: SchemaPath) -> Self {
        Self {
            path,
            property: None,
            ref_site: None,
        }
    }

    /// Child reached through a combinator member (`allOf/<i>`, ...).
    pub fn member(&self, keyword: &str, index: usize) -> Self {
        Self {
            path: self
                .path
                .join_all([PathSegment::from(keyword), PathSegment::Index(index)]),
            property: None,
            ref_site: None,
        }
    }

    /// Child reached as `properties/<name>`.
    pub fn property(&self, name: &str) -> Self {
        Self {
            path: self.path.join_all(["properties", name]),
            property: Some(name.to_string()),
            ref_site: None,
        }
    }

    /// The node standing in for this `$ref` object's target.
    ///
    /// Keeps the property name so requirement pruning still sees which key
    /// of the parent the reference sat under. Along a chain of references
    /// the first site is kept: it is the one written inside the parent.
    pub fn through_ref(&self, target: SchemaPath, reference: String) -> Self {
        let ref_site = self.ref_site.clone().unwrap_or(RefSite {
            path: self.path.clone(),
            reference,
        });
        Self {
            path: target,
            property: self.property.clone(),
            ref_site: Some(ref_site),
        }
    }
}
