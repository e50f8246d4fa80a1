//! Cycle-safe depth-first traversal of collected schemas.
//!
//! The walker owns the visited set for one full run over all roots. A
//! schema is identified by the path of its concrete value, so a schema
//! reachable from several places (or from itself) is visited exactly once.
//! References are followed through the injected [`RefResolver`]; a
//! reference whose target was already visited is reported to the visitor's
//! [`SchemaVisitor::closed`] hook instead of being descended into.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::context::TraversalContexts;
use crate::document::Documents;
use crate::node::SchemaNode;
use crate::resolver::{reference_of, RefResolver, ResolvedRef};
use crate::schema_utils::SchemaPath;

/// Combinators in descent precedence order.
const COMBINATORS: [&str; 3] = ["allOf", "oneOf", "anyOf"];

/// Per-node callback driven by [`SchemaWalker`].
pub trait SchemaVisitor {
    type Error;

    /// Called exactly once for every distinct schema reached.
    ///
    /// `contexts` already point at `node`; whatever the visitor leaves in
    /// them is what the node's children inherit.
    fn visit(
        &mut self,
        documents: &mut Documents,
        parent: Option<&SchemaNode>,
        node: &SchemaNode,
        contexts: &mut TraversalContexts,
    ) -> Result<(), Self::Error>;

    /// Called when `node` was reached through a `$ref` whose target had
    /// already been visited. `contexts` point at `node` but carry the
    /// parent's accumulated state.
    fn closed(
        &mut self,
        _documents: &mut Documents,
        _parent: Option<&SchemaNode>,
        _node: &SchemaNode,
        _contexts: &TraversalContexts,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Counters reported by a finished walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Distinct schemas handed to [`SchemaVisitor::visit`].
    pub visited: usize,
    /// References whose target had already been visited.
    pub closed: usize,
    /// References that could not be resolved and were skipped.
    pub unresolved: usize,
}

/// Depth-first walker. One instance covers one walk over a set of roots.
pub struct SchemaWalker<'r> {
    resolver: &'r dyn RefResolver,
    seen: HashSet<SchemaPath>,
    stats: WalkStats,
}

impl<'r> SchemaWalker<'r> {
    pub fn new(resolver: &'r dyn RefResolver) -> Self {
        Self {
            resolver,
            seen: HashSet::new(),
            stats: WalkStats::default(),
        }
    }

    /// Walk every root in order, sharing one visited set.
    ///
    /// Each root starts from fresh traversal contexts.
    pub fn walk<V: SchemaVisitor>(
        mut self,
        documents: &mut Documents,
        roots: &[SchemaNode],
        visitor: &mut V,
    ) -> Result<WalkStats, V::Error> {
        for root in roots {
            self.recurse(documents, None, root, TraversalContexts::new(), visitor)?;
        }
        Ok(self.stats)
    }

    fn recurse<V: SchemaVisitor>(
        &mut self,
        documents: &mut Documents,
        parent: Option<&SchemaNode>,
        node: &SchemaNode,
        mut contexts: TraversalContexts,
        visitor: &mut V,
    ) -> Result<(), V::Error> {
        if self.seen.contains(&node.path) {
            return Ok(());
        }
        let Some(schema) = documents.request.get(&node.path) else {
            return Ok(());
        };

        if let Some(reference) = reference_of(schema).map(str::to_string) {
            self.seen.insert(node.path.clone());
            return match self.resolver.resolve(documents.request.value(), &reference) {
                ResolvedRef::Pointer(target) if self.seen.contains(&target) => {
                    let target = self.settle(documents.request.value(), target);
                    let child = node.through_ref(target, reference);
                    self.stats.closed += 1;
                    tracing::trace!(path = %node.path, target = %child.path, "reference already walked");
                    contexts.enter(&child);
                    visitor.closed(documents, parent, &child, &contexts)
                }
                ResolvedRef::Pointer(target) => {
                    let child = node.through_ref(target, reference);
                    self.recurse(documents, parent, &child, contexts, visitor)
                }
                ResolvedRef::Unresolvable(reference) => {
                    self.stats.unresolved += 1;
                    tracing::debug!(path = %node.path, reference = %reference, "skipping unresolvable reference");
                    Ok(())
                }
            };
        }

        self.seen.insert(node.path.clone());
        self.stats.visited += 1;
        contexts.enter(node);
        tracing::trace!(path = %node.path, "visiting schema");
        visitor.visit(documents, parent, node, &mut contexts)?;

        let children = documents
            .request
            .get(&node.path)
            .map(|schema| children_of(schema, node))
            .unwrap_or_default();
        for child in &children {
            self.recurse(documents, Some(node), child, contexts.clone(), visitor)?;
        }
        Ok(())
    }

    /// Follow a chain of references from `path` to the concrete schema.
    ///
    /// Stops at the last location before a cycle or a dangling reference.
    fn settle(&self, document: &Value, mut path: SchemaPath) -> SchemaPath {
        let mut chain = HashSet::new();
        while chain.insert(path.clone()) {
            let next = path
                .lookup(document)
                .and_then(reference_of)
                .and_then(|reference| self.resolver.resolve(document, reference).pointer());
            match next {
                Some(next) => path = next,
                None => break,
            }
        }
        path
    }
}

/// Structural children of `schema`, with exclusive precedence:
/// `allOf`, else `oneOf`, else `anyOf`, else `properties`.
fn children_of(schema: &Value, node: &SchemaNode) -> Vec<SchemaNode> {
    for keyword in COMBINATORS {
        if let Some(Value::Array(members)) = schema.get(keyword) {
            return (0..members.len())
                .map(|index| node.member(keyword, index))
                .collect();
        }
    }
    match schema.get("properties") {
        Some(Value::Object(properties)) => {
            properties.keys().map(|name| node.property(name)).collect()
        }
        _ => Vec::new(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
