//! Per-target traversal state threaded through the walk.
//!
//! The walker keeps one [`TraversalContext`] for the request side and one
//! for the response side. Every child recursion gets its own clone of the
//! parent's contexts after the parent was visited, so whatever a pass
//! accumulates flows down a branch and never across to its siblings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DiscriminatorOption;
use crate::node::{RefSite, SchemaNode};
use crate::schema_utils::SchemaPath;

/// Which side of an exchange a document (or traversal context) serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Request,
    Response,
}

/// Discriminator accumulator.
///
/// Filled in by the polymorphic ancestor; read by its direct branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscriminatorState {
    /// Path of the schema carrying `discriminator` and the combinator.
    pub owner: Option<SchemaPath>,
    /// `oneOf` or `anyOf`, whichever the owner's branches are listed under.
    pub combinator: &'static str,
    /// `discriminator.propertyName` of the owner.
    pub property: String,
    /// `discriminator.mapping` of the owner (empty when absent or malformed).
    pub mapping: Map<String, Value>,
    pub options: Vec<DiscriminatorOption>,
    /// Owner's own `properties`, merged under every branch.
    pub properties: Map<String, Value>,
    /// Owner's own `required`, unioned into every branch.
    pub required: Vec<String>,
}

impl DiscriminatorState {
    pub fn is_active(&self) -> bool {
        self.owner.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// State for one target during the walk.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalContext {
    pub target: Target,
    /// Path of the node currently being visited.
    pub path: SchemaPath,
    /// The `$ref` object the current node was reached through, if any.
    pub origin: Option<RefSite>,
    pub discriminator: DiscriminatorState,
}

impl TraversalContext {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            path: SchemaPath::root(),
            origin: None,
            discriminator: DiscriminatorState::default(),
        }
    }

    /// Point this context at `node`, keeping the accumulated state.
    pub fn enter(&mut self, node: &SchemaNode) {
        self.path = node.path.clone();
        self.origin = node.ref_site.clone();
    }
}

/// The request and response contexts, travelling together.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalContexts {
    pub request: TraversalContext,
    pub response: TraversalContext,
}

impl TraversalContexts {
    pub fn new() -> Self {
        Self {
            request: TraversalContext::new(Target::Request),
            response: TraversalContext::new(Target::Response),
        }
    }

    pub fn get(&self, target: Target) -> &TraversalContext {
        match target {
            Target::Request => &self.request,
            Target::Response => &self.response,
        }
    }

    pub fn get_mut(&mut self, target: Target) -> &mut TraversalContext {
        match target {
            Target::Request => &mut self.request,
            Target::Response => &mut self.response,
        }
    }

    /// Point both contexts at `node` before it is visited.
    pub fn enter(&mut self, node: &SchemaNode) {
        self.request.enter(node);
        self.response.enter(node);
    }
}

impl Default for TraversalContexts {
    fn default() -> Self {
        Self::new()
    }
}
