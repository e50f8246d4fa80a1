//! The preprocessing visitor: runs the rewrite passes on every node the
//! walker reaches, once per target document.

use crate::compiler::SchemaCompiler;
use crate::config::DuplicateOptionPolicy;
use crate::context::{Target, TraversalContexts};
use crate::document::Documents;
use crate::error::PreprocessError;
use crate::node::SchemaNode;
use crate::passes::p2_discriminator::BranchCompiler;
use crate::passes::{p0_serializers, p1_readonly, p2_discriminator};
use crate::resolver::RefResolver;
use crate::walker::SchemaVisitor;

/// [`SchemaVisitor`] applying serializer tagging, readOnly pruning, and
/// discriminator synthesis.
pub struct PreprocessVisitor<'c> {
    branches: BranchCompiler<'c>,
}

impl<'c> PreprocessVisitor<'c> {
    pub fn new(
        compiler: &'c dyn SchemaCompiler,
        resolver: &'c dyn RefResolver,
        policy: DuplicateOptionPolicy,
    ) -> Self {
        Self {
            branches: BranchCompiler {
                compiler,
                resolver,
                policy,
            },
        }
    }
}

impl SchemaVisitor for PreprocessVisitor<'_> {
    type Error = PreprocessError;

    fn visit(
        &mut self,
        documents: &mut Documents,
        parent: Option<&SchemaNode>,
        node: &SchemaNode,
        contexts: &mut TraversalContexts,
    ) -> Result<(), PreprocessError> {
        for target in documents.targets() {
            let Some(document) = documents.get_mut(target) else {
                continue;
            };
            // The response twin may lack a location the request side has.
            if document.get(&node.path).is_none() {
                continue;
            }
            let context = contexts.get_mut(target);

            match target {
                Target::Response => {
                    p0_serializers::tag_date_formats(document, &node.path);
                }
                Target::Request => {
                    p1_readonly::prune_read_only(document, parent, node);
                }
            }
            p2_discriminator::synthesize(document, self.branches, parent, context)?;
        }
        Ok(())
    }

    fn closed(
        &mut self,
        documents: &mut Documents,
        parent: Option<&SchemaNode>,
        node: &SchemaNode,
        contexts: &TraversalContexts,
    ) -> Result<(), PreprocessError> {
        for target in documents.targets() {
            let Some(document) = documents.get_mut(target) else {
                continue;
            };
            if document.get(&node.path).is_none() {
                continue;
            }
            if target == Target::Request {
                p1_readonly::prune_read_only(document, parent, node);
            }
            p2_discriminator::synthesize_closed(document, self.branches, parent, contexts.get(target))?;
        }
        Ok(())
    }
}
