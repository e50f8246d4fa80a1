//! Preprocessing orchestration: collect, walk, visit.

use serde_json::Value;

use crate::collector::SchemaCollector;
use crate::compiler::SchemaCompiler;
use crate::config::PreprocessOptions;
use crate::document::{ApiDocument, Documents};
use crate::error::PreprocessError;
use crate::resolver::RefResolver;
use crate::visitor::PreprocessVisitor;
use crate::walker::{SchemaWalker, WalkStats};

/// Output of a preprocessing run. Immutable once built.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub request: ApiDocument,
    /// Present only when a dedicated response document was configured.
    pub response: Option<ApiDocument>,
    pub stats: WalkStats,
}

impl Preprocessed {
    /// The document response-side validators should be built from.
    ///
    /// Without a dedicated response document this is the request document.
    pub fn response_document(&self) -> &ApiDocument {
        self.response.as_ref().unwrap_or(&self.request)
    }
}

/// Wires the collector, the walker, and the preprocessing visitor together.
pub struct SpecPreprocessor<'a> {
    documents: Documents,
    resolver: &'a dyn RefResolver,
    compiler: &'a dyn SchemaCompiler,
    options: PreprocessOptions,
}

impl<'a> SpecPreprocessor<'a> {
    /// `response` is the independently loaded response-side document. It is
    /// used only with `use_dedicated_response_doc`; when that is set and no
    /// response document is given, the request document is cloned.
    pub fn new(
        request: Value,
        response: Option<Value>,
        resolver: &'a dyn RefResolver,
        compiler: &'a dyn SchemaCompiler,
        options: PreprocessOptions,
    ) -> Result<Self, PreprocessError> {
        let response = if options.use_dedicated_response_doc {
            let value = response.unwrap_or_else(|| request.clone());
            Some(ApiDocument::new(value)?)
        } else {
            None
        };
        Ok(Self {
            documents: Documents::new(ApiDocument::new(request)?, response),
            resolver,
            compiler,
            options,
        })
    }

    pub fn preprocess(self) -> Result<Preprocessed, PreprocessError> {
        let Self {
            mut documents,
            resolver,
            compiler,
            options,
        } = self;

        let roots = SchemaCollector::new(resolver, options.max_ref_hops)
            .collect(&mut documents)?
            .into_roots();

        let mut visitor = PreprocessVisitor::new(compiler, resolver, options.duplicate_options);
        let stats = SchemaWalker::new(resolver).walk(&mut documents, &roots, &mut visitor)?;
        tracing::debug!(
            visited = stats.visited,
            closed = stats.closed,
            unresolved = stats.unresolved,
            "preprocessing complete"
        );

        Ok(Preprocessed {
            request: documents.request,
            response: documents.response,
            stats,
        })
    }
}
