//! # oas-preprocess-core
//!
//! Prepares the schemas of an OpenAPI document for validator compilation.
//!
//! A run collects every root schema (component schemas, request bodies,
//! responses), walks each schema tree exactly once even across cyclic
//! `$ref`s, and applies three rewrites:
//!
//! - response-side `date`/`date-time` strings get a serializer tag,
//! - request-side `required` lists drop `readOnly` properties,
//! - polymorphic `oneOf`/`anyOf` schemas with a discriminator get one
//!   compiled validator per option.
//!
//! ```
//! use oas_preprocess_core::{preprocess_document, PreprocessOptions};
//! use serde_json::json;
//!
//! let document = json!({
//!     "openapi": "3.0.3",
//!     "paths": {},
//!     "components": { "schemas": {
//!         "Pet": {
//!             "type": "object",
//!             "required": ["id", "name"],
//!             "properties": {
//!                 "id": { "type": "string", "readOnly": true },
//!                 "name": { "type": "string" }
//!             }
//!         }
//!     } }
//! });
//! let output = preprocess_document(document, &PreprocessOptions::default()).unwrap();
//! assert_eq!(
//!     output.request.value()["components"]["schemas"]["Pet"]["required"],
//!     json!(["name"])
//! );
//! ```

pub mod collector;
pub mod compiler;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod handle;
pub mod loader;
pub mod node;
pub mod passes;
pub mod preprocessor;
pub mod resolver;
pub mod schema_utils;
pub mod serializers;
pub mod visitor;
pub mod walker;

pub use collector::{CollectedSchemas, SchemaCollector};
pub use compiler::{
    CompiledValidator, JsonSchemaCompiler, SchemaCompiler, ValidationIssue, ValidationOutcome,
};
pub use config::{DuplicateOptionPolicy, PreprocessOptions, SchemaDraft};
pub use context::{Target, TraversalContext, TraversalContexts};
pub use document::{ApiDocument, DiscriminatorDescriptor, DiscriminatorOption, Documents};
pub use error::{ErrorCode, PreprocessError};
pub use handle::SpecHandle;
pub use loader::{LoadedSpec, SourceFormat, SpecLoader};
pub use node::{RefSite, SchemaNode};
pub use preprocessor::{Preprocessed, SpecPreprocessor};
pub use resolver::{LocalResolver, RefResolver, ResolvedRef};
pub use schema_utils::SchemaPath;
pub use serializers::{DateFormat, SerializerTag};
pub use visitor::PreprocessVisitor;
pub use walker::{SchemaVisitor, SchemaWalker, WalkStats};

use serde_json::Value;

/// Preprocess `document` with the same-document resolver and the
/// `jsonschema`-backed compiler.
///
/// With `use_dedicated_response_doc`, the response document starts as a
/// clone of `document`.
pub fn preprocess_document(
    document: Value,
    options: &PreprocessOptions,
) -> Result<Preprocessed, PreprocessError> {
    let resolver = LocalResolver::new();
    let compiler = JsonSchemaCompiler::new(options.draft.for_document(&document));
    SpecPreprocessor::new(document, None, &resolver, &compiler, options.clone())?.preprocess()
}

/// Preprocess a document produced by [`SpecLoader`], resolving references
/// against its location.
pub fn preprocess_loaded(
    spec: LoadedSpec,
    options: &PreprocessOptions,
) -> Result<Preprocessed, PreprocessError> {
    let resolver = spec.resolver();
    let compiler = JsonSchemaCompiler::new(options.draft.for_document(&spec.request));
    SpecPreprocessor::new(spec.request, spec.response, &resolver, &compiler, options.clone())?
        .preprocess()
}
