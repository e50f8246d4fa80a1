//! Root schema collection.
//!
//! Finds every schema the walk starts from: named component schemas,
//! request-body media-type schemas, and response media-type schemas per
//! status code. `$ref`s sitting exactly on these boundaries (and on the
//! path items, operations, request bodies, and responses leading to them)
//! are replaced in place with a copy of their target, in the request
//! document and in the response document alike, so both keep the same
//! shape. References deeper inside a schema are left to the walker.

use serde_json::Value;

use crate::document::{ApiDocument, Documents, Resolution};
use crate::error::PreprocessError;
use crate::node::SchemaNode;
use crate::resolver::{reference_of, RefResolver};
use crate::schema_utils::SchemaPath;

/// Operation keys of an OpenAPI path item.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Roots found by [`SchemaCollector::collect`], in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedSchemas {
    pub component_schemas: Vec<SchemaNode>,
    pub request_bodies: Vec<SchemaNode>,
    pub responses: Vec<SchemaNode>,
}

impl CollectedSchemas {
    pub fn len(&self) -> usize {
        self.component_schemas.len() + self.request_bodies.len() + self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Components first, then request bodies, then responses.
    pub fn into_roots(self) -> Vec<SchemaNode> {
        let mut roots = self.component_schemas;
        roots.extend(self.request_bodies);
        roots.extend(self.responses);
        roots
    }
}

pub struct SchemaCollector<'r> {
    resolver: &'r dyn RefResolver,
    max_ref_hops: usize,
}

impl<'r> SchemaCollector<'r> {
    pub fn new(resolver: &'r dyn RefResolver, max_ref_hops: usize) -> Self {
        Self {
            resolver,
            max_ref_hops,
        }
    }

    pub fn collect(&self, documents: &mut Documents) -> Result<CollectedSchemas, PreprocessError> {
        let component_schemas = self.gather_component_schemas(documents)?;
        let (request_bodies, responses) = self.gather_path_schemas(documents)?;
        let collected = CollectedSchemas {
            component_schemas,
            request_bodies,
            responses,
        };
        tracing::debug!(
            components = collected.component_schemas.len(),
            request_bodies = collected.request_bodies.len(),
            responses = collected.responses.len(),
            "collected root schemas"
        );
        Ok(collected)
    }

    /// One root per `components.schemas` entry.
    pub fn gather_component_schemas(
        &self,
        documents: &mut Documents,
    ) -> Result<Vec<SchemaNode>, PreprocessError> {
        let schemas = SchemaPath::from_segments(["components", "schemas"]);
        let mut roots = Vec::new();
        for name in documents.request.keys(&schemas) {
            let path = schemas.join(name);
            if self.resolve_root(documents, &path)? {
                roots.push(SchemaNode::root(path));
            }
        }
        Ok(roots)
    }

    /// Request-body and response roots of every operation.
    ///
    /// Path-level `parameters` are merged into each operation on the way.
    pub fn gather_path_schemas(
        &self,
        documents: &mut Documents,
    ) -> Result<(Vec<SchemaNode>, Vec<SchemaNode>), PreprocessError> {
        let paths = SchemaPath::root().join("paths");
        let mut request_bodies = Vec::new();
        let mut responses = Vec::new();

        for template in documents.request.keys(&paths) {
            let item = paths.join(template);
            if !self.resolve_root(documents, &item)? {
                continue;
            }
            let methods: Vec<String> = documents
                .request
                .keys(&item)
                .into_iter()
                .filter(|key| HTTP_METHODS.contains(&key.as_str()))
                .collect();

            for method in methods {
                let operation = item.join(method);
                if !self.resolve_root(documents, &operation)? {
                    continue;
                }
                self.merge_path_parameters(documents, &item, &operation);
                request_bodies.extend(self.gather_request_body(documents, &operation)?);
                responses.extend(self.gather_responses(documents, &operation)?);
            }
        }
        Ok((request_bodies, responses))
    }

    fn gather_request_body(
        &self,
        documents: &mut Documents,
        operation: &SchemaPath,
    ) -> Result<Vec<SchemaNode>, PreprocessError> {
        let body = operation.join("requestBody");
        if !self.resolve_root(documents, &body)? {
            return Ok(Vec::new());
        }
        self.gather_media_types(documents, &body.join("content"))
    }

    fn gather_responses(
        &self,
        documents: &mut Documents,
        operation: &SchemaPath,
    ) -> Result<Vec<SchemaNode>, PreprocessError> {
        let responses = operation.join("responses");
        let mut roots = Vec::new();
        for status in documents.request.keys(&responses) {
            let response = responses.join(status);
            if self.resolve_root(documents, &response)? {
                roots.extend(self.gather_media_types(documents, &response.join("content"))?);
            }
        }
        Ok(roots)
    }

    fn gather_media_types(
        &self,
        documents: &mut Documents,
        content: &SchemaPath,
    ) -> Result<Vec<SchemaNode>, PreprocessError> {
        let mut roots = Vec::new();
        for media_type in documents.request.keys(content) {
            let schema = content.join_all([media_type.as_str(), "schema"]);
            if self.resolve_root(documents, &schema)? {
                roots.push(SchemaNode::root(schema));
            }
        }
        Ok(roots)
    }

    /// Replace a boundary `$ref` in both documents. `false` means there is
    /// nothing usable at `path`.
    fn resolve_root(
        &self,
        documents: &mut Documents,
        path: &SchemaPath,
    ) -> Result<bool, PreprocessError> {
        let outcome = documents
            .request
            .resolve_in_place(path, self.resolver, self.max_ref_hops)?;
        if let Some(response) = documents.response.as_mut() {
            response.resolve_in_place(path, self.resolver, self.max_ref_hops)?;
        }
        match outcome {
            Resolution::Concrete => Ok(true),
            Resolution::Dangling(reference) => {
                tracing::warn!(path = %path, reference = %reference, "skipping unresolvable reference");
                Ok(false)
            }
            Resolution::Missing => Ok(false),
        }
    }

    /// Append the path item's `parameters` to the operation's, in both
    /// documents.
    pub fn merge_path_parameters(
        &self,
        documents: &mut Documents,
        item: &SchemaPath,
        operation: &SchemaPath,
    ) {
        merge_parameters(&mut documents.request, self.resolver, item, operation);
        if let Some(response) = documents.response.as_mut() {
            merge_parameters(response, self.resolver, item, operation);
        }
    }
}

/// A path-level parameter is skipped when the operation already has an
/// equal parameter, or one with the same `name` and `in`; running the merge
/// twice changes nothing.
fn merge_parameters(
    document: &mut ApiDocument,
    resolver: &dyn RefResolver,
    item: &SchemaPath,
    operation: &SchemaPath,
) {
    let Some(Value::Array(shared)) = document.get(&item.join("parameters")) else {
        return;
    };
    let shared = shared.clone();
    let target = operation.join("parameters");
    let existing = match document.get(&target) {
        None => Vec::new(),
        Some(Value::Array(parameters)) => parameters.clone(),
        Some(_) => return,
    };

    let mut keys: Vec<(String, String)> = existing
        .iter()
        .filter_map(|p| parameter_key(document.value(), resolver, p))
        .collect();
    let mut merged = existing.clone();
    for parameter in shared {
        if merged.contains(&parameter) {
            continue;
        }
        if let Some(key) = parameter_key(document.value(), resolver, &parameter) {
            if keys.contains(&key) {
                continue;
            }
            keys.push(key);
        }
        merged.push(parameter);
    }

    if merged.len() != existing.len() {
        document.set(&target, Value::Array(merged));
    }
}

/// `(name, in)` of a parameter, looking through a `$ref`.
fn parameter_key(
    document: &Value,
    resolver: &dyn RefResolver,
    parameter: &Value,
) -> Option<(String, String)> {
    let concrete = match reference_of(parameter) {
        Some(reference) => resolver.resolve(document, reference).pointer()?.lookup(document)?,
        None => parameter,
    };
    Some((
        concrete.get("name")?.as_str()?.to_string(),
        concrete.get("in")?.as_str()?.to_string(),
    ))
}

// ===========================================================================
// Tests
// ===========================================================================
