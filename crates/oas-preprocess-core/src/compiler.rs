//! Validator compilation for merged discriminator branches.
//!
//! The engine depends on the [`SchemaCompiler`] trait only. The default
//! [`JsonSchemaCompiler`] builds validators with the `jsonschema` crate; hosts
//! that already own a validator stack can inject their own implementation.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::SchemaDraft;
use crate::error::PreprocessError;

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON Pointer into the validated instance.
    pub instance_path: String,
    /// JSON Pointer into the schema that produced the failure.
    pub schema_path: String,
    pub message: String,
}

/// Result of running a compiled validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    pub fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// An executable predicate produced by a [`SchemaCompiler`].
///
/// Compiled validators are shared read-only between concurrent requests once
/// preprocessing finishes, hence the `Send + Sync` bound.
pub trait CompiledValidator: Send + Sync {
    fn validate(&self, instance: &Value) -> ValidationOutcome;
}

/// Compiler collaborator: schema in, validator out.
pub trait SchemaCompiler {
    fn compile(&self, schema: &Value) -> Result<Arc<dyn CompiledValidator>, PreprocessError>;
}

/// [`SchemaCompiler`] backed by the `jsonschema` crate.
#[derive(Debug, Clone, Copy)]
pub struct JsonSchemaCompiler {
    draft: SchemaDraft,
}

impl JsonSchemaCompiler {
    /// `draft` should already be resolved with [`SchemaDraft::for_document`];
    /// a leftover `Auto` compiles as Draft 4.
    pub fn new(draft: SchemaDraft) -> Self {
        Self { draft }
    }

    pub fn draft(&self) -> SchemaDraft {
        self.draft
    }

    fn jsonschema_draft(&self) -> jsonschema::Draft {
        match self.draft {
            SchemaDraft::Draft202012 => jsonschema::Draft::Draft202012,
            SchemaDraft::Draft4 | SchemaDraft::Auto => jsonschema::Draft::Draft4,
        }
    }
}

impl SchemaCompiler for JsonSchemaCompiler {
    fn compile(&self, schema: &Value) -> Result<Arc<dyn CompiledValidator>, PreprocessError> {
        let mut opts = jsonschema::options();
        opts.with_draft(self.jsonschema_draft());
        let validator = opts
            .build(schema)
            .map_err(|e| PreprocessError::CompileError {
                path: e.schema_path.to_string(),
                message: e.to_string(),
            })?;
        Ok(Arc::new(JsonSchemaValidator { validator }))
    }
}

struct JsonSchemaValidator {
    validator: jsonschema::Validator,
}

impl CompiledValidator for JsonSchemaValidator {
    fn validate(&self, instance: &Value) -> ValidationOutcome {
        let issues = self
            .validator
            .iter_errors(instance)
            .map(|e| ValidationIssue {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        ValidationOutcome::from_issues(issues)
    }
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compiled_validator_accepts_and_rejects() {
        let compiler = JsonSchemaCompiler::new(SchemaDraft::Draft4);
        let validator = compiler
            .compile(&json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }))
            .unwrap();

        assert!(validator.validate(&json!({ "name": "Tom" })).valid);

        let outcome = validator.validate(&json!({ "name": 3 }));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].instance_path, "/name");
    }

    #[test]
    fn test_openapi_keywords_are_tolerated() {
        let compiler = JsonSchemaCompiler::new(SchemaDraft::Draft4);
        let validator = compiler
            .compile(&json!({
                "type": "object",
                "discriminator": { "propertyName": "kind" },
                "properties": {
                    "at": { "type": ["object", "string"], "x-serializer": { "format": "date" } },
                    "id": { "type": "string", "readOnly": true }
                }
            }))
            .unwrap();
        assert!(validator.validate(&json!({ "at": "2020-01-01", "id": "x" })).valid);
    }

    #[test]
    fn test_local_refs_resolve_against_embedded_components() {
        let compiler = JsonSchemaCompiler::new(SchemaDraft::Draft4);
        let validator = compiler
            .compile(&json!({
                "type": "object",
                "properties": { "owner": { "$ref": "#/components/schemas/Owner" } },
                "components": {
                    "schemas": {
                        "Owner": { "type": "object", "required": ["name"] }
                    }
                }
            }))
            .unwrap();
        assert!(validator.validate(&json!({ "owner": { "name": "Ann" } })).valid);
        assert!(!validator.validate(&json!({ "owner": {} })).valid);
    }

    #[test]
    fn test_invalid_schema_is_a_compile_error() {
        let compiler = JsonSchemaCompiler::new(SchemaDraft::Draft4);
        let err = compiler.compile(&json!({ "type": 12 })).err().unwrap();
        assert_eq!(err.error_code(), crate::error::ErrorCode::CompileError);
    }
}
