//! Error types for document loading and schema preprocessing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// JSON (de)serialization error.
    JsonParseError,
    /// YAML parse error while loading a document.
    YamlParseError,
    /// The document could not be read.
    DocumentLoadError,
    /// Structurally unusable document (e.g. root is not an object).
    SchemaError,
    /// A `$ref` chain did not terminate within the configured hop budget.
    RefChainTooLong,
    /// A merged discriminator branch schema could not be compiled.
    CompileError,
    /// Two discriminator branches claimed the same option name.
    DuplicateDiscriminatorOption,
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("JSON (de)serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("could not load document from {path}: {reason}")]
    DocumentLoad { path: String, reason: String },

    #[error("Schema error at {path}: {message}")]
    SchemaError { path: String, message: String },

    #[error("$ref chain at {path} exceeds {max_hops} hops")]
    RefChainTooLong { path: String, max_hops: usize },

    #[error("failed to compile discriminator branch {path}: {message}")]
    CompileError { path: String, message: String },

    #[error(
        "discriminator at {path}: option '{option}' maps to both {existing} and {incoming}"
    )]
    DuplicateDiscriminatorOption {
        path: String,
        option: String,
        existing: String,
        incoming: String,
    },
}

impl PreprocessError {
    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PreprocessError::JsonError(_) => ErrorCode::JsonParseError,
            PreprocessError::YamlError(_) => ErrorCode::YamlParseError,
            PreprocessError::DocumentLoad { .. } => ErrorCode::DocumentLoadError,
            PreprocessError::SchemaError { .. } => ErrorCode::SchemaError,
            PreprocessError::RefChainTooLong { .. } => ErrorCode::RefChainTooLong,
            PreprocessError::CompileError { .. } => ErrorCode::CompileError,
            PreprocessError::DuplicateDiscriminatorOption { .. } => {
                ErrorCode::DuplicateDiscriminatorOption
            }
        }
    }

    /// Returns the document path context, if available.
    pub fn path(&self) -> Option<&str> {
        match self {
            PreprocessError::JsonError(_) | PreprocessError::YamlError(_) => None,
            PreprocessError::DocumentLoad { path, .. } => Some(path),
            PreprocessError::SchemaError { path, .. } => Some(path),
            PreprocessError::RefChainTooLong { path, .. } => Some(path),
            PreprocessError::CompileError { path, .. } => Some(path),
            PreprocessError::DuplicateDiscriminatorOption { path, .. } => Some(path),
        }
    }

    /// Structured JSON form: `{"code": "...", "message": "...", "path": "..." | null}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path(),
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
