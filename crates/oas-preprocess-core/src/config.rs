//! Configuration for a preprocessing run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How to react when two discriminator branches claim the same option name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateOptionPolicy {
    /// Log a warning; the branch visited later overwrites the earlier validator.
    Warn,
    /// Abort the run with `PreprocessError::DuplicateDiscriminatorOption`.
    Reject,
}

/// JSON Schema dialect used when compiling discriminator branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaDraft {
    /// Pick from the document's `openapi` version: 3.1 → 2020-12, else Draft 4.
    Auto,
    Draft4,
    Draft202012,
}

impl SchemaDraft {
    /// Resolve [`SchemaDraft::Auto`] against a loaded document.
    pub fn for_document(self, document: &Value) -> SchemaDraft {
        match self {
            SchemaDraft::Auto => {
                let version = document.get("openapi").and_then(Value::as_str);
                if version.is_some_and(|v| v.starts_with("3.1")) {
                    SchemaDraft::Draft202012
                } else {
                    SchemaDraft::Draft4
                }
            }
            explicit => explicit,
        }
    }
}

/// Options for a preprocessing run.
///
/// Fields are serialized in `kebab-case` (e.g. `use-dedicated-response-doc`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PreprocessOptions {
    /// Load the response document separately so response-side rewrites
    /// (serializer tags) never leak into the request document. When false,
    /// only the request document is produced.
    pub use_dedicated_response_doc: bool,
    /// Duplicate discriminator option handling. Default: warn.
    pub duplicate_options: DuplicateOptionPolicy,
    /// Dialect for compiled discriminator validators. Default: auto.
    pub draft: SchemaDraft,
    /// Maximum `$ref` → `$ref` hops followed at a root boundary.
    pub max_ref_hops: usize,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            use_dedicated_response_doc: false,
            duplicate_options: DuplicateOptionPolicy::Warn,
            draft: SchemaDraft::Auto,
            max_ref_hops: 32,
        }
    }
}
