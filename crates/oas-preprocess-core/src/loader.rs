//! Loading API documents from disk or from text.
//!
//! When a dedicated response document is configured the source is parsed
//! twice, so the two documents share nothing and response-side rewrites
//! cannot leak into the request side.

use std::path::Path;

use serde_json::Value;
use url::Url;

use crate::config::PreprocessOptions;
use crate::error::PreprocessError;
use crate::resolver::LocalResolver;

/// Text format of a document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// `.yaml`/`.yml` files are YAML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SourceFormat::Yaml
            }
            _ => SourceFormat::Json,
        }
    }

    fn parse(self, text: &str) -> Result<Value, PreprocessError> {
        Ok(match self {
            SourceFormat::Json => serde_json::from_str(text)?,
            SourceFormat::Yaml => serde_yaml::from_str(text)?,
        })
    }
}

/// Parsed documents plus the location references are resolved against.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub request: Value,
    pub response: Option<Value>,
    pub base_uri: Url,
}

impl LoadedSpec {
    /// Same-document resolver anchored at the document's location.
    pub fn resolver(&self) -> LocalResolver {
        LocalResolver::from_url(self.base_uri.clone())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpecLoader {
    dedicated_response: bool,
}

impl SpecLoader {
    pub fn new(options: &PreprocessOptions) -> Self {
        Self {
            dedicated_response: options.use_dedicated_response_doc,
        }
    }

    pub fn load_path(&self, path: &Path) -> Result<LoadedSpec, PreprocessError> {
        let text = std::fs::read_to_string(path).map_err(|e| PreprocessError::DocumentLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let base_uri = std::fs::canonicalize(path)
            .ok()
            .and_then(|absolute| Url::from_file_path(absolute).ok())
            .unwrap_or_else(|| LocalResolver::new().base_uri().clone());
        tracing::debug!(path = %path.display(), base = %base_uri, "loading document");
        self.load_with_base(&text, SourceFormat::from_path(path), base_uri)
    }

    pub fn load_str(&self, text: &str, format: SourceFormat) -> Result<LoadedSpec, PreprocessError> {
        self.load_with_base(text, format, LocalResolver::new().base_uri().clone())
    }

    fn load_with_base(
        &self,
        text: &str,
        format: SourceFormat,
        base_uri: Url,
    ) -> Result<LoadedSpec, PreprocessError> {
        let request = format.parse(text)?;
        let response = if self.dedicated_response {
            Some(format.parse(text)?)
        } else {
            None
        };
        Ok(LoadedSpec {
            request,
            response,
            base_uri,
        })
    }
}
