//! `$ref` resolution.
//!
//! The engine never dereferences by copying on its own: it asks a
//! [`RefResolver`] where a reference points and then works with that
//! location. [`LocalResolver`] handles same-document references, which is
//! all a bundled OpenAPI document contains. Cross-file references are the
//! loader's job and come back as [`ResolvedRef::Unresolvable`].

use percent_encoding::percent_decode_str;
use serde_json::Value;
use url::Url;

use crate::error::PreprocessError;
use crate::schema_utils::SchemaPath;

/// Base URI assumed when the document location is unknown.
const DEFAULT_BASE: &str = "file:///openapi.json";

/// Outcome of resolving a `$ref` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRef {
    /// The reference designates an existing value at this location.
    Pointer(SchemaPath),
    /// External, malformed, or dangling reference. Carries the original string.
    Unresolvable(String),
}

impl ResolvedRef {
    pub fn pointer(self) -> Option<SchemaPath> {
        match self {
            ResolvedRef::Pointer(path) => Some(path),
            ResolvedRef::Unresolvable(_) => None,
        }
    }
}

/// Resolver collaborator injected into the collector and walker.
pub trait RefResolver {
    /// Resolve `reference` against `document`.
    fn resolve(&self, document: &Value, reference: &str) -> ResolvedRef;
}

/// Resolves references that point back into the same document.
///
/// Accepts plain fragments (`#/components/schemas/Pet`) and references that
/// name the document itself before the fragment
/// (`openapi.yaml#/components/schemas/Pet`), judged by joining them onto the
/// document's base URI.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    base_uri: Url,
}

impl LocalResolver {
    pub fn new() -> Self {
        Self {
            base_uri: Url::parse(DEFAULT_BASE).expect("DEFAULT_BASE is a valid URL"),
        }
    }

    /// Resolver for a document loaded from `base_uri`.
    pub fn with_base_uri(base_uri: &str) -> Result<Self, PreprocessError> {
        let base_uri = Url::parse(base_uri).map_err(|e| PreprocessError::SchemaError {
            path: base_uri.to_string(),
            message: format!("invalid base URI: {e}"),
        })?;
        Ok(Self { base_uri })
    }

    /// Resolver for a document whose location is already a parsed URL.
    pub fn from_url(base_uri: Url) -> Self {
        Self { base_uri }
    }

    /// The base URI references are joined against.
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Turn a reference into a document path without checking it exists.
    fn local_path(&self, reference: &str) -> Option<SchemaPath> {
        let (document_part, fragment) = reference.split_once('#')?;
        if !document_part.is_empty() {
            let joined = self.base_uri.join(document_part).ok()?;
            let mut base = self.base_uri.clone();
            base.set_fragment(None);
            if joined != base {
                return None;
            }
        }
        // A fragment is percent-encoded as part of the URI; pointer escapes
        // (`~0`, `~1`) are undone afterwards.
        let fragment = percent_decode_str(fragment).decode_utf8().ok()?;
        if fragment.is_empty() || fragment.starts_with('/') {
            Some(SchemaPath::from_pointer(&fragment))
        } else {
            // `#anchor`-style fragments are not part of OpenAPI 3.0.
            None
        }
    }
}

impl Default for LocalResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RefResolver for LocalResolver {
    fn resolve(&self, document: &Value, reference: &str) -> ResolvedRef {
        match self.local_path(reference) {
            Some(path) if path.lookup(document).is_some() => ResolvedRef::Pointer(path),
            _ => ResolvedRef::Unresolvable(reference.to_string()),
        }
    }
}

/// The `$ref` string of a reference object, if `value` is one.
pub fn reference_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "components": {
                "schemas": {
                    "Pet": { "type": "object" },
                    "a/b": { "type": "string" }
                }
            }
        })
    }

    #[test]
    fn test_fragment_ref_resolves() {
        let resolver = LocalResolver::new();
        assert_eq!(
            resolver.resolve(&doc(), "#/components/schemas/Pet"),
            ResolvedRef::Pointer(SchemaPath::from_segments(["components", "schemas", "Pet"]))
        );
    }

    #[test]
    fn test_escaped_segment_resolves() {
        let resolver = LocalResolver::new();
        let resolved = resolver.resolve(&doc(), "#/components/schemas/a~1b").pointer();
        assert_eq!(
            resolved,
            Some(SchemaPath::from_segments(["components", "schemas", "a/b"]))
        );
    }

    #[test]
    fn test_percent_encoded_fragment_resolves() {
        let document = json!({ "components": { "schemas": {
            "My Pet": { "type": "object" },
            "50%": { "type": "string" }
        } } });
        let resolver = LocalResolver::new();
        assert_eq!(
            resolver.resolve(&document, "#/components/schemas/My%20Pet").pointer(),
            Some(SchemaPath::from_segments(["components", "schemas", "My Pet"]))
        );
        assert_eq!(
            resolver.resolve(&document, "#/components/schemas/50%25").pointer(),
            Some(SchemaPath::from_segments(["components", "schemas", "50%"]))
        );
    }

    #[test]
    fn test_dangling_ref_is_unresolvable() {
        let resolver = LocalResolver::new();
        assert_eq!(
            resolver.resolve(&doc(), "#/components/schemas/Missing"),
            ResolvedRef::Unresolvable("#/components/schemas/Missing".to_string())
        );
    }

    #[test]
    fn test_self_named_document_ref_resolves() {
        let resolver = LocalResolver::with_base_uri("file:///specs/api.yaml").unwrap();
        let resolved = resolver.resolve(&doc(), "api.yaml#/components/schemas/Pet");
        assert!(matches!(resolved, ResolvedRef::Pointer(_)));
    }

    #[test]
    fn test_external_ref_is_unresolvable() {
        let resolver = LocalResolver::with_base_uri("file:///specs/api.yaml").unwrap();
        for reference in [
            "common.yaml#/components/schemas/Pet",
            "https://example.com/schemas.json#/Pet",
            "#pet-anchor",
            "components/schemas/Pet",
        ] {
            assert_eq!(
                resolver.resolve(&doc(), reference),
                ResolvedRef::Unresolvable(reference.to_string()),
                "{reference} should not resolve"
            );
        }
    }

    #[test]
    fn test_invalid_base_uri_is_an_error() {
        assert!(LocalResolver::with_base_uri("not a uri").is_err());
    }
}
