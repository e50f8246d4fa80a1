//! Path-addressable API documents and their annotations.
//!
//! An [`ApiDocument`] owns one parsed document. All reads and writes go
//! through a [`SchemaPath`], and mutation goes through explicit setters, so
//! once preprocessing hands the document out it can be shared read-only.
//! Compiled discriminator validators cannot live inside JSON, so the
//! document also keeps an annotation table keyed by the owning schema's path.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::compiler::CompiledValidator;
use crate::config::DuplicateOptionPolicy;
use crate::context::Target;
use crate::error::PreprocessError;
use crate::resolver::{reference_of, RefResolver, ResolvedRef};
use crate::schema_utils::{PathSegment, SchemaPath};

/// Schema keyword the discriminator descriptor is written under.
pub const DISCRIMINATOR_KEYWORD: &str = "_discriminator";

// ---------------------------------------------------------------------------
// Discriminator descriptors
// ---------------------------------------------------------------------------

/// One selectable value of a discriminator property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscriminatorOption {
    /// Value the discriminator property takes for this branch.
    pub option: String,
    /// Name of the referenced branch schema.
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Annotation on a polymorphic `oneOf`/`anyOf` schema.
#[derive(Clone)]
pub struct DiscriminatorDescriptor {
    pub property: String,
    pub options: Vec<DiscriminatorOption>,
    validators: BTreeMap<String, Arc<dyn CompiledValidator>>,
    /// Full reference each installed validator was compiled from.
    sources: BTreeMap<String, String>,
}

impl DiscriminatorDescriptor {
    fn new(property: String, options: Vec<DiscriminatorOption>) -> Self {
        Self {
            property,
            options,
            validators: BTreeMap::new(),
            sources: BTreeMap::new(),
        }
    }

    pub fn validator(&self, option: &str) -> Option<&Arc<dyn CompiledValidator>> {
        self.validators.get(option)
    }

    /// Options that have a compiled validator, in sorted order.
    pub fn compiled_options(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Validator for the option named by `payload[property]`, if any.
    pub fn select(&self, payload: &Value) -> Option<&Arc<dyn CompiledValidator>> {
        let option = payload.get(&self.property)?.as_str()?;
        self.validator(option)
    }

    /// JSON form written under [`DISCRIMINATOR_KEYWORD`].
    pub fn to_value(&self) -> Value {
        json!({
            "property": self.property,
            "options": self.options,
        })
    }
}

impl fmt::Debug for DiscriminatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscriminatorDescriptor")
            .field("property", &self.property)
            .field("options", &self.options)
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ApiDocument
// ---------------------------------------------------------------------------

/// Outcome of resolving a root-boundary value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A concrete (non-`$ref`) value now sits at the path.
    Concrete,
    /// The chain ended in a reference that does not resolve, or looped.
    Dangling(String),
    /// Nothing exists at the path.
    Missing,
}

/// One parsed API document plus its compiled annotations.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    value: Value,
    discriminators: BTreeMap<SchemaPath, DiscriminatorDescriptor>,
}

impl ApiDocument {
    /// Wrap a parsed document. The root must be a JSON object.
    pub fn new(value: Value) -> Result<Self, PreprocessError> {
        if !value.is_object() {
            return Err(PreprocessError::SchemaError {
                path: "#".to_string(),
                message: "API document root must be an object".to_string(),
            });
        }
        Ok(Self {
            value,
            discriminators: BTreeMap::new(),
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn get(&self, path: &SchemaPath) -> Option<&Value> {
        path.lookup(&self.value)
    }

    pub fn get_mut(&mut self, path: &SchemaPath) -> Option<&mut Value> {
        path.lookup_mut(&mut self.value)
    }

    /// Write `value` at `path`, creating the final key if needed.
    ///
    /// Returns `false` when the parent container does not exist (or the
    /// index is out of bounds); the document is left unchanged then.
    pub fn set(&mut self, path: &SchemaPath, value: Value) -> bool {
        let (Some(parent), Some(last)) = (path.parent(), path.last()) else {
            self.value = value;
            return true;
        };
        match (parent.lookup_mut(&mut self.value), last) {
            (Some(Value::Object(map)), segment) => {
                map.insert(segment.as_key().into_owned(), value);
                true
            }
            (Some(Value::Array(items)), PathSegment::Index(i)) if *i < items.len() => {
                items[*i] = value;
                true
            }
            _ => false,
        }
    }

    /// Object keys of the value at `path`, in document order.
    pub fn keys(&self, path: &SchemaPath) -> Vec<String> {
        self.get(path)
            .and_then(Value::as_object)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Replace a `$ref` at `path` with a copy of its target, following
    /// reference chains for at most `max_hops` steps.
    ///
    /// A chain that comes back to a location it already passed never reaches
    /// a concrete schema and is reported as dangling. Nothing is written
    /// unless the chain ends in a concrete value.
    pub fn resolve_in_place(
        &mut self,
        path: &SchemaPath,
        resolver: &dyn RefResolver,
        max_hops: usize,
    ) -> Result<Resolution, PreprocessError> {
        let Some(mut current) = self.get(path) else {
            return Ok(Resolution::Missing);
        };
        let mut chain = BTreeSet::from([path.clone()]);
        while let Some(reference) = reference_of(current) {
            if chain.len() > max_hops {
                return Err(PreprocessError::RefChainTooLong {
                    path: path.to_string(),
                    max_hops,
                });
            }
            let target = match resolver.resolve(&self.value, reference) {
                ResolvedRef::Pointer(target) => target,
                ResolvedRef::Unresolvable(reference) => {
                    return Ok(Resolution::Dangling(reference));
                }
            };
            if !chain.insert(target.clone()) {
                tracing::debug!(path = %path, target = %target, "reference chain loops back");
                return Ok(Resolution::Dangling(reference.to_string()));
            }
            current = match self.get(&target) {
                Some(next) => next,
                None => return Ok(Resolution::Dangling(reference.to_string())),
            };
        }
        if chain.len() > 1 {
            let concrete = current.clone();
            self.set(path, concrete);
        }
        Ok(Resolution::Concrete)
    }

    // --- discriminator annotations ---

    /// Attach a descriptor to the polymorphic schema at `owner`.
    ///
    /// The first description wins; validators are added later with
    /// [`ApiDocument::install_validator`].
    pub fn describe_discriminator(
        &mut self,
        owner: &SchemaPath,
        property: &str,
        options: &[DiscriminatorOption],
    ) {
        let descriptor = self
            .discriminators
            .entry(owner.clone())
            .or_insert_with(|| DiscriminatorDescriptor::new(property.to_string(), options.to_vec()));
        let annotation = descriptor.to_value();
        if let Some(Value::Object(schema)) = owner.lookup_mut(&mut self.value) {
            schema.insert(DISCRIMINATOR_KEYWORD.to_string(), annotation);
        }
    }

    /// Register the validator for `option` on the descriptor at `owner`.
    pub fn install_validator(
        &mut self,
        owner: &SchemaPath,
        option: &str,
        reference: &str,
        validator: Arc<dyn CompiledValidator>,
        policy: DuplicateOptionPolicy,
    ) -> Result<(), PreprocessError> {
        let Some(descriptor) = self.discriminators.get_mut(owner) else {
            tracing::debug!(owner = %owner, option, "no descriptor to install validator on");
            return Ok(());
        };
        if let Some(existing) = descriptor.sources.get(option) {
            if existing != reference {
                match policy {
                    DuplicateOptionPolicy::Warn => tracing::warn!(
                        owner = %owner,
                        option,
                        existing = %existing,
                        incoming = reference,
                        "duplicate discriminator option; later branch overwrites earlier validator"
                    ),
                    DuplicateOptionPolicy::Reject => {
                        return Err(PreprocessError::DuplicateDiscriminatorOption {
                            path: owner.to_string(),
                            option: option.to_string(),
                            existing: existing.clone(),
                            incoming: reference.to_string(),
                        });
                    }
                }
            }
        }
        descriptor
            .sources
            .insert(option.to_string(), reference.to_string());
        descriptor.validators.insert(option.to_string(), validator);
        Ok(())
    }

    pub fn discriminator(&self, owner: &SchemaPath) -> Option<&DiscriminatorDescriptor> {
        self.discriminators.get(owner)
    }

    pub fn discriminators(&self) -> impl Iterator<Item = (&SchemaPath, &DiscriminatorDescriptor)> {
        self.discriminators.iter()
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// The request document and, when configured, its dedicated response twin.
#[derive(Debug, Clone)]
pub struct Documents {
    pub request: ApiDocument,
    pub response: Option<ApiDocument>,
}

impl Documents {
    pub fn new(request: ApiDocument, response: Option<ApiDocument>) -> Self {
        Self { request, response }
    }

    /// Targets with a document, request first.
    pub fn targets(&self) -> Vec<Target> {
        let mut targets = vec![Target::Request];
        if self.response.is_some() {
            targets.push(Target::Response);
        }
        targets
    }

    pub fn get(&self, target: Target) -> Option<&ApiDocument> {
        match target {
            Target::Request => Some(&self.request),
            Target::Response => self.response.as_ref(),
        }
    }

    pub fn get_mut(&mut self, target: Target) -> Option<&mut ApiDocument> {
        match target {
            Target::Request => Some(&mut self.request),
            Target::Response => self.response.as_mut(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
