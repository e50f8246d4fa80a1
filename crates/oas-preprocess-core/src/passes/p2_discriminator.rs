//! Pass 2: Discriminator synthesis
//!
//! A polymorphic schema (`oneOf`/`anyOf` plus `discriminator.propertyName`)
//! is the *owner*; each `$ref` member is a *branch*. The owner records its
//! options and its own `properties`/`required` in the traversal
//! accumulator. When a branch is reached, a copy of the branch schema is
//! merged with the owner's base, compiled, and installed on the owner's
//! descriptor under every option name that selects the branch.
//!
//! Branch targets already visited earlier in the walk never get a second
//! `visit`; the walker reports them through `closed`, which runs the same
//! synthesis with the owner's accumulator. That keeps the result
//! independent of the order components are declared in.

use serde_json::{Map, Value};

use crate::compiler::SchemaCompiler;
use crate::config::DuplicateOptionPolicy;
use crate::context::{DiscriminatorState, TraversalContext};
use crate::document::{ApiDocument, DiscriminatorOption};
use crate::error::PreprocessError;
use crate::node::{RefSite, SchemaNode};
use crate::resolver::{reference_of, RefResolver, ResolvedRef};
use crate::schema_utils::{ref_name, SchemaPath};

/// Combinators a discriminator can sit on, in precedence order.
const POLYMORPHIC: [&str; 2] = ["oneOf", "anyOf"];

/// Collaborators used to turn a branch into an installed validator.
#[derive(Clone, Copy)]
pub struct BranchCompiler<'a> {
    pub compiler: &'a dyn SchemaCompiler,
    /// Checks references left in a merged branch before compilation.
    pub resolver: &'a dyn RefResolver,
    pub policy: DuplicateOptionPolicy,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run discriminator synthesis for the freshly visited node `context`
/// points at.
///
/// Builds the branch validator when the node is a referenced member of the
/// active owner, then lets the node become an owner itself. The
/// accumulator only ever serves the owner's direct members, so it is
/// cleared before descending any further.
pub fn synthesize(
    document: &mut ApiDocument,
    branches: BranchCompiler<'_>,
    parent: Option<&SchemaNode>,
    context: &mut TraversalContext,
) -> Result<(), PreprocessError> {
    if context.discriminator.is_active() {
        if let Some(site) = branch_site(parent, context) {
            install_branch(document, branches, &context.path, site, &context.discriminator)?;
        }
        context.discriminator.reset();
    }
    record_owner(document, &context.path, &mut context.discriminator);
    Ok(())
}

/// Synthesis for a branch whose target was already walked.
///
/// `context` points at the branch and still holds the owner's accumulator.
pub fn synthesize_closed(
    document: &mut ApiDocument,
    branches: BranchCompiler<'_>,
    parent: Option<&SchemaNode>,
    context: &TraversalContext,
) -> Result<(), PreprocessError> {
    if let Some(site) = branch_site(parent, context) {
        install_branch(document, branches, &context.path, site, &context.discriminator)?;
    }
    Ok(())
}

/// Option names that select the branch written as `reference`.
///
/// Mapping keys whose value is the reference itself, or the referenced
/// schema's bare name, win; otherwise the last segment of the reference is
/// the implicit name.
pub fn option_names(mapping: &Map<String, Value>, reference: &str) -> Vec<String> {
    let name = ref_name(reference);
    let explicit: Vec<String> = mapping
        .iter()
        .filter(|(_, target)| {
            target.as_str().is_some_and(|target| {
                target == reference || (is_bare_name(target) && target == name)
            })
        })
        .map(|(option, _)| option.clone())
        .collect();
    if explicit.is_empty() {
        vec![name]
    } else {
        explicit
    }
}

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

fn record_owner(document: &mut ApiDocument, path: &SchemaPath, state: &mut DiscriminatorState) {
    let Some(schema) = document.get(path) else {
        return;
    };
    let Some((combinator, members)) = POLYMORPHIC
        .into_iter()
        .find_map(|keyword| Some((keyword, schema.get(keyword)?.as_array()?)))
    else {
        return;
    };
    let Some(property) = schema
        .pointer("/discriminator/propertyName")
        .and_then(Value::as_str)
    else {
        return;
    };
    let mapping = schema
        .pointer("/discriminator/mapping")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let options: Vec<DiscriminatorOption> = members
        .iter()
        .filter_map(reference_of)
        .flat_map(|reference| {
            let name = ref_name(reference);
            option_names(&mapping, reference)
                .into_iter()
                .map(move |option| DiscriminatorOption {
                    option,
                    reference: name.clone(),
                })
        })
        .collect();

    *state = DiscriminatorState {
        owner: Some(path.clone()),
        combinator,
        property: property.to_string(),
        mapping,
        options,
        properties: schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        required: string_list(schema.get("required")),
    };
    tracing::debug!(
        owner = %path,
        property = %state.property,
        options = state.options.len(),
        "recorded discriminator"
    );
    document.describe_discriminator(path, &state.property, &state.options);
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

/// The `$ref` site of the current node, when it was written directly in
/// the owner's combinator list.
fn branch_site<'c>(parent: Option<&SchemaNode>, context: &'c TraversalContext) -> Option<&'c RefSite> {
    let owner = context.discriminator.owner.as_ref()?;
    let site = context.origin.as_ref()?;
    let is_member = parent.is_some_and(|parent| &parent.path == owner)
        && site.path.parent().as_ref() == Some(&owner.join(context.discriminator.combinator));
    is_member.then_some(site)
}

fn install_branch(
    document: &mut ApiDocument,
    branches: BranchCompiler<'_>,
    branch_path: &SchemaPath,
    site: &RefSite,
    state: &DiscriminatorState,
) -> Result<(), PreprocessError> {
    let Some(owner) = &state.owner else {
        return Ok(());
    };
    let Some(Value::Object(branch)) = document.get(branch_path) else {
        return Ok(());
    };

    let mut merged = Value::Object(merge_branch(branch.clone(), state));
    let mut dangling = Vec::new();
    blank_dangling_references(&mut merged, document.value(), branches.resolver, &mut dangling);
    for reference in &dangling {
        tracing::warn!(
            branch = %branch_path,
            reference = %reference,
            "unresolvable reference in discriminator branch; accepting any value there"
        );
    }
    if let Value::Object(merged) = &mut merged {
        if contains_ref(merged) && !merged.contains_key("components") {
            if let Some(components) = document.value().get("components") {
                merged.insert("components".to_string(), components.clone());
            }
        }
    }

    let validator = branches
        .compiler
        .compile(&merged)
        .map_err(|e| match e {
            PreprocessError::CompileError { message, .. } => PreprocessError::CompileError {
                path: branch_path.to_string(),
                message,
            },
            other => other,
        })?;

    for option in option_names(&state.mapping, &site.reference) {
        tracing::debug!(owner = %owner, option = %option, branch = %branch_path, "compiled discriminator branch");
        document.install_validator(owner, &option, &site.reference, validator.clone(), branches.policy)?;
    }
    Ok(())
}

/// The branch schema with the owner's base folded in: properties from both
/// (branch wins), `required` as the ordered union of both.
fn merge_branch(mut branch: Map<String, Value>, state: &DiscriminatorState) -> Map<String, Value> {
    let mut properties = state.properties.clone();
    if let Some(Value::Object(own)) = branch.get("properties") {
        for (name, schema) in own {
            properties.insert(name.clone(), schema.clone());
        }
    }
    if !properties.is_empty() {
        branch.insert("properties".to_string(), Value::Object(properties));
    }

    let mut required = state.required.clone();
    for name in string_list(branch.get("required")) {
        if !required.contains(&name) {
            required.push(name);
        }
    }
    if required.is_empty() {
        branch.shift_remove("required");
    } else {
        branch.insert(
            "required".to_string(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }
    branch
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn is_bare_name(target: &str) -> bool {
    !target.contains('/') && !target.contains('#')
}

/// Replace every reference object in `schema` that does not resolve against
/// `document` with the empty schema, collecting the references in
/// `dangling`.
fn blank_dangling_references(
    schema: &mut Value,
    document: &Value,
    resolver: &dyn RefResolver,
    dangling: &mut Vec<String>,
) {
    if let Some(reference) = reference_of(schema) {
        if let ResolvedRef::Unresolvable(reference) = resolver.resolve(document, reference) {
            dangling.push(reference);
            *schema = Value::Object(Map::new());
            return;
        }
    }
    match schema {
        Value::Object(map) => {
            for value in map.values_mut() {
                blank_dangling_references(value, document, resolver, dangling);
            }
        }
        Value::Array(items) => {
            for item in items {
                blank_dangling_references(item, document, resolver, dangling);
            }
        }
        _ => {}
    }
}

fn contains_ref(schema: &Map<String, Value>) -> bool {
    fn walk(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.contains_key("$ref") || map.values().any(walk),
            Value::Array(items) => items.iter().any(walk),
            _ => false,
        }
    }
    schema.contains_key("$ref") || schema.values().any(walk)
}
