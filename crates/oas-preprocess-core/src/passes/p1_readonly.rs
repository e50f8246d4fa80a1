//! Pass 1: ReadOnly requirement pruning (request side)
//!
//! A client cannot send a property the server owns, so a `readOnly`
//! property must not be required in a request body. The response document
//! keeps its `required` list untouched.

use serde_json::Value;

use crate::document::ApiDocument;
use crate::node::SchemaNode;
use crate::schema_utils::SchemaPath;

/// Drop `node`'s property name from `parent.required` when the property is
/// `readOnly`.
///
/// The flag is honoured on the property schema itself and on the `$ref`
/// object the property was written as. Every occurrence of the name is
/// removed; a `required` list left empty is removed too. Returns `true`
/// when the parent changed.
pub fn prune_read_only(
    document: &mut ApiDocument,
    parent: Option<&SchemaNode>,
    node: &SchemaNode,
) -> bool {
    let (Some(parent), Some(name)) = (parent, node.property.as_deref()) else {
        return false;
    };
    if !is_read_only(document, node) {
        return false;
    }
    let Some(Value::Object(parent_schema)) = document.get_mut(&parent.path) else {
        return false;
    };
    let Some(Value::Array(required)) = parent_schema.get_mut("required") else {
        return false;
    };

    let before = required.len();
    required.retain(|entry| entry.as_str() != Some(name));
    if required.len() == before {
        return false;
    }
    if required.is_empty() {
        parent_schema.shift_remove("required");
    }
    tracing::trace!(parent = %parent.path, property = name, "pruned readOnly property from required");
    true
}

fn is_read_only(document: &ApiDocument, node: &SchemaNode) -> bool {
    let flagged = |path: &SchemaPath| {
        document
            .get(path)
            .and_then(|schema| schema.get("readOnly"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };
    flagged(&node.path) || node.ref_site.as_ref().is_some_and(|site| flagged(&site.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parent() -> SchemaNode {
        SchemaNode::root(SchemaPath::from_pointer("/s"))
    }

    fn doc(schema: Value) -> ApiDocument {
        ApiDocument::new(json!({ "s": schema, "components": { "schemas": {
            "Stamp": { "type": "string", "readOnly": true },
            "Plain": { "type": "string" }
        } } }))
        .unwrap()
    }

    #[test]
    fn test_read_only_property_leaves_required() {
        let mut document = doc(json!({
            "required": ["a", "b"],
            "properties": { "a": { "readOnly": true }, "b": {} }
        }));
        let parent = parent();
        assert!(prune_read_only(&mut document, Some(&parent), &parent.property("a")));
        assert!(!prune_read_only(&mut document, Some(&parent), &parent.property("b")));
        assert_eq!(document.value()["s"]["required"], json!(["b"]));
    }

    #[test]
    fn test_all_occurrences_removed_and_empty_list_dropped() {
        let mut document = doc(json!({
            "required": ["a", "a"],
            "properties": { "a": { "readOnly": true } }
        }));
        let parent = parent();
        assert!(prune_read_only(&mut document, Some(&parent), &parent.property("a")));
        assert!(document.value()["s"].get("required").is_none());
    }

    #[test]
    fn test_read_only_reached_through_reference() {
        let mut document = doc(json!({
            "required": ["at", "id"],
            "properties": {
                "at": { "$ref": "#/components/schemas/Stamp" },
                "id": { "$ref": "#/components/schemas/Plain", "readOnly": true }
            }
        }));
        let parent = parent();
        let at = parent.property("at").through_ref(
            SchemaPath::from_pointer("/components/schemas/Stamp"),
            "#/components/schemas/Stamp".into(),
        );
        let id = parent.property("id").through_ref(
            SchemaPath::from_pointer("/components/schemas/Plain"),
            "#/components/schemas/Plain".into(),
        );
        assert!(prune_read_only(&mut document, Some(&parent), &at));
        assert!(prune_read_only(&mut document, Some(&parent), &id));
        assert!(document.value()["s"].get("required").is_none());
    }

    #[test]
    fn test_non_property_nodes_are_ignored() {
        let mut document = doc(json!({
            "required": ["0"],
            "allOf": [{ "readOnly": true }]
        }));
        let parent = parent();
        assert!(!prune_read_only(&mut document, Some(&parent), &parent.member("allOf", 0)));
        assert!(!prune_read_only(&mut document, None, &parent));
        assert_eq!(document.value()["s"]["required"], json!(["0"]));
    }
}
