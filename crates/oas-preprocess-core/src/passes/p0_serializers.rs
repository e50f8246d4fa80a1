//! Pass 0: Serializer tagging (response side)
//!
//! Response payloads are built by application code, which may hand back
//! date objects where the schema says `string`. A `date`/`date-time` string
//! schema is widened to accept `["object", "string"]` and tagged with the
//! serializer that turns such a value back into its ISO wire form.

use serde_json::{json, Value};

use crate::document::ApiDocument;
use crate::schema_utils::SchemaPath;
use crate::serializers::{DateFormat, SerializerTag, SERIALIZER_KEYWORD};

/// Tag the schema at `path` if it is a date-like string.
///
/// Returns `true` when the schema was rewritten. Running it again on a
/// tagged schema is a no-op: the `type` is no longer the plain `"string"`.
pub fn tag_date_formats(document: &mut ApiDocument, path: &SchemaPath) -> bool {
    let Some(Value::Object(schema)) = document.get_mut(path) else {
        return false;
    };
    if schema.get("type").and_then(Value::as_str) != Some("string") {
        return false;
    }
    let Some(format) = schema
        .get("format")
        .and_then(Value::as_str)
        .and_then(DateFormat::from_format)
    else {
        return false;
    };

    schema.insert("type".to_string(), json!(["object", "string"]));
    schema.insert(
        SERIALIZER_KEYWORD.to_string(),
        SerializerTag::new(format).to_value(),
    );
    true
}
