//! Shallow merge of a partial document into a stored document.
//!
//! Only top-level fields are combined:
//! - Fields present in both take the partial document's value.
//! - Fields present only in the stored document are kept unchanged.
//! - Fields present only in the partial document are added.
//!
//! Nested objects are replaced wholesale, never merged recursively.

use mds_types::{MetadataKey, PartialDocument};
use serde_json::{Map, Value};

use crate::error::{MetadataError, MetadataResult};

/// Interpret a stored document as a field map.
///
/// Merging is only defined for objects; any other stored document is a
/// storage-level failure for `key`.
pub fn into_object(key: &MetadataKey, document: Value) -> MetadataResult<Map<String, Value>> {
    match document {
        Value::Object(fields) => Ok(fields),
        other => Err(MetadataError::Storage(format!(
            "stored value for {key} is a JSON {}, not an object; cannot merge",
            json_kind(&other)
        ))),
    }
}

/// Overwrite or add every field of `partial` in `existing`.
pub fn shallow_merge(existing: &mut Map<String, Value>, partial: &PartialDocument) {
    for (field, value) in partial {
        existing.insert(field.clone(), value.clone());
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
