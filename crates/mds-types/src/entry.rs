use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::key::MetadataKey;

/// One key/value pair in the store.
///
/// Field names match the persisted columns and the HTTP wire format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub my_key: MetadataKey,
    pub my_value: Value,
}

impl MetadataEntry {
    pub fn new(my_key: MetadataKey, my_value: Value) -> Self {
        Self { my_key, my_value }
    }

    pub fn key(&self) -> &MetadataKey {
        &self.my_key
    }

    pub fn value(&self) -> &Value {
        &self.my_value
    }
}

/// The top-level fields of a partial update.
///
/// Always a JSON object: scalar or array bodies are rejected at the boundary
/// before a `PartialDocument` is built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialDocument(Map<String, Value>);

impl PartialDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for PartialDocument {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl<'a> IntoIterator for &'a PartialDocument {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
