use serde_json::{Map, Value};

use super::{Content, MANAGED_TAG};

/// JSON object content with path-addressed mutation.
///
/// Intermediate objects are created on demand; setting through a
/// non-object value replaces it with an object.
#[derive(Debug, Clone)]
pub struct JsonContent {
    data: Value,
}

impl Default for JsonContent {
    fn default() -> Self {
        Self {
            data: Value::Object(Map::new()),
        }
    }
}

impl JsonContent {
    /// Empty JSON object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value at a key path, creating intermediate objects as needed.
    /// An empty path replaces the root.
    pub fn set(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            self.data = value;
            return;
        };
        let mut node = &mut self.data;
        for part in parents {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else { return };
            node = map
                .entry((*part).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            map.insert((*last).to_string(), value);
        }
    }

    /// Embed the managed-file tag under the `_tag` key.
    pub fn tag(&mut self) {
        self.set(&["_tag"], Value::String(MANAGED_TAG.to_string()));
    }

    /// The current root value.
    pub fn value(&self) -> &Value {
        &self.data
    }
}

impl Content for JsonContent {
    fn to_bytes(&self) -> Vec<u8> {
        self.data.to_string().into_bytes()
    }
}
