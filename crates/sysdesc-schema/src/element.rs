use crate::value::{AttributeMap, Value};
use serde::{Deserialize, Serialize};

/// One configuration record of a scope, e.g. a single service or repository.
///
/// `name` identifies the element within its scope; every other field of the
/// serialized record lands in the attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    name: String,
    #[serde(flatten)]
    attributes: AttributeMap,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeMap::new(),
        }
    }

    /// Builder-style attribute setter. Setting `name` is ignored.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "name" {
            self.attributes.insert(key, value.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Convenience accessor for string attributes.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}
