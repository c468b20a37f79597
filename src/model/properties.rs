// Ordered bag of raw JSON values that carries every field a typed envelope does not know

use crate::core::errors::ModelError;
use crate::model::endpoint::parse_port;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unknown fields of an envelope, kept verbatim
///
/// Known fields are moved out with the `take*` methods when decoding and put
/// back with the `set*` methods when encoding. A JSON `null` is treated as an
/// absent field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdditionalProperties(Map<String, Value>);

impl AdditionalProperties {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Remove `key` and decode it as `T`
    pub fn take<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, ModelError> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ModelError::InvalidField {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Remove `key` and decode it as a port given either as number or numeric string
    pub fn take_port(&mut self, key: &str) -> Result<Option<u16>, ModelError> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => parse_port(&value).map(Some),
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), ModelError> {
        let value = serde_json::to_value(value).map_err(|e| ModelError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    pub fn set_non_empty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.0.insert(key.to_string(), Value::from(value));
        }
    }

    pub fn set_non_zero(&mut self, key: &str, value: u16) {
        if value != 0 {
            self.0.insert(key.to_string(), Value::from(value));
        }
    }

    pub fn set_non_empty_list<T: Serialize>(
        &mut self,
        key: &str,
        values: &[T],
    ) -> Result<(), ModelError> {
        if values.is_empty() {
            return Ok(());
        }
        self.set(key, &values)
    }
}

impl From<Map<String, Value>> for AdditionalProperties {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<AdditionalProperties> for Map<String, Value> {
    fn from(properties: AdditionalProperties) -> Self {
        properties.0
    }
}
