//! Plugin-to-plugin events.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// An event raised by a plugin, carrying a JSON payload.
///
/// Custom events never come from the host, so they have no mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    name: String,
    payload: serde_json::Value,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Serializes `data` as the payload.
    pub fn with_data<T: Serialize>(name: impl Into<String>, data: &T) -> serde_json::Result<Self> {
        Ok(Self::new(name, serde_json::to_value(data)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut serde_json::Value {
        &mut self.payload
    }

    /// Deserializes the payload.
    pub fn data<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.payload)
    }
}
