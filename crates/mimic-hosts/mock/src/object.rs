//! Host objects.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use mimic_core::{HostCallError, HostResult, Object, Value};

#[derive(Debug, Clone)]
enum Accessor {
    Constant(Value),
    /// Reads a field, so it reflects writes made through `set_field`.
    Field(String),
}

/// A dynamically shaped host object.
///
/// Fields are writable through [`Object::set_field`]; accessors are fixed at
/// construction, except getters that read a field.
pub struct MockObject {
    type_name: String,
    fields: RwLock<BTreeMap<String, Value>>,
    accessors: BTreeMap<String, Accessor>,
}

impl MockObject {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RwLock::new(BTreeMap::new()),
            accessors: BTreeMap::new(),
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.get_mut().insert(name.into(), value.into());
        self
    }

    /// Adds an accessor returning a fixed value.
    pub fn with_accessor(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.accessors
            .insert(name.into(), Accessor::Constant(value.into()));
        self
    }

    /// Adds an accessor that reads `field`.
    pub fn with_getter(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.accessors.insert(name.into(), Accessor::Field(field.into()));
        self
    }

    /// Reads a field, falling back to [`Value::Null`].
    pub fn get(&self, name: &str) -> Value {
        self.fields.read().get(name).cloned().unwrap_or_default()
    }

    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl Object for MockObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    fn call(&self, accessor: &str) -> Option<Value> {
        match self.accessors.get(accessor)? {
            Accessor::Constant(value) => Some(value.clone()),
            Accessor::Field(field) => self.field(field),
        }
    }

    fn set_field(&self, name: &str, value: Value) -> bool {
        match self.fields.write().get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl fmt::Debug for MockObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockObject")
            .field("type_name", &self.type_name)
            .field("fields", &*self.fields.read())
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Borrows a host call receiver or argument as a [`MockObject`].
pub(crate) fn receiver(value: &Value) -> HostResult<&MockObject> {
    value.downcast_ref::<MockObject>().ok_or_else(|| {
        HostCallError::new(format!("expected a host object, got {}", value.type_key()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getter_follows_field_writes() {
        let event = MockObject::new("host.Event")
            .with_field("cancelled", false)
            .with_getter("isCancelled", "cancelled")
            .with_accessor("getName", "event");

        assert_eq!(event.call("isCancelled"), Some(Value::Bool(false)));
        assert!(event.set_field("cancelled", Value::Bool(true)));
        assert_eq!(event.call("isCancelled"), Some(Value::Bool(true)));
        assert_eq!(event.call("getName"), Some(Value::from("event")));
    }

    #[test]
    fn test_unknown_names() {
        let object = MockObject::new("host.Thing");
        assert_eq!(object.field("missing"), None);
        assert_eq!(object.call("missing"), None);
        assert!(!object.set_field("missing", Value::Null));
        assert!(object.get("missing").is_null());
    }

    #[test]
    fn test_receiver_rejects_primitives() {
        assert!(receiver(&Value::Int(1)).is_err());
        assert!(receiver(&MockObject::new("host.Thing").into_value()).is_ok());
    }
}
