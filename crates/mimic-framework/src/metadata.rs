//! Typed metadata attached to long-lived objects.
//!
//! A [`MetadataKey<V>`] is a namespaced [`Key`] tagged with the value type it
//! stores, so the same `namespace:value` may hold one value per type. Values
//! are either fixed or produced by a supplier on every read.
//!
//! ```rust,ignore
//! let joins = MetadataKey::<u32>::parse("greeter:joins")?;
//! mimic.metadata().set(&joins, 0);
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use mimic_core::{Key, ValueResult};
use parking_lot::RwLock;

/// A namespaced key for values of type `V`.
///
/// Parsing a key without a namespace places it in
/// [`Key::DEFAULT_NAMESPACE`].
pub struct MetadataKey<V> {
    key: Key,
    _value: PhantomData<fn() -> V>,
}

impl<V: 'static> MetadataKey<V> {
    pub fn new(namespace: &str, value: &str) -> ValueResult<Self> {
        Key::new(namespace, value).map(Self::from_key)
    }

    /// Parses `namespace:value` or a bare `value`.
    pub fn parse(key: &str) -> ValueResult<Self> {
        key.parse().map(Self::from_key)
    }

    pub fn from_key(key: Key) -> Self {
        Self {
            key,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Name of the value type.
    pub fn value_type(&self) -> &'static str {
        type_name::<V>()
    }

    fn slot(&self) -> (Key, TypeId) {
        (self.key.clone(), TypeId::of::<V>())
    }
}

impl<V> Clone for MetadataKey<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> PartialEq for MetadataKey<V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<V> Eq for MetadataKey<V> {}

impl<V> Hash for MetadataKey<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<V: 'static> fmt::Debug for MetadataKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.key, self.value_type())
    }
}

impl<V> fmt::Display for MetadataKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

// =============================================================================
// Metadata
// =============================================================================

type Supplier<V> = Arc<dyn Fn() -> V + Send + Sync>;

/// A thread-safe store of typed metadata values.
#[derive(Default)]
pub struct Metadata {
    /// Each value is a boxed `Supplier<V>` for the `TypeId` in its slot.
    entries: RwLock<HashMap<(Key, TypeId), Box<dyn Any + Send + Sync>>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value under `key`. Dynamic values are computed on
    /// every call.
    pub fn get<V: 'static>(&self, key: &MetadataKey<V>) -> Option<V> {
        let supplier = self
            .entries
            .read()
            .get(&key.slot())
            .and_then(|entry| entry.downcast_ref::<Supplier<V>>())
            .cloned()?;
        // Outside the lock so suppliers may read other metadata.
        Some(supplier())
    }

    pub fn set<V>(&self, key: &MetadataKey<V>, value: V)
    where
        V: Clone + Send + Sync + 'static,
    {
        self.set_dynamic(key, move || value.clone());
    }

    /// Stores a supplier that produces the value on each [`get`](Self::get).
    pub fn set_dynamic<V, F>(&self, key: &MetadataKey<V>, supplier: F)
    where
        V: 'static,
        F: Fn() -> V + Send + Sync + 'static,
    {
        let supplier: Supplier<V> = Arc::new(supplier);
        self.entries.write().insert(key.slot(), Box::new(supplier));
    }

    /// Removes the value under `key`. Returns `false` if there was none.
    pub fn remove<V: 'static>(&self, key: &MetadataKey<V>) -> bool {
        self.entries.write().remove(&key.slot()).is_some()
    }

    pub fn contains<V: 'static>(&self, key: &MetadataKey<V>) -> bool {
        self.entries.read().contains_key(&key.slot())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("entries", &self.len())
            .finish()
    }
}

/// An object that carries [`Metadata`].
pub trait MetadataHolder {
    fn metadata(&self) -> &Metadata;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_key_parsing() {
        let key = MetadataKey::<String>::parse("mimic:greeting").unwrap();
        assert_eq!(key.key().namespace(), "mimic");
        assert_eq!(key.to_string(), "mimic:greeting");

        let bare = MetadataKey::<bool>::parse("muted").unwrap();
        assert_eq!(bare.key().namespace(), Key::DEFAULT_NAMESPACE);
        assert_eq!(bare, MetadataKey::new("minecraft", "muted").unwrap());
        assert!(format!("{bare:?}").starts_with("minecraft:muted<bool"));
    }

    #[test]
    fn test_invalid_keys_are_rejected() {
        for key in ["", "!", "!:test", "Mimic:test", "mimic:Test", "a/b:testing"] {
            assert!(MetadataKey::<String>::parse(key).is_err(), "{key}");
        }
        assert!(MetadataKey::<String>::new("mimic", "").is_err());
        assert!(MetadataKey::<String>::new("", "test").is_err());
    }

    #[test]
    fn test_set_get_remove() {
        let metadata = Metadata::new();
        let owner = MetadataKey::<Uuid>::parse("mimic:owner").unwrap();
        let id = Uuid::new_v4();

        assert_eq!(metadata.get(&owner), None);
        metadata.set(&owner, id);
        assert_eq!(metadata.get(&owner), Some(id));
        assert!(metadata.remove(&owner));
        assert!(!metadata.remove(&owner));
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_same_key_different_types() {
        let metadata = Metadata::new();
        let text = MetadataKey::<String>::parse("mimic:level").unwrap();
        let number = MetadataKey::<i32>::parse("mimic:level").unwrap();

        metadata.set(&text, "high".to_string());
        metadata.set(&number, 3);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get(&text).as_deref(), Some("high"));
        assert_eq!(metadata.get(&number), Some(3));
    }

    #[test]
    fn test_dynamic_value_is_computed_per_read() {
        let metadata = Metadata::new();
        let key = MetadataKey::<u32>::parse("mimic:reads").unwrap();
        let counter = Arc::new(AtomicU32::new(0));
        let reads = Arc::clone(&counter);
        metadata.set_dynamic(&key, move || reads.fetch_add(1, Ordering::SeqCst) + 1);

        assert_eq!(metadata.get(&key), Some(1));
        assert_eq!(metadata.get(&key), Some(2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
