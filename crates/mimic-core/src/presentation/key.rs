//! Namespaced identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A `namespace:value` identifier, e.g. `minecraft:entity.player.levelup`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    namespace: String,
    value: String,
}

impl Key {
    /// Namespace assumed when a key is parsed without one.
    pub const DEFAULT_NAMESPACE: &'static str = "minecraft";

    /// Creates a key, validating both parts.
    pub fn new(namespace: impl Into<String>, value: impl Into<String>) -> Result<Self, ValueError> {
        let namespace = namespace.into();
        let value = value.into();
        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(ValueError::invalid("key", format!("bad namespace '{namespace}'")));
        }
        if value.is_empty() || !value.chars().all(|c| is_namespace_char(c) || c == '/') {
            return Err(ValueError::invalid("key", format!("bad value '{value}'")));
        }
        Ok(Self { namespace, value })
    }

    /// Creates a key in the default namespace.
    pub fn minecraft(value: impl Into<String>) -> Result<Self, ValueError> {
        Self::new(Self::DEFAULT_NAMESPACE, value)
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

crate::canonical_object!(Key, "mimic.Key");
crate::from_object_value!(Key, "key");

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.value)
    }
}

impl FromStr for Key {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, value)) => Self::new(namespace, value),
            None => Self::minecraft(s),
        }
    }
}

impl TryFrom<String> for Key {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}
