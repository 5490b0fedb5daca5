//! Locating optional host types by name.
//!
//! A host runtime may or may not ship a given type, and its shape differs
//! between versions. The [`TypeResolver`] is the only place where the
//! framework asks "is this there?"; everything downstream holds the resolved
//! handles instead of probing again.

use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeInitError, HostResult};
use crate::foundation::value::Value;

/// A static host function (constructor, factory, enum lookup, serializer).
pub type HostFunction = Arc<dyn Fn(&[Value]) -> HostResult<Value> + Send + Sync>;

/// A host instance method. The first argument is the receiver.
pub type HostMethod = Arc<dyn Fn(&Value, &[Value]) -> HostResult<Value> + Send + Sync>;

/// A host type that was found at runtime.
pub trait HostType: Send + Sync {
    /// Fully qualified type name.
    fn name(&self) -> &str;

    /// Looks up a static function by name.
    fn function(&self, name: &str) -> Option<HostFunction>;

    /// Looks up an instance method by name.
    fn method(&self, name: &str) -> Option<HostMethod>;

    /// Looks up a static constant by name.
    fn constant(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl fmt::Debug for dyn HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostType").field(&self.name()).finish()
    }
}

/// Resolves host types by fully qualified name, tolerating absence.
pub trait TypeResolver: Send + Sync {
    /// Short identifier of the host platform (e.g. `"mock"`).
    fn platform(&self) -> &str;

    /// Resolves a single type. Returns `None` when the host does not have it.
    fn resolve(&self, name: &str) -> Option<Arc<dyn HostType>>;

    /// Resolves the first loadable type among `candidates`, in order.
    fn resolve_first(&self, candidates: &[String]) -> Option<Arc<dyn HostType>> {
        candidates.iter().find_map(|name| self.resolve(name))
    }
}

/// Returns a required function or a [`BridgeInitError::FunctionNotFound`].
pub fn require_function(ty: &dyn HostType, name: &str) -> Result<HostFunction, BridgeInitError> {
    ty.function(name)
        .ok_or_else(|| BridgeInitError::FunctionNotFound {
            type_name: ty.name().to_owned(),
            function: name.to_owned(),
        })
}

/// Returns a required method or a [`BridgeInitError::MethodNotFound`].
pub fn require_method(ty: &dyn HostType, name: &str) -> Result<HostMethod, BridgeInitError> {
    ty.method(name).ok_or_else(|| BridgeInitError::MethodNotFound {
        type_name: ty.name().to_owned(),
        method: name.to_owned(),
    })
}

/// Returns a required constant or a [`BridgeInitError::ConstantNotFound`].
pub fn require_constant(ty: &dyn HostType, name: &str) -> Result<Value, BridgeInitError> {
    ty.constant(name)
        .ok_or_else(|| BridgeInitError::ConstantNotFound {
            type_name: ty.name().to_owned(),
            constant: name.to_owned(),
        })
}
