//! Type-directed value transformers.
//!
//! A [`Transformer`] converts a value of one runtime type into another, for
//! example a host player object into a canonical [`User`](mimic_core::User).
//! The [`TransformerRegistry`] picks the transformer for a requested target
//! type:
//!
//! 1. A value that already satisfies the target is returned unchanged
//! 2. Otherwise the first registered transformer whose input accepts the
//!    value's type and whose output satisfies the target wins
//! 3. Otherwise the call fails with [`TransformError::NoTransformer`]
//!
//! "Accepts" and "satisfies" follow the [`TypeHierarchy`] declared by the host
//! at startup, so a transformer registered for `host.Player` also handles a
//! `host.ConnectedPlayer`.
//!
//! ```rust,ignore
//! let registry = TransformerRegistry::new();
//! registry.declare_subtype("host.ConnectedPlayer", "host.Player");
//! registry.register(FnTransformer::new("host.Player", User::TYPE, player_to_user))?;
//!
//! let user = registry.transform(native_player, &User::TYPE)?;
//! ```

use std::borrow::Cow;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use mimic_core::{
    Book, BossBar, Bridge, BridgeResult, Bridged, Canonical, Component, FromValue, Key,
    RegistrationError, Sound, SoundStop, Title, TitleTimes, TransformError, TransformResult,
    TypeKey, Value,
};

// =============================================================================
// Transformer
// =============================================================================

/// Converts values of [`from_type`](Self::from_type) into
/// [`to_type`](Self::to_type).
pub trait Transformer: Send + Sync {
    /// Input type this transformer accepts (and its subtypes).
    fn from_type(&self) -> &TypeKey;

    /// Output type this transformer produces.
    fn to_type(&self) -> &TypeKey;

    /// Converts a value.
    fn transform(&self, value: Value) -> TransformResult<Value>;

    /// Converts a value with free-form parameters from the mapping.
    ///
    /// Transformers that take no parameters ignore `data`.
    fn transform_with_data(&self, value: Value, data: &[&str]) -> TransformResult<Value> {
        let _ = data;
        self.transform(value)
    }

    /// Name used in logs and registration errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

type TransformFn = dyn Fn(Value, &[&str]) -> TransformResult<Value> + Send + Sync;

/// A transformer backed by a closure.
pub struct FnTransformer {
    from: TypeKey,
    to: TypeKey,
    name: Cow<'static, str>,
    f: Box<TransformFn>,
}

impl FnTransformer {
    /// Creates a transformer from a closure that ignores mapping parameters.
    pub fn new<F>(from: impl Into<TypeKey>, to: impl Into<TypeKey>, f: F) -> Arc<Self>
    where
        F: Fn(Value) -> TransformResult<Value> + Send + Sync + 'static,
    {
        Self::with_data(from, to, move |value, _| f(value))
    }

    /// Creates a transformer from a closure that receives mapping parameters.
    pub fn with_data<F>(from: impl Into<TypeKey>, to: impl Into<TypeKey>, f: F) -> Arc<Self>
    where
        F: Fn(Value, &[&str]) -> TransformResult<Value> + Send + Sync + 'static,
    {
        Arc::new(Self::build(from.into(), to.into(), Box::new(f)))
    }

    fn build(from: TypeKey, to: TypeKey, f: Box<TransformFn>) -> Self {
        let name = Cow::Owned(format!("{from} -> {to}"));
        Self { from, to, name, f }
    }
}

impl Transformer for FnTransformer {
    fn from_type(&self) -> &TypeKey {
        &self.from
    }

    fn to_type(&self) -> &TypeKey {
        &self.to
    }

    fn transform(&self, value: Value) -> TransformResult<Value> {
        (self.f)(value, &[])
    }

    fn transform_with_data(&self, value: Value, data: &[&str]) -> TransformResult<Value> {
        (self.f)(value, data)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FnTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Bridge Transformers
// =============================================================================

/// Direction of a [`BridgeTransformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeDirection {
    /// Host copy to canonical copy.
    ToCanonical,
    /// Canonical copy to host copy.
    ToHost,
}

/// Exposes a bridged presentation type as a registry transformer.
///
/// This lets mapped event fields carry presentation values: a field declared
/// with `transform = "mimic.Component"` receives the canonical component built
/// from the host's copy.
pub struct BridgeTransformer<T> {
    bridge: Arc<Bridge>,
    direction: BridgeDirection,
    from: TypeKey,
    to: TypeKey,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BridgeTransformer<T>
where
    T: Bridged + Canonical + FromValue + Clone,
{
    /// Creates a transformer in the given direction.
    ///
    /// Fails when the host has no counterpart for `T`.
    pub fn new(bridge: Arc<Bridge>, direction: BridgeDirection) -> BridgeResult<Arc<Self>> {
        let host = bridge.host_type_key(T::BRIDGED)?;
        let (from, to) = match direction {
            BridgeDirection::ToCanonical => (host, T::TYPE),
            BridgeDirection::ToHost => (T::TYPE, host),
        };
        let name = format!("bridge {} ({from} -> {to})", T::BRIDGED);
        Ok(Arc::new(Self {
            bridge,
            direction,
            from,
            to,
            name,
            _marker: PhantomData,
        }))
    }

    /// Creates both directions at once.
    pub fn pair(bridge: &Arc<Bridge>) -> BridgeResult<[Arc<Self>; 2]> {
        Ok([
            Self::new(Arc::clone(bridge), BridgeDirection::ToCanonical)?,
            Self::new(Arc::clone(bridge), BridgeDirection::ToHost)?,
        ])
    }
}

impl<T> Transformer for BridgeTransformer<T>
where
    T: Bridged + Canonical + FromValue + Clone,
{
    fn from_type(&self) -> &TypeKey {
        &self.from
    }

    fn to_type(&self) -> &TypeKey {
        &self.to
    }

    fn transform(&self, value: Value) -> TransformResult<Value> {
        let failed =
            |reason: String| TransformError::failed(self.from.clone(), self.to.clone(), reason);
        match self.direction {
            BridgeDirection::ToCanonical => T::from_host(&value, &self.bridge)
                .map(Value::object)
                .map_err(|err| failed(err.to_string())),
            BridgeDirection::ToHost => {
                let canonical = T::from_value(value).map_err(|err| failed(err.to_string()))?;
                canonical
                    .to_host(&self.bridge)
                    .map_err(|err| failed(err.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// Type Hierarchy
// =============================================================================

/// Declared subtype relations between runtime type names.
///
/// Every type is a subtype of itself and of [`TypeKey::ANY`].
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    parents: HashMap<TypeKey, Vec<TypeKey>>,
}

impl TypeHierarchy {
    /// Creates an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `sub` as a direct subtype of `sup`.
    pub fn declare(&mut self, sub: impl Into<TypeKey>, sup: impl Into<TypeKey>) {
        let parents = self.parents.entry(sub.into()).or_default();
        let sup = sup.into();
        if !parents.contains(&sup) {
            parents.push(sup);
        }
    }

    /// Returns `true` if a value of type `sub` may be used where `sup` is
    /// expected.
    pub fn is_subtype(&self, sub: &TypeKey, sup: &TypeKey) -> bool {
        if sub == sup || *sup == TypeKey::ANY {
            return true;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sub]);
        while let Some(current) = queue.pop_front() {
            for parent in self.parents.get(current).into_iter().flatten() {
                if parent == sup {
                    return true;
                }
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        false
    }

    /// Returns `true` if `value` satisfies `to`.
    ///
    /// Null only satisfies [`TypeKey::NULL`] and [`TypeKey::ANY`].
    pub fn satisfies(&self, value: &Value, to: &TypeKey) -> bool {
        match value {
            Value::Null => *to == TypeKey::NULL || *to == TypeKey::ANY,
            other => self.is_subtype(&other.type_key(), to),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered set of transformers plus the host's type hierarchy.
///
/// Registration happens at startup. Lookups are concurrent and never hold a
/// lock while transformer code runs, so a transformer may call back into the
/// registry (for example to convert a nested value).
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: RwLock<Vec<Arc<dyn Transformer>>>,
    hierarchy: RwLock<TypeHierarchy>,
}

impl TransformerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transformer.
    ///
    /// Registering the identical instance twice is an error; two distinct
    /// transformers for the same pair are allowed and the first one wins.
    pub fn register(&self, transformer: Arc<dyn Transformer>) -> Result<(), RegistrationError> {
        let mut transformers = self.transformers.write();
        if transformers
            .iter()
            .any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&transformer)))
        {
            return Err(RegistrationError::DuplicateTransformer {
                name: transformer.name().to_owned(),
            });
        }
        debug!(
            transformer = transformer.name(),
            from = %transformer.from_type(),
            to = %transformer.to_type(),
            "Registered transformer"
        );
        transformers.push(transformer);
        Ok(())
    }

    /// Registers both directions of every presentation type the bridge can
    /// serve on this host. Returns the number of types registered.
    ///
    /// Types the host lacks are skipped; the bridge has already logged why.
    pub fn register_bridge(&self, bridge: &Arc<Bridge>) -> Result<usize, RegistrationError> {
        let registered = [
            self.register_bridged::<Component>(bridge)?,
            self.register_bridged::<Key>(bridge)?,
            self.register_bridged::<Title>(bridge)?,
            self.register_bridged::<TitleTimes>(bridge)?,
            self.register_bridged::<BossBar>(bridge)?,
            self.register_bridged::<Sound>(bridge)?,
            self.register_bridged::<SoundStop>(bridge)?,
            self.register_bridged::<Book>(bridge)?,
        ];
        Ok(registered.into_iter().filter(|ok| *ok).count())
    }

    fn register_bridged<T>(&self, bridge: &Arc<Bridge>) -> Result<bool, RegistrationError>
    where
        T: Bridged + Canonical + FromValue + Clone + 'static,
    {
        match BridgeTransformer::<T>::pair(bridge) {
            Ok(pair) => {
                for transformer in pair {
                    self.register(transformer)?;
                }
                Ok(true)
            }
            Err(err) => {
                debug!(bridged = %T::BRIDGED, error = %err, "Skipping bridge transformers");
                Ok(false)
            }
        }
    }

    /// Declares `sub` as a direct subtype of `sup`.
    pub fn declare_subtype(&self, sub: impl Into<TypeKey>, sup: impl Into<TypeKey>) {
        self.hierarchy.write().declare(sub, sup);
    }

    /// Returns `true` if `sub` may be used where `sup` is expected.
    pub fn is_subtype(&self, sub: &TypeKey, sup: &TypeKey) -> bool {
        self.hierarchy.read().is_subtype(sub, sup)
    }

    /// Returns the transformer that would handle `from -> to`.
    pub fn find(&self, from: &TypeKey, to: &TypeKey) -> Option<Arc<dyn Transformer>> {
        let transformers = self.transformers.read();
        let hierarchy = self.hierarchy.read();
        transformers
            .iter()
            .find(|t| {
                hierarchy.is_subtype(from, t.from_type()) && hierarchy.is_subtype(t.to_type(), to)
            })
            .cloned()
    }

    /// Converts `value` into a value satisfying `to`.
    pub fn transform(&self, value: Value, to: &TypeKey) -> TransformResult<Value> {
        self.transform_with_data(value, to, &[])
    }

    /// Converts `value` into a value satisfying `to`, passing mapping
    /// parameters to the transformer.
    pub fn transform_with_data(
        &self,
        value: Value,
        to: &TypeKey,
        data: &[&str],
    ) -> TransformResult<Value> {
        if self.hierarchy.read().satisfies(&value, to) {
            return Ok(value);
        }

        let from = value.type_key();
        let transformer = self
            .find(&from, to)
            .ok_or_else(|| TransformError::NoTransformer {
                from: from.clone(),
                to: to.clone(),
            })?;

        trace!(transformer = transformer.name(), from = %from, to = %to, "Transforming value");
        let output = transformer.transform_with_data(value, data)?;

        if !self.hierarchy.read().satisfies(&output, to) {
            return Err(TransformError::UnexpectedOutput {
                to: to.clone(),
                got: output.type_key(),
            });
        }
        Ok(output)
    }

    /// Returns the number of registered transformers.
    pub fn len(&self) -> usize {
        self.transformers.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.transformers.read().is_empty()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("transformer_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::{Object, User};
    use uuid::Uuid;

    #[derive(Debug)]
    struct NativePlayer {
        ty: &'static str,
        name: &'static str,
    }

    impl Object for NativePlayer {
        fn type_name(&self) -> &str {
            self.ty
        }

        fn call(&self, accessor: &str) -> Option<Value> {
            (accessor == "getName").then(|| Value::from(self.name))
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
            self
        }
    }

    fn player(ty: &'static str, name: &'static str) -> Value {
        Value::Object(Arc::new(NativePlayer { ty, name }))
    }

    fn player_to_user(prefix: &'static str) -> Arc<FnTransformer> {
        FnTransformer::new("host.Player", User::TYPE, move |value| {
            let name = value
                .as_object()
                .and_then(|obj| obj.call("getName"))
                .and_then(|name| name.as_str().map(str::to_owned))
                .unwrap_or_default();
            Ok(Value::object(User::new(Uuid::nil(), format!("{prefix}{name}"))))
        })
    }

    fn user_name(value: &Value) -> &str {
        value.downcast_ref::<User>().map(User::name).unwrap_or("")
    }

    #[test]
    fn test_identity_shortcut_ignores_registry() {
        let registry = TransformerRegistry::new();
        let out = registry.transform(Value::from("hello"), &TypeKey::STRING).unwrap();
        assert_eq!(out, Value::from("hello"));

        registry
            .register(FnTransformer::new(TypeKey::STRING, TypeKey::STRING, |_| {
                Ok(Value::from("rewritten"))
            }))
            .unwrap();
        let out = registry.transform(Value::from("hello"), &TypeKey::STRING).unwrap();
        assert_eq!(out, Value::from("hello"));

        let any = registry.transform(Value::Int(3), &TypeKey::ANY).unwrap();
        assert_eq!(any, Value::Int(3));
    }

    #[test]
    fn test_registered_pair_produces_target_type() {
        let registry = TransformerRegistry::new();
        registry.register(player_to_user("")).unwrap();

        let out = registry
            .transform(player("host.Player", "Alex"), &User::TYPE)
            .unwrap();
        assert_eq!(out.type_key(), User::TYPE);
        assert_eq!(user_name(&out), "Alex");
    }

    #[test]
    fn test_unregistered_pair_fails() {
        let registry = TransformerRegistry::new();
        registry.register(player_to_user("")).unwrap();

        let err = registry.transform(Value::Int(1), &User::TYPE).unwrap_err();
        assert_eq!(
            err,
            TransformError::NoTransformer {
                from: TypeKey::INT,
                to: User::TYPE,
            }
        );
        assert!(registry.transform(Value::Null, &User::TYPE).is_err());
    }

    #[test]
    fn test_first_registered_match_wins() {
        let registry = TransformerRegistry::new();
        registry.register(player_to_user("first:")).unwrap();
        registry.register(player_to_user("second:")).unwrap();

        let out = registry
            .transform(player("host.Player", "Alex"), &User::TYPE)
            .unwrap();
        assert_eq!(user_name(&out), "first:Alex");
    }

    #[test]
    fn test_subtype_input_is_accepted() {
        let registry = TransformerRegistry::new();
        registry.register(player_to_user("")).unwrap();

        assert!(registry.transform(player("host.ProxiedPlayer", "Alex"), &User::TYPE).is_err());

        registry.declare_subtype("host.ProxiedPlayer", "host.ConnectedPlayer");
        registry.declare_subtype("host.ConnectedPlayer", "host.Player");
        let out = registry
            .transform(player("host.ProxiedPlayer", "Alex"), &User::TYPE)
            .unwrap();
        assert_eq!(user_name(&out), "Alex");
    }

    #[test]
    fn test_duplicate_instance_is_rejected() {
        let registry = TransformerRegistry::new();
        let transformer: Arc<dyn Transformer> = player_to_user("");
        registry.register(Arc::clone(&transformer)).unwrap();
        assert!(matches!(
            registry.register(transformer),
            Err(RegistrationError::DuplicateTransformer { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unexpected_output_is_reported() {
        let registry = TransformerRegistry::new();
        registry
            .register(FnTransformer::new(TypeKey::INT, TypeKey::STRING, |_| Ok(Value::Null)))
            .unwrap();
        let err = registry.transform(Value::Int(1), &TypeKey::STRING).unwrap_err();
        assert_eq!(
            err,
            TransformError::UnexpectedOutput {
                to: TypeKey::STRING,
                got: TypeKey::NULL,
            }
        );
    }

    #[test]
    fn test_data_reaches_transformer() {
        let registry = TransformerRegistry::new();
        registry
            .register(FnTransformer::with_data(TypeKey::INT, TypeKey::STRING, |value, data| {
                let n = value.as_int().unwrap_or_default();
                Ok(Value::from(format!("{}{n}", data.first().copied().unwrap_or(""))))
            }))
            .unwrap();
        let out = registry
            .transform_with_data(Value::Int(7), &TypeKey::STRING, &["#"])
            .unwrap();
        assert_eq!(out, Value::from("#7"));
    }

    #[test]
    fn test_transformer_may_reenter_registry() {
        let registry = Arc::new(TransformerRegistry::new());
        registry
            .register(FnTransformer::new(TypeKey::BOOL, TypeKey::INT, |value| {
                Ok(Value::Int(i64::from(value.as_bool().unwrap_or_default())))
            }))
            .unwrap();
        let inner = Arc::clone(&registry);
        registry
            .register(FnTransformer::new(TypeKey::STRING, TypeKey::INT, move |value| {
                let flag = Value::Bool(value.as_str() == Some("yes"));
                inner.transform(flag, &TypeKey::INT)
            }))
            .unwrap();
        let out = registry.transform(Value::from("yes"), &TypeKey::INT).unwrap();
        assert_eq!(out, Value::Int(1));
    }
}
