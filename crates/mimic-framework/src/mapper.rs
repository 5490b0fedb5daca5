//! Declarative mapping from host-native objects to canonical objects.
//!
//! The [`Mapper`] walks a [`MappingSpec`] field by field. For each field it
//! tries the declared source names against the host object, field-like names
//! first and accessor-like names second, and hands the first hit to the
//! [`TransformerRegistry`] when the field declares a transform.
//!
//! The [`EventTranslator`] sits on top: it routes a host-native event to the
//! canonical event type that lists the native's type name, and writes the
//! cancellation flag back once dispatch is over.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use mimic_core::{
    Mapped, MappedFields, MappingError, MappingResult, MappingSpec, Object, RegistrationError,
    SourceName, Value,
};

use crate::event::{
    CanonicalEvent, EventVariant, ProxyUserConnectedEvent, ProxyUserServerConnectedEvent,
    ServerUserGameModeChangeEvent, ServerUserKickEvent, UserChatEvent, UserConnectEvent,
    UserDisconnectEvent,
};
use crate::transform::TransformerRegistry;

// =============================================================================
// Mapper
// =============================================================================

/// Builds canonical objects out of host objects.
#[derive(Clone)]
pub struct Mapper {
    registry: Arc<TransformerRegistry>,
}

impl Mapper {
    /// Creates a mapper backed by `registry`.
    pub fn new(registry: Arc<TransformerRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the transformer registry.
    pub fn registry(&self) -> &Arc<TransformerRegistry> {
        &self.registry
    }

    /// Resolves every field of `spec` against `source`.
    ///
    /// A platform-specific field that cannot be found, or is found null,
    /// resolves to [`Value::Null`]; any other missing field fails the whole
    /// mapping. A null required field still goes through its transform.
    pub fn resolve(&self, source: &dyn Object, spec: &MappingSpec) -> MappingResult<MappedFields> {
        let mut fields = MappedFields::new();

        for field in &spec.fields {
            let Some(raw) = field.lookup_order().find_map(|name| lookup(source, name)) else {
                if field.platform_specific {
                    trace!(
                        mapped = spec.target,
                        field = field.name,
                        "Platform-specific field absent"
                    );
                    fields.insert(field.name, Value::Null);
                    continue;
                }
                return Err(MappingError::MissingField {
                    field: field.name,
                    aliases: field.aliases.to_vec(),
                });
            };

            let value = match &field.transform {
                Some(_) if raw.is_null() && field.platform_specific => raw,
                Some(transform) => self
                    .registry
                    .transform_with_data(raw, &transform.to, transform.data)
                    .map_err(|source| MappingError::Transform {
                        field: field.name,
                        source,
                    })?,
                _ => raw,
            };
            fields.insert(field.name, value);
        }

        Ok(fields)
    }

    /// Builds a `T` from `source`.
    pub fn map<T: Mapped>(&self, source: &dyn Object) -> MappingResult<T> {
        T::from_fields(self.resolve(source, T::mapping_spec())?)
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("registry", &self.registry)
            .finish()
    }
}

fn lookup(source: &dyn Object, name: &SourceName) -> Option<Value> {
    match name {
        SourceName::Field(field) => source.field(field),
        SourceName::Accessor(accessor) => source.call(accessor),
    }
}

// =============================================================================
// Event Translator
// =============================================================================

type Construct = fn(&Mapper, &dyn Object) -> MappingResult<CanonicalEvent>;

fn construct<T: Mapped + EventVariant>(
    mapper: &Mapper,
    native: &dyn Object,
) -> MappingResult<CanonicalEvent> {
    mapper.map::<T>(native).map(EventVariant::into_event)
}

struct Route {
    spec: &'static MappingSpec,
    construct: Construct,
}

/// Routes host-native events to canonical events by native type name.
pub struct EventTranslator {
    mapper: Mapper,
    routes: RwLock<HashMap<&'static str, Arc<Route>>>,
    targets: RwLock<HashSet<&'static str>>,
}

impl EventTranslator {
    /// Creates an empty translator.
    pub fn new(mapper: Mapper) -> Self {
        Self {
            mapper,
            routes: RwLock::new(HashMap::new()),
            targets: RwLock::new(HashSet::new()),
        }
    }

    /// Creates a translator with every host-raised canonical event registered.
    pub fn with_defaults(mapper: Mapper) -> Result<Self, RegistrationError> {
        let translator = Self::new(mapper);
        translator.register::<UserConnectEvent>()?;
        translator.register::<UserChatEvent>()?;
        translator.register::<UserDisconnectEvent>()?;
        translator.register::<ServerUserKickEvent>()?;
        translator.register::<ServerUserGameModeChangeEvent>()?;
        translator.register::<ProxyUserConnectedEvent>()?;
        translator.register::<ProxyUserServerConnectedEvent>()?;
        Ok(translator)
    }

    /// Returns the mapper.
    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// Registers a canonical event under each of its native type names.
    ///
    /// A native name already claimed by another event keeps its first owner.
    pub fn register<T: Mapped + EventVariant>(&self) -> Result<(), RegistrationError> {
        let spec = T::mapping_spec();
        if !self.targets.write().insert(spec.target) {
            return Err(RegistrationError::DuplicateEvent {
                target: spec.target,
            });
        }

        let route = Arc::new(Route {
            spec,
            construct: construct::<T>,
        });
        let mut routes = self.routes.write();
        for native in spec.natives {
            if let Some(existing) = routes.get(native) {
                warn!(
                    native = *native,
                    event = spec.target,
                    owner = existing.spec.target,
                    "Native event already routed, keeping first registration"
                );
                continue;
            }
            routes.insert(*native, Arc::clone(&route));
        }
        debug!(event = spec.target, natives = spec.natives.len(), "Registered event mapping");
        Ok(())
    }

    /// Returns `true` if events of the native type are translated.
    pub fn handles(&self, native_type: &str) -> bool {
        self.routes.read().contains_key(native_type)
    }

    fn route(&self, native_type: &str) -> Option<Arc<Route>> {
        self.routes.read().get(native_type).cloned()
    }

    /// Builds the canonical event for `native`.
    ///
    /// Returns `Ok(None)` when no canonical event lists the native's type.
    pub fn translate(&self, native: &dyn Object) -> MappingResult<Option<CanonicalEvent>> {
        let Some(route) = self.route(native.type_name()) else {
            return Ok(None);
        };
        (route.construct)(&self.mapper, native).map(Some)
    }

    /// Writes the event's cancellation flag back into `native`.
    ///
    /// The flag goes to the first field-like source of the `cancelled`
    /// mapping. Returns `false` when the event is not cancellable or the host
    /// object has nowhere to write it.
    pub fn reconcile(&self, native: &dyn Object, event: &CanonicalEvent) -> bool {
        if event.as_cancellable().is_none() {
            return false;
        }
        let Some(route) = self.route(native.type_name()) else {
            return false;
        };
        let Some(field) = route
            .spec
            .get("cancelled")
            .and_then(|spec| spec.sources.iter().find(|source| source.is_field()))
        else {
            return false;
        };
        native.set_field(field.name(), Value::Bool(event.is_cancelled()))
    }
}

impl fmt::Debug for EventTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTranslator")
            .field("events", &self.targets.read().len())
            .field("natives", &self.routes.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::FnTransformer;
    use mimic_core::{FieldSpec, TransformError, TransformSpec, TypeKey, User};
    use parking_lot::Mutex;
    use uuid::Uuid;

    const CHAT: &str = "org.bukkit.event.player.AsyncPlayerChatEvent";

    /// A host object with fields and accessors.
    #[derive(Default)]
    struct Native {
        ty: &'static str,
        fields: Mutex<HashMap<&'static str, Value>>,
        accessors: HashMap<&'static str, Value>,
    }

    impl Native {
        fn new(ty: &'static str) -> Self {
            Self {
                ty,
                ..Self::default()
            }
        }

        fn with_field(self, name: &'static str, value: impl Into<Value>) -> Self {
            self.fields.lock().insert(name, value.into());
            self
        }

        fn with_accessor(mut self, name: &'static str, value: impl Into<Value>) -> Self {
            self.accessors.insert(name, value.into());
            self
        }
    }

    impl Object for Native {
        fn type_name(&self) -> &str {
            self.ty
        }

        fn field(&self, name: &str) -> Option<Value> {
            self.fields.lock().get(name).cloned()
        }

        fn call(&self, accessor: &str) -> Option<Value> {
            self.accessors.get(accessor).cloned()
        }

        fn set_field(&self, name: &str, value: Value) -> bool {
            match self.fields.lock().get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            }
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
            self
        }
    }

    fn registry() -> Arc<TransformerRegistry> {
        let registry = Arc::new(TransformerRegistry::new());
        registry
            .register(FnTransformer::new("host.Player", User::TYPE, |value| {
                let name = value
                    .as_object()
                    .and_then(|player| player.call("getName"))
                    .and_then(|name| name.as_str().map(str::to_owned))
                    .unwrap_or_default();
                Ok(Value::object(User::new(Uuid::nil(), name)))
            }))
            .unwrap();
        registry
    }

    fn player(name: &'static str) -> Value {
        Value::Object(Arc::new(Native::new("host.Player").with_accessor("getName", name)))
    }

    fn chat(message: &'static str) -> Native {
        Native::new(CHAT)
            .with_accessor("getPlayer", player("Alex"))
            .with_field("message", message)
            .with_field("cancelled", false)
    }

    #[test]
    fn test_fields_are_tried_before_accessors() {
        let spec =
            MappingSpec::new("Sample").field(FieldSpec::new("value", &["getValue()", "value"]));
        let source = Native::new("host.Sample")
            .with_accessor("getValue", "from accessor")
            .with_field("value", "from field");
        let mapper = Mapper::new(registry());

        let fields = mapper.resolve(&source, &spec).unwrap();
        assert_eq!(fields.get("value"), Some(&Value::from("from field")));

        let accessor_only = Native::new("host.Sample").with_accessor("getValue", "from accessor");
        let fields = mapper.resolve(&accessor_only, &spec).unwrap();
        assert_eq!(fields.get("value"), Some(&Value::from("from accessor")));
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let mapper = Mapper::new(registry());
        let source = chat("hello");
        let spec = UserChatEvent::mapping_spec();
        let first = mapper.resolve(&source, spec).unwrap();
        let second = mapper.resolve(&source, spec).unwrap();
        assert_eq!(first.get("message"), second.get("message"));
        assert_eq!(first.get("cancelled"), second.get("cancelled"));
        assert_eq!(
            first.get("user").and_then(|u| u.downcast_ref::<User>()),
            second.get("user").and_then(|u| u.downcast_ref::<User>()),
        );
    }

    #[test]
    fn test_missing_required_field_lists_aliases() {
        let mapper = Mapper::new(registry());
        let source = Native::new(CHAT).with_accessor("getPlayer", player("Alex"));
        let err = mapper.map::<UserChatEvent>(&source).unwrap_err();
        assert_eq!(
            err,
            MappingError::MissingField {
                field: "message",
                aliases: vec!["message", "getMessage()"],
            }
        );
    }

    #[test]
    fn test_platform_specific_field_may_be_absent() {
        let mapper = Mapper::new(registry());
        let source = Native::new(CHAT)
            .with_accessor("getPlayer", player("Alex"))
            .with_field("message", "hi");
        let event = mapper.map::<UserChatEvent>(&source).unwrap();
        assert!(!crate::event::Cancellable::is_cancelled(&event));
        assert_eq!(event.user().name(), "Alex");
    }

    #[test]
    fn test_transform_failure_names_the_field() {
        let mapper = Mapper::new(registry());
        let source = Native::new(CHAT)
            .with_accessor("getPlayer", 42)
            .with_field("message", "hi");
        let err = mapper.map::<UserChatEvent>(&source).unwrap_err();
        assert!(matches!(
            err,
            MappingError::Transform { field: "user", .. }
        ));
    }

    #[test]
    fn test_null_required_field_is_transformed() {
        let mapper = Mapper::new(registry());
        let source = Native::new(CHAT)
            .with_accessor("getPlayer", Value::Null)
            .with_field("message", "hi");
        let err = mapper.map::<UserChatEvent>(&source).unwrap_err();
        assert_eq!(
            err,
            MappingError::Transform {
                field: "user",
                source: TransformError::NoTransformer {
                    from: TypeKey::NULL,
                    to: User::TYPE,
                },
            }
        );
    }

    #[test]
    fn test_null_platform_specific_field_skips_transform() {
        let mapper = Mapper::new(registry());
        let previous = FieldSpec::new("previous", &["getPreviousServer()"])
            .platform_specific()
            .transform(TransformSpec::new(TypeKey::STRING));
        let spec = MappingSpec::new("Sample").field(previous);
        let source = Native::new("host.Sample").with_accessor("getPreviousServer", Value::Null);
        let fields = mapper.resolve(&source, &spec).unwrap();
        assert_eq!(fields.get("previous"), Some(&Value::Null));
    }

    #[test]
    fn test_translate_routes_by_native_type() {
        let translator = EventTranslator::with_defaults(Mapper::new(registry())).unwrap();
        assert!(translator.handles(CHAT));

        let event = translator.translate(&chat("hello")).unwrap().unwrap();
        let chat_event = event.downcast_ref::<UserChatEvent>().unwrap();
        assert_eq!(chat_event.message(), "hello");

        let unknown = Native::new("host.SomethingElse");
        assert!(translator.translate(&unknown).unwrap().is_none());
    }

    #[test]
    fn test_defaults_cover_every_host_event() {
        let translator = EventTranslator::with_defaults(Mapper::new(registry())).unwrap();
        for spec in [
            UserConnectEvent::mapping_spec(),
            UserChatEvent::mapping_spec(),
            UserDisconnectEvent::mapping_spec(),
            ServerUserKickEvent::mapping_spec(),
            ServerUserGameModeChangeEvent::mapping_spec(),
            ProxyUserConnectedEvent::mapping_spec(),
            ProxyUserServerConnectedEvent::mapping_spec(),
        ] {
            assert!(!spec.natives.is_empty(), "{} has no natives", spec.target);
            assert!(spec.natives.iter().all(|native| translator.handles(native)));
        }
        assert_eq!(
            translator.register::<UserChatEvent>(),
            Err(RegistrationError::DuplicateEvent {
                target: "UserChatEvent"
            })
        );
    }

    #[test]
    fn test_duplicate_event_registration() {
        let translator = EventTranslator::new(Mapper::new(registry()));
        translator.register::<UserChatEvent>().unwrap();
        assert_eq!(
            translator.register::<UserChatEvent>(),
            Err(RegistrationError::DuplicateEvent {
                target: "UserChatEvent"
            })
        );
    }

    #[test]
    fn test_reconcile_writes_cancellation_back() {
        let translator = EventTranslator::with_defaults(Mapper::new(registry())).unwrap();
        let native = chat("spam");
        let mut event = translator.translate(&native).unwrap().unwrap();
        event.set_cancelled(true);

        assert!(translator.reconcile(&native, &event));
        assert_eq!(Object::field(&native, "cancelled"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_identity_transform_keeps_strings() {
        let mapper = Mapper::new(registry());
        let server = FieldSpec::new("server", &["server"])
            .transform(TransformSpec::new(TypeKey::STRING));
        let spec = MappingSpec::new("Sample").field(server);
        let source = Native::new("host.Sample").with_field("server", "lobby");
        let fields = mapper.resolve(&source, &spec).unwrap();
        assert_eq!(fields.get("server"), Some(&Value::from("lobby")));
    }
}
