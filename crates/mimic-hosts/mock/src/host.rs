//! The simulated host runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use mimic_core::{
    Component, GameMode, HostType, Object, RegistrationError, TransformError, TypeKey,
    TypeResolver, User, Value,
};
use mimic_framework::{Disconnector, FnTransformer, TransformerRegistry};

use crate::adventure::adventure_types;
use crate::events::{CRAFT_PLAYER, GAME_MODE, PLAYER, REGISTERED_SERVER};

/// Platform name reported by [`MockHost`].
pub const PLATFORM: &str = "mock";

/// A [`TypeResolver`] over an in-memory set of host types.
///
/// The default host ships the presentation family under `adventure.`; use
/// [`MockHost::shaded`] for a host that relocated it, and
/// [`MockHost::without_type`] to simulate a host version that lacks a type.
///
/// Users removed through [`Disconnector`] are recorded and can be read back
/// with [`MockHost::disconnected`].
pub struct MockHost {
    platform: String,
    types: HashMap<String, Arc<dyn HostType>>,
    disconnected: Mutex<Vec<(Uuid, Component)>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::with_prefix("adventure")
    }

    /// A host with the presentation family under `shaded.adventure.`.
    pub fn shaded() -> Self {
        Self::with_prefix("shaded.adventure")
    }

    fn with_prefix(prefix: &str) -> Self {
        let types = adventure_types(prefix)
            .into_iter()
            .map(|ty| {
                let ty: Arc<dyn HostType> = Arc::new(ty);
                (ty.name().to_owned(), ty)
            })
            .collect();
        Self {
            platform: PLATFORM.to_owned(),
            types,
            disconnected: Mutex::new(Vec::new()),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Adds or replaces a type.
    pub fn with_type(mut self, ty: impl HostType + 'static) -> Self {
        self.types.insert(ty.name().to_owned(), Arc::new(ty));
        self
    }

    /// Removes a type, as if this host version did not ship it.
    pub fn without_type(mut self, name: &str) -> Self {
        self.types.remove(name);
        self
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Users disconnected so far, with the reason they were shown.
    pub fn disconnected(&self) -> Vec<(Uuid, Component)> {
        self.disconnected.lock().clone()
    }

    /// Declares the host's type lineage and registers its transformers.
    pub fn install(registry: &TransformerRegistry) -> Result<(), RegistrationError> {
        registry.declare_subtype(CRAFT_PLAYER, PLAYER);
        registry.register(player_to_user())?;
        registry.register(game_mode_to_canonical())?;
        registry.register(server_to_name())?;
        debug!(platform = PLATFORM, "Installed host transformers");
        Ok(())
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeResolver for MockHost {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn resolve(&self, name: &str) -> Option<Arc<dyn HostType>> {
        self.types.get(name).cloned()
    }
}

impl Disconnector for MockHost {
    fn disconnect(&self, user: &User, reason: &Component) {
        debug!(user = user.name(), reason = %reason.plain_text(), "Disconnecting user");
        self.disconnected.lock().push((user.id(), reason.clone()));
    }
}

impl fmt::Debug for MockHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHost")
            .field("platform", &self.platform)
            .field("types", &self.types.len())
            .finish()
    }
}

// =============================================================================
// Transformers
// =============================================================================

fn read_str(object: &dyn Object, accessor: &str) -> Option<String> {
    object.call(accessor)?.as_str().map(str::to_owned)
}

fn failure(value: &Value, to: &TypeKey, reason: &str) -> TransformError {
    TransformError::failed(value.type_key(), to.clone(), reason)
}

/// Host player to canonical [`User`], keeping the player as native handle.
pub fn player_to_user() -> Arc<FnTransformer> {
    FnTransformer::new(PLAYER, User::TYPE, |value| {
        let object = value
            .as_object()
            .ok_or_else(|| failure(&value, &User::TYPE, "not a player object"))?;
        let id = read_str(object.as_ref(), "getUniqueId")
            .and_then(|raw| Uuid::parse_str(&raw).ok())
            .ok_or_else(|| failure(&value, &User::TYPE, "missing or malformed unique id"))?;
        let name = read_str(object.as_ref(), "getName")
            .ok_or_else(|| failure(&value, &User::TYPE, "missing name"))?;
        Ok(Value::object(
            User::new(id, name).with_native(Arc::clone(object)),
        ))
    })
}

/// Host game mode constant to canonical [`GameMode`].
pub fn game_mode_to_canonical() -> Arc<FnTransformer> {
    FnTransformer::new(GAME_MODE, GameMode::TYPE, |value| {
        value
            .as_object()
            .and_then(|object| read_str(object.as_ref(), "name"))
            .and_then(|name| GameMode::from_name(&name))
            .map(Value::object)
            .ok_or_else(|| failure(&value, &GameMode::TYPE, "unknown game mode"))
    })
}

/// Proxy server handle to its name.
pub fn server_to_name() -> Arc<FnTransformer> {
    FnTransformer::new(REGISTERED_SERVER, TypeKey::STRING, |value| {
        value
            .as_object()
            .and_then(|object| read_str(object.as_ref(), "getName"))
            .map(Value::Str)
            .ok_or_else(|| failure(&value, &TypeKey::STRING, "server has no name"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use mimic_core::{
        Book, BossBar, BossBarColor, BossBarFlag, BossBarOverlay, Bridge, BridgeConfig,
        BridgeError, BridgeInitError, BridgedType, Component, Key, MappingError, NamedColor,
        Sound, SoundSource, SoundStop, Title, TitlePart, TitleTimes,
    };
    use mimic_framework::{
        CanonicalEvent, EventTranslator, Mapper, ProxyUserConnectedEvent,
        ProxyUserServerConnectedEvent, ServerUserGameModeChangeEvent, ServerUserKickEvent,
        UserChatEvent, UserConnectEvent,
    };
    use std::time::Duration;

    fn bridge(host: MockHost) -> Arc<Bridge> {
        Arc::new(Bridge::new(Arc::new(host), BridgeConfig::default()))
    }

    fn translator(bridge: &Arc<Bridge>) -> EventTranslator {
        let registry = Arc::new(TransformerRegistry::new());
        MockHost::install(&registry).unwrap();
        registry.register_bridge(bridge).unwrap();
        EventTranslator::with_defaults(Mapper::new(registry)).unwrap()
    }

    fn round_trip<T>(bridge: &Bridge, value: &T) -> T
    where
        T: mimic_core::Bridged,
    {
        let native = bridge.to_host(value).unwrap();
        bridge.from_host(&native).unwrap()
    }

    // -------------------------------------------------------------------------
    // Bridge
    // -------------------------------------------------------------------------

    #[test]
    fn test_bridge_loads_on_full_host() {
        let bridge = bridge(MockHost::new());
        bridge.load().unwrap();
        assert_eq!(
            bridge.host_type(BridgedType::BossBarColor).unwrap(),
            "adventure.bossbar.BossBar$Color"
        );
    }

    #[test]
    fn test_presentation_round_trips() {
        let bridge = bridge(MockHost::new());

        let key = Key::minecraft("entity.player.levelup").unwrap();
        assert_eq!(round_trip(&*bridge, &key), key);

        let text = Component::text("Hello ")
            .color(NamedColor::Gold)
            .bold(true)
            .append(Component::text("world"));
        assert_eq!(round_trip(&*bridge, &text), text);

        let title = Title::new("Welcome", "to the server").with_times(TitleTimes::new(
            Duration::from_millis(500),
            Duration::from_secs(3),
            Duration::from_secs(1),
        ));
        assert_eq!(round_trip(&*bridge, &title), title);
        let plain = Title::new("Hi", "");
        assert_eq!(round_trip(&*bridge, &plain), plain);

        let bar = BossBar::new("Raid", 0.25, BossBarColor::Red, BossBarOverlay::Notched10)
            .unwrap()
            .flag(BossBarFlag::DarkenScreen)
            .flag(BossBarFlag::PlayBossMusic);
        assert_eq!(round_trip(&*bridge, &bar), bar);

        let sound = Sound::new(key.clone(), SoundSource::Player, 0.5, 1.5);
        assert_eq!(round_trip(&*bridge, &sound), sound);

        for stop in [
            SoundStop::all(),
            SoundStop::named(key.clone()),
            SoundStop::source(SoundSource::Music),
            SoundStop::named_on_source(key.clone(), SoundSource::Ambient),
        ] {
            assert_eq!(round_trip(&*bridge, &stop), stop);
        }

        let book = Book::new("Rules", "Admin", vec![]).page("Be nice").page("Have fun");
        assert_eq!(round_trip(&*bridge, &book), book);

        for part in TitlePart::ALL {
            assert_eq!(round_trip(&*bridge, part), *part);
        }
    }

    #[test]
    fn test_shaded_host_uses_second_candidate() {
        let bridge = bridge(MockHost::shaded());
        assert_eq!(
            bridge.host_type(BridgedType::Key).unwrap(),
            "shaded.adventure.key.Key"
        );
        let key = Key::minecraft("stone").unwrap();
        assert_eq!(round_trip(&*bridge, &key), key);
    }

    #[test]
    fn test_missing_type_fails_dependents_only() {
        let bridge = bridge(MockHost::new().without_type("adventure.key.Key"));

        let err = bridge.to_host(&Key::minecraft("stone").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Init(BridgeInitError::TypeNotFound {
                bridged: BridgedType::Key,
                ..
            })
        ));
        assert!(matches!(
            bridge.host_type(BridgedType::Sound).unwrap_err(),
            BridgeError::Init(BridgeInitError::Dependency { .. })
        ));
        assert!(bridge.is_available(BridgedType::Component));
        assert!(bridge.is_available(BridgedType::Book));
    }

    #[test]
    fn test_missing_function_is_reported() {
        let crippled = crate::adventure::MockType::new("adventure.inventory.Book");
        let bridge = bridge(MockHost::new().with_type(crippled));
        assert_eq!(
            bridge.host_type(BridgedType::Book).unwrap_err(),
            BridgeError::Init(BridgeInitError::FunctionNotFound {
                type_name: "adventure.inventory.Book".into(),
                function: "book".into(),
            })
        );
    }

    #[test]
    fn test_bridge_transformers_registered() {
        let bridge = bridge(MockHost::new().without_type("adventure.sound.Sound"));
        let registry = TransformerRegistry::new();
        // Sound and SoundStop are unavailable.
        assert_eq!(registry.register_bridge(&bridge).unwrap(), 6);
        assert_eq!(registry.len(), 12);
    }

    // -------------------------------------------------------------------------
    // Translation
    // -------------------------------------------------------------------------

    fn steve() -> (Uuid, Value) {
        let id = Uuid::new_v4();
        (id, events::player(id, "Steve"))
    }

    #[test]
    fn test_translate_chat_and_reconcile() {
        let bridge = bridge(MockHost::new());
        let translator = translator(&bridge);
        let (id, player) = steve();
        let native = events::chat(&player, "hello");

        let mut event = translator.translate(native.as_ref()).unwrap().unwrap();
        let chat = event.downcast_ref::<UserChatEvent>().unwrap();
        assert_eq!(chat.message(), "hello");
        assert_eq!(chat.user().id(), id);
        assert_eq!(chat.user().name(), "Steve");
        assert!(chat.user().native().is_some());
        assert!(!event.is_cancelled());

        event.set_cancelled(true);
        assert!(translator.reconcile(native.as_ref(), &event));
        assert_eq!(native.call("isCancelled"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_translate_login_is_cancellable() {
        let translator = translator(&bridge(MockHost::new()));
        let (_, player) = steve();
        let native = events::login(&player);

        let event = translator.translate(native.as_ref()).unwrap().unwrap();
        assert!(matches!(event, CanonicalEvent::UserConnect(_)));
        let connect = event.downcast_ref::<UserConnectEvent>().unwrap();
        assert_eq!(connect.cancel_reason().plain_text(), "Disconnected");
    }

    #[test]
    fn test_disconnect_records_reason() {
        let host = MockHost::new();
        let user = User::new(uuid::Uuid::new_v4(), "Steve");
        host.disconnect(&user, &Component::text("Server full"));

        let disconnected = host.disconnected();
        assert_eq!(disconnected.len(), 1);
        assert_eq!(disconnected[0].0, user.id());
        assert_eq!(disconnected[0].1.plain_text(), "Server full");
    }

    #[test]
    fn test_translate_kick_reason() {
        let bridge = bridge(MockHost::new());
        let translator = translator(&bridge);
        let (_, player) = steve();

        let reason = bridge.to_host(&Component::text("Flying is not enabled")).unwrap();
        let event = translator
            .translate(events::kick(&player, Some(reason)).as_ref())
            .unwrap()
            .unwrap();
        let kick = event.downcast_ref::<ServerUserKickEvent>().unwrap();
        assert_eq!(kick.reason().plain_text(), "Flying is not enabled");

        let event = translator
            .translate(events::kick(&player, None).as_ref())
            .unwrap()
            .unwrap();
        let kick = event.downcast_ref::<ServerUserKickEvent>().unwrap();
        assert_eq!(kick.reason().plain_text(), "Disconnected");
    }

    #[test]
    fn test_translate_game_mode_change() {
        let translator = translator(&bridge(MockHost::new()));
        let (_, player) = steve();
        let event = translator
            .translate(events::game_mode_change(&player, "CREATIVE").as_ref())
            .unwrap()
            .unwrap();
        let change = event.downcast_ref::<ServerUserGameModeChangeEvent>().unwrap();
        assert_eq!(change.new_game_mode(), GameMode::Creative);
    }

    #[test]
    fn test_translate_proxy_events() {
        let translator = translator(&bridge(MockHost::new()));
        let (_, player) = steve();

        let event = translator
            .translate(events::server_post_connect(&player, "lobby").as_ref())
            .unwrap()
            .unwrap();
        let connected = event.downcast_ref::<ProxyUserConnectedEvent>().unwrap();
        assert_eq!(connected.server(), "lobby");

        let event = translator
            .translate(events::server_connected(&player, "survival", Some("lobby")).as_ref())
            .unwrap()
            .unwrap();
        let switched = event.downcast_ref::<ProxyUserServerConnectedEvent>().unwrap();
        assert_eq!(switched.server(), "survival");
        assert_eq!(switched.previous_server(), Some("lobby"));

        let event = translator
            .translate(events::server_connected(&player, "survival", None).as_ref())
            .unwrap()
            .unwrap();
        let first = event.downcast_ref::<ProxyUserServerConnectedEvent>().unwrap();
        assert_eq!(first.previous_server(), None);
    }

    #[test]
    fn test_untranslatable_and_unmappable_events() {
        let translator = translator(&bridge(MockHost::new()));
        let unknown = crate::MockObject::new("org.bukkit.event.block.BlockBreakEvent");
        assert!(translator.translate(&unknown).unwrap().is_none());

        let broken = crate::MockObject::new(events::CHAT).with_field("message", "hi");
        let err = translator.translate(&broken).unwrap_err();
        assert!(matches!(err, MappingError::MissingField { field: "user", .. }));
    }
}
