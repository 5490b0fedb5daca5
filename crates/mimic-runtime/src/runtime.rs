//! The Mimic service object.
//!
//! A [`Mimic`] owns one of everything the engine needs: the transformer
//! registry, the presentation bridge, the native event translator, the event
//! bus and the scheduler. Host glue builds one at startup and forwards every
//! native event to [`Mimic::handle_native_event`].
//!
//! ```rust,ignore
//! use mimic_runtime::Mimic;
//!
//! let mimic = Mimic::builder(resolver)
//!     .data_dir("plugins/mimic")
//!     .transformers(MyHost::install)
//!     .build()?;
//!
//! mimic.bus().on::<UserChatEvent, _>(|chat| {
//!     chat.set_message(chat.message().to_uppercase());
//!     Ok(())
//! });
//!
//! // In the host's event hook:
//! mimic.handle_native_event(native.as_ref());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{Level, debug, info, span, trace, warn};

use mimic_core::{Bridge, Object, RegistrationError, TypeResolver};
use mimic_framework::{
    Cancellable, CanonicalEvent, Disconnector, EventBus, EventTranslator, Extension,
    ExtensionContext, ExtensionMap, Extensions, Listener, Mapper, Metadata, MetadataHolder,
    ScheduledHandle, Scheduler, SchedulerBackend, Task, TransformerRegistry, UserConnectEvent,
};

use crate::config::{ConfigLoader, MimicConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::scheduler::TokioScheduler;

type Installer = Box<dyn FnOnce(&TransformerRegistry) -> Result<(), RegistrationError>>;

/// One framework instance bound to one host.
pub struct Mimic {
    config: MimicConfig,
    registry: Arc<TransformerRegistry>,
    bridge: Arc<Bridge>,
    translator: Arc<EventTranslator>,
    bus: EventBus,
    scheduler: Scheduler,
    /// Present when the runtime created the backend itself.
    tokio_scheduler: Option<Arc<TokioScheduler>>,
    disconnector: Option<Arc<dyn Disconnector>>,
    extensions: Extensions,
    metadata: Metadata,
}

impl Mimic {
    /// Starts building an instance for the host behind `resolver`.
    pub fn builder(resolver: Arc<dyn TypeResolver>) -> MimicBuilder {
        MimicBuilder::new(resolver)
    }

    pub fn config(&self) -> &MimicConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TransformerRegistry> {
        &self.registry
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    pub fn translator(&self) -> &Arc<EventTranslator> {
        &self.translator
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Host platform name, as reported by the resolver.
    pub fn platform(&self) -> &str {
        self.bridge.platform()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the loaded extension of type `E`.
    pub fn extension<E: Extension>(&self) -> Option<Arc<E>> {
        self.extensions.get::<E>()
    }

    /// Loads an extension into the running instance. Its required
    /// dependencies must already be loaded. Returns the loaded instance,
    /// which is the earlier one if `E` was loaded before.
    pub fn load_extension<E: Extension>(&self, extension: E) -> RuntimeResult<Arc<E>> {
        let ctx = ExtensionContext::new(
            &self.bus,
            &self.registry,
            &self.scheduler,
            &self.metadata,
            self.platform(),
        );
        Ok(self.extensions.load(extension, &ctx)?)
    }

    /// Registers a listener on the bus.
    pub fn register_listener(&self, listener: Arc<dyn Listener>) -> bool {
        self.bus.register_listener(listener)
    }

    /// Submits a task to the scheduler.
    pub fn schedule(&self, task: &Arc<Task>) -> RuntimeResult<Arc<dyn ScheduledHandle>> {
        Ok(self.scheduler.schedule(task)?)
    }

    /// Dispatches an event that did not come from the host, such as a
    /// [`CustomEvent`](mimic_framework::CustomEvent).
    pub fn post(&self, event: impl Into<CanonicalEvent>) -> CanonicalEvent {
        self.bus.dispatch(event.into())
    }

    /// Translates a host-native event, dispatches it and writes the
    /// cancellation flag back into `native`. A cancelled
    /// [`UserConnectEvent`] also disconnects the user with its cancel reason.
    ///
    /// Returns the dispatched event, or `None` when the native type is not
    /// translated or mapping failed. Mapping failures are logged, never
    /// raised into the host.
    pub fn handle_native_event(&self, native: &dyn Object) -> Option<CanonicalEvent> {
        let span = span!(Level::DEBUG, "native_event", native = native.type_name());
        let _enter = span.enter();

        let event = match self.translator.translate(native) {
            Ok(Some(event)) => event,
            Ok(None) => {
                trace!("Native event not translated");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "Failed to map native event");
                return None;
            }
        };

        let event = self.bus.dispatch(event);
        if self.translator.reconcile(native, &event) {
            trace!(cancelled = event.is_cancelled(), "Reconciled native event");
        }
        if let Some(connect) = event.downcast_ref::<UserConnectEvent>() {
            if connect.is_cancelled() {
                self.refuse(connect);
            }
        }
        Some(event)
    }

    fn refuse(&self, connect: &UserConnectEvent) {
        let reason = connect.cancel_reason();
        match &self.disconnector {
            Some(disconnector) => {
                debug!(
                    user = connect.user().name(),
                    reason = %reason.plain_text(),
                    "Refusing connection"
                );
                disconnector.disconnect(connect.user(), &reason);
            }
            None => warn!(
                user = connect.user().name(),
                reason = %reason.plain_text(),
                "Connection refused without a disconnector, reason not delivered"
            ),
        }
    }

    /// Stops the scheduler created by the builder. Handlers stay registered.
    pub fn shutdown(&self) {
        if let Some(scheduler) = &self.tokio_scheduler {
            scheduler.shutdown();
        }
        info!(platform = self.platform(), "Mimic stopped");
    }
}

impl MetadataHolder for Mimic {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl fmt::Debug for Mimic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mimic")
            .field("platform", &self.platform())
            .field("registry", &self.registry)
            .field("translator", &self.translator)
            .field("bus", &self.bus)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// MimicBuilder
// =============================================================================

/// Builder for [`Mimic`].
///
/// Configuration comes from a [`ConfigLoader`] unless an explicit
/// [`MimicConfig`] is given. Without an explicit scheduler backend, a
/// [`TokioScheduler`] is created on the current tokio runtime.
pub struct MimicBuilder {
    resolver: Arc<dyn TypeResolver>,
    config_loader: ConfigLoader,
    data_dir: Option<PathBuf>,
    config: Option<MimicConfig>,
    backend: Option<Arc<dyn SchedulerBackend>>,
    disconnector: Option<Arc<dyn Disconnector>>,
    installers: Vec<Installer>,
    extensions: ExtensionMap,
    init_logging: bool,
}

impl MimicBuilder {
    pub fn new(resolver: Arc<dyn TypeResolver>) -> Self {
        Self {
            resolver,
            config_loader: ConfigLoader::new(),
            data_dir: None,
            config: None,
            backend: None,
            disconnector: None,
            installers: Vec::new(),
            extensions: ExtensionMap::new(),
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Activates the `mimic.{profile}.toml` overlay in the data directory.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// The plugin's data directory. `mimic.toml` is read from here and
    /// relative log file paths are resolved against it.
    pub fn data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config_loader = self.config_loader.data_dir(&dir);
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Uses `config` as is, skipping file and environment loading.
    pub fn config(mut self, config: MimicConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses `backend` instead of a [`TokioScheduler`].
    pub fn scheduler(mut self, backend: Arc<dyn SchedulerBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the host hook that removes users whose connection was refused.
    pub fn disconnector(mut self, disconnector: Arc<dyn Disconnector>) -> Self {
        self.disconnector = Some(disconnector);
        self
    }

    /// Adds host transformers and type lineage. Installers run in order,
    /// before the bridge transformers are registered.
    pub fn transformers<F>(mut self, install: F) -> Self
    where
        F: FnOnce(&TransformerRegistry) -> Result<(), RegistrationError> + 'static,
    {
        self.installers.push(Box::new(install));
        self
    }

    /// Adds an extension, loaded in dependency order once the instance is
    /// built.
    pub fn extension<E: Extension>(mut self, extension: E) -> Self {
        self.extensions.insert(extension);
        self
    }

    /// Whether to install the global tracing subscriber from the logging
    /// config (default: true).
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    pub fn build(self) -> RuntimeResult<Mimic> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging, self.data_dir.as_deref());
        }

        let registry = Arc::new(TransformerRegistry::new());
        for install in self.installers {
            install(&registry)?;
        }

        let bridge = Arc::new(Bridge::new(self.resolver, config.bridge.clone()));
        let bridged = registry.register_bridge(&bridge)?;
        if bridged == 0 {
            warn!(
                platform = bridge.platform(),
                "No presentation types could be bridged on this host"
            );
        }

        let translator = Arc::new(EventTranslator::with_defaults(Mapper::new(Arc::clone(
            &registry,
        )))?);

        let bus = match config.dispatch.slow_handler_warning() {
            Some(threshold) => EventBus::with_slow_handler_warning(threshold),
            None => EventBus::new(),
        };

        let (scheduler, tokio_scheduler) = match self.backend {
            Some(backend) => (Scheduler::new(backend), None),
            None => {
                let backend = Arc::new(TokioScheduler::new(config.scheduler.sync_queue_capacity)?);
                debug!("Using tokio scheduler backend");
                (Scheduler::new(backend.clone()), Some(backend))
            }
        };

        let metadata = Metadata::new();
        let ctx = ExtensionContext::new(&bus, &registry, &scheduler, &metadata, bridge.platform());
        let extensions = match self.extensions.load_all(&ctx) {
            Ok(extensions) => extensions,
            Err(err) => {
                if let Some(backend) = &tokio_scheduler {
                    backend.shutdown();
                }
                return Err(err.into());
            }
        };

        info!(
            platform = bridge.platform(),
            transformers = registry.len(),
            bridged,
            extensions = extensions.len(),
            "Mimic started"
        );

        Ok(Mimic {
            config,
            registry,
            bridge,
            translator,
            bus,
            scheduler,
            tokio_scheduler,
            disconnector: self.disconnector,
            extensions,
            metadata,
        })
    }
}

impl fmt::Debug for MimicBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MimicBuilder")
            .field("platform", &self.resolver.platform())
            .field("installers", &self.installers.len())
            .field("custom_scheduler", &self.backend.is_some())
            .field("extensions", &self.extensions)
            .field("disconnector", &self.disconnector.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use mimic_core::{Component, GameMode, Value};
    use mimic_framework::{
        BoxError, CustomEvent, Dependency, EventKind, ExtensionError, MetadataKey, Priority,
        Schedule, ServerUserGameModeChangeEvent, ServerUserKickEvent, Subscriber, TickScheduler,
        UserChatEvent,
    };
    use mimic_host_mock::{MockHost, events};
    use uuid::Uuid;

    use crate::RuntimeError;

    fn build(host: MockHost, backend: Arc<dyn SchedulerBackend>) -> Mimic {
        Mimic::builder(Arc::new(host))
            .config(MimicConfig::default())
            .transformers(MockHost::install)
            .scheduler(backend)
            .with_logging(false)
            .build()
            .unwrap()
    }

    fn mimic() -> Mimic {
        build(MockHost::new(), Arc::new(TickScheduler::new()))
    }

    fn steve() -> mimic_core::Value {
        events::player(Uuid::new_v4(), "Steve")
    }

    #[test]
    fn test_build_registers_everything() {
        let mimic = mimic();
        assert_eq!(mimic.platform(), "mock");
        // Three host transformers plus both directions of eight bridged types.
        assert_eq!(mimic.registry().len(), 19);
        assert!(mimic.translator().handles(events::CHAT));
    }

    #[test]
    fn test_config_read_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mimic.toml"),
            "[scheduler]\nsync_queue_capacity = 4\n[dispatch]\nslow_handler_warn_ms = 15\n",
        )
        .unwrap();

        let mimic = Mimic::builder(Arc::new(MockHost::new()))
            .data_dir(dir.path())
            .without_env()
            .transformers(MockHost::install)
            .scheduler(Arc::new(TickScheduler::new()))
            .with_logging(false)
            .build()
            .unwrap();
        assert_eq!(mimic.config().scheduler.sync_queue_capacity, 4);
        assert_eq!(mimic.config().dispatch.slow_handler_warn_ms, Some(15));
    }

    struct ChatTag {
        platform: Option<String>,
    }

    impl Extension for ChatTag {
        fn load(&mut self, ctx: &ExtensionContext<'_>) -> Result<(), BoxError> {
            self.platform = Some(ctx.platform().to_string());
            let tag = MetadataKey::<String>::parse("chat_tag:prefix")?;
            ctx.metadata().set(&tag, "[mock]".to_string());
            ctx.bus().on::<UserChatEvent, _>(|chat| {
                let tagged = format!("[mock] {}", chat.message());
                chat.set_message(tagged);
                Ok(())
            });
            Ok(())
        }
    }

    struct Left;
    struct Right;

    impl Extension for Left {
        fn dependencies(&self) -> Vec<Dependency> {
            vec![Dependency::required::<Right>()]
        }

        fn load(&mut self, _ctx: &ExtensionContext<'_>) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Extension for Right {
        fn dependencies(&self) -> Vec<Dependency> {
            vec![Dependency::required::<Left>()]
        }

        fn load(&mut self, _ctx: &ExtensionContext<'_>) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn builder() -> MimicBuilder {
        Mimic::builder(Arc::new(MockHost::new()))
            .config(MimicConfig::default())
            .transformers(MockHost::install)
            .scheduler(Arc::new(TickScheduler::new()))
            .with_logging(false)
    }

    #[test]
    fn test_extension_loaded_at_build() {
        let mimic = builder()
            .extension(ChatTag { platform: None })
            .build()
            .unwrap();

        let tag = mimic.extension::<ChatTag>().unwrap();
        assert_eq!(tag.platform.as_deref(), Some("mock"));
        let prefix = MetadataKey::<String>::parse("chat_tag:prefix").unwrap();
        assert_eq!(mimic.metadata().get(&prefix).as_deref(), Some("[mock]"));

        let native = events::chat(&steve(), "hi");
        let event = mimic.handle_native_event(native.as_ref()).unwrap();
        assert_eq!(
            event.downcast_ref::<UserChatEvent>().unwrap().message(),
            "[mock] hi"
        );
    }

    #[test]
    fn test_circular_extensions_fail_build() {
        let result = builder().extension(Left).extension(Right).build();
        assert!(matches!(
            result,
            Err(RuntimeError::Extension(ExtensionError::CircularDependency(_)))
        ));
    }

    #[test]
    fn test_late_extension_needs_dependencies() {
        let mimic = mimic();
        assert!(matches!(
            mimic.load_extension(Left),
            Err(RuntimeError::Extension(ExtensionError::MissingDependency { .. }))
        ));
        assert!(mimic.extensions().is_empty());
    }

    #[test]
    fn test_chat_round_trip_through_handlers() {
        let mimic = mimic();
        mimic.bus().on::<UserChatEvent, _>(|chat| {
            let shouted = chat.message().to_uppercase();
            chat.set_message(shouted);
            Ok(())
        });
        mimic.bus().subscribe(
            Subscriber::builder(EventKind::UserChat)
                .priority(Priority::Low)
                .filter(|event| {
                    event
                        .downcast_ref::<UserChatEvent>()
                        .is_some_and(|chat| chat.message().contains("SPAM"))
                })
                .handler(|event| {
                    event.set_cancelled(true);
                    Ok(())
                })
                .build()
                .unwrap(),
        );

        let native = events::chat(&steve(), "hello");
        let event = mimic.handle_native_event(native.as_ref()).unwrap();
        assert_eq!(
            event.downcast_ref::<UserChatEvent>().unwrap().message(),
            "HELLO"
        );
        assert!(!event.is_cancelled());

        let native = events::chat(&steve(), "buy spam");
        let event = mimic.handle_native_event(native.as_ref()).unwrap();
        assert!(event.is_cancelled());
        assert_eq!(
            native.call("isCancelled"),
            Some(mimic_core::Value::Bool(true))
        );
    }

    #[test]
    fn test_refused_connection_reason_reaches_host() {
        let host = Arc::new(MockHost::new());
        let mimic = Mimic::builder(host.clone())
            .config(MimicConfig::default())
            .transformers(MockHost::install)
            .disconnector(host.clone())
            .scheduler(Arc::new(TickScheduler::new()))
            .with_logging(false)
            .build()
            .unwrap();
        mimic.bus().on::<UserConnectEvent, _>(|connect| {
            if connect.user().name() == "Griefer" {
                connect.cancel_with("banned");
            }
            Ok(())
        });

        let welcome = events::login(&steve());
        assert!(mimic.handle_native_event(welcome.as_ref()).is_some());
        assert!(host.disconnected().is_empty());

        let id = Uuid::new_v4();
        let native = events::login(&events::player(id, "Griefer"));
        let event = mimic.handle_native_event(native.as_ref()).unwrap();
        assert!(event.is_cancelled());
        assert_eq!(native.call("isCancelled"), Some(Value::Bool(true)));
        assert_eq!(host.disconnected(), vec![(id, Component::text("banned"))]);
    }

    #[test]
    fn test_failing_handler_does_not_reach_host() {
        let mimic = mimic();
        mimic.bus().register_handler(EventKind::User, |_| Err("boom".into()));
        let seen = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&seen);
        mimic.bus().on::<ServerUserGameModeChangeEvent, _>(move |change| {
            assert_eq!(change.new_game_mode(), GameMode::Spectator);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let native = events::game_mode_change(&steve(), "spectator");
        assert!(mimic.handle_native_event(native.as_ref()).is_some());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unmappable_event_returns_none() {
        let mimic = mimic();
        let broken = mimic_host_mock::MockObject::new(events::QUIT);
        assert!(mimic.handle_native_event(&broken).is_none());

        let unknown = mimic_host_mock::MockObject::new("org.bukkit.event.world.ChunkLoadEvent");
        assert!(mimic.handle_native_event(&unknown).is_none());
    }

    #[test]
    fn test_missing_presentation_type_degrades() {
        let mimic = build(
            MockHost::new().without_type("adventure.text.Component"),
            Arc::new(TickScheduler::new()),
        );
        // Everything depending on components is gone; Key, TitleTimes, Sound
        // and SoundStop remain.
        assert_eq!(mimic.registry().len(), 3 + 8);

        // The kick reason cannot be transformed, so the event is dropped.
        let reason = mimic_host_mock::MockObject::new("adventure.text.Component").into_value();
        let native = events::kick(&steve(), Some(reason));
        assert!(mimic.handle_native_event(native.as_ref()).is_none());

        // Without a reason the event still goes through.
        let native = events::kick(&steve(), None);
        let event = mimic.handle_native_event(native.as_ref()).unwrap();
        assert_eq!(
            event.downcast_ref::<ServerUserKickEvent>().unwrap().reason(),
            Component::text("Disconnected")
        );
    }

    #[test]
    fn test_post_custom_event() {
        let mimic = mimic();
        mimic.bus().on::<CustomEvent, _>(|custom| {
            custom.payload_mut()["handled"] = true.into();
            Ok(())
        });
        let deposit = CustomEvent::new("economy:deposit", serde_json::json!({"amount": 5}));
        let event = mimic.post(deposit);
        let custom = event.downcast_ref::<CustomEvent>().unwrap();
        assert_eq!(custom.payload()["handled"], serde_json::json!(true));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MimicConfig::default();
        config.bridge.key.clear();
        let result = Mimic::builder(Arc::new(MockHost::new()))
            .config(config)
            .scheduler(Arc::new(TickScheduler::new()))
            .with_logging(false)
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[test]
    fn test_tick_backend_runs_tasks() {
        let backend = Arc::new(TickScheduler::new());
        let mimic = build(MockHost::new(), backend.clone());
        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        let task = Task::builder(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .sync()
        .repeat(Schedule::ticks(1))
        .cancel_after(3)
        .build();
        mimic.schedule(&task).unwrap();

        for _ in 0..10 {
            backend.tick();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_backend_is_tokio() {
        let mimic = Mimic::builder(Arc::new(MockHost::new()))
            .config(MimicConfig::default())
            .with_logging(false)
            .build()
            .unwrap();
        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        mimic
            .scheduler()
            .run_later(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                Schedule::seconds(1),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        mimic.shutdown();
        assert!(mimic.schedule(&Task::sync(|| {})).is_err());
    }

    #[test]
    fn test_build_without_runtime_or_backend() {
        let result = Mimic::builder(Arc::new(MockHost::new()))
            .config(MimicConfig::default())
            .with_logging(false)
            .build();
        assert!(matches!(result, Err(RuntimeError::NoRuntime)));
    }
}
