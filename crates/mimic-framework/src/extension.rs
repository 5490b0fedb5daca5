//! Extensions loaded alongside a Mimic instance.
//!
//! An [`Extension`] is an add-on that hooks into the bus, the transformer
//! registry and the scheduler of an instance. Extensions registered before
//! startup are collected in an [`ExtensionMap`] and loaded in dependency
//! order:
//!
//! 1. every extension's [`Extension::init`] runs, dependencies first
//! 2. every extension's [`Extension::load`] runs, in the same order
//!
//! Extensions added after startup go through [`Extensions::load`], which runs
//! both steps at once and requires every required dependency to be loaded
//! already.
//!
//! ```rust,ignore
//! struct Audit;
//!
//! impl Extension for Audit {
//!     fn dependencies(&self) -> Vec<Dependency> {
//!         vec![Dependency::required::<Storage>()]
//!     }
//!
//!     fn load(&mut self, ctx: &ExtensionContext<'_>) -> Result<(), BoxError> {
//!         ctx.bus().on::<UserChatEvent, _>(|chat| {
//!             tracing::info!(user = chat.user().name(), "chat");
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//! }
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::dispatch::EventBus;
use crate::error::{BoxError, ExtensionError, ExtensionResult};
use crate::metadata::Metadata;
use crate::scheduling::Scheduler;
use crate::transform::TransformerRegistry;

/// An add-on loaded into a Mimic instance.
pub trait Extension: Send + Sync + 'static {
    /// Extensions to load before this one.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Runs before any extension is loaded.
    fn init(&mut self, _bus: &EventBus) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs once the instance is built and every dependency is loaded.
    fn load(&mut self, ctx: &ExtensionContext<'_>) -> Result<(), BoxError>;
}

/// What an extension sees of the instance it is loaded into.
pub struct ExtensionContext<'a> {
    bus: &'a EventBus,
    registry: &'a TransformerRegistry,
    scheduler: &'a Scheduler,
    metadata: &'a Metadata,
    platform: &'a str,
}

impl<'a> ExtensionContext<'a> {
    pub fn new(
        bus: &'a EventBus,
        registry: &'a TransformerRegistry,
        scheduler: &'a Scheduler,
        metadata: &'a Metadata,
        platform: &'a str,
    ) -> Self {
        Self {
            bus,
            registry,
            scheduler,
            metadata,
            platform,
        }
    }

    pub fn bus(&self) -> &'a EventBus {
        self.bus
    }

    pub fn registry(&self) -> &'a TransformerRegistry {
        self.registry
    }

    pub fn scheduler(&self) -> &'a Scheduler {
        self.scheduler
    }

    pub fn metadata(&self) -> &'a Metadata {
        self.metadata
    }

    /// Host platform name.
    pub fn platform(&self) -> &'a str {
        self.platform
    }
}

// =============================================================================
// Dependency
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Type(TypeId),
    /// Matches an extension's short or full type name.
    Name(String),
}

/// A dependency of one extension on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    name: String,
    target: Target,
    required: bool,
}

impl Dependency {
    /// Loading fails if `E` is absent.
    pub fn required<E: Extension>() -> Self {
        Self::of_type::<E>(true)
    }

    /// Orders after `E` when it is present.
    pub fn optional<E: Extension>() -> Self {
        Self::of_type::<E>(false)
    }

    /// A dependency on an extension type that may not be linked into this
    /// build, matched by type name.
    pub fn named(name: impl Into<String>, required: bool) -> Self {
        let name = name.into();
        Self {
            target: Target::Name(name.clone()),
            name,
            required,
        }
    }

    fn of_type<E: Extension>(required: bool) -> Self {
        Self {
            name: short_name(type_name::<E>()).to_string(),
            target: Target::Type(TypeId::of::<E>()),
            required,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    fn matches(&self, id: TypeId, full_name: &str) -> bool {
        match &self.target {
            Target::Type(target) => *target == id,
            Target::Name(name) => name == full_name || name == short_name(full_name),
        }
    }
}

/// `a::b::Storage<c::D>` becomes `Storage`.
fn short_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// =============================================================================
// ExtensionMap
// =============================================================================

/// Erases the extension type while keeping a way back to `Arc<E>`.
trait Slot: Send + Sync {
    fn extension(&mut self) -> &mut dyn Extension;
    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<E: Extension> Slot for E {
    fn extension(&mut self) -> &mut dyn Extension {
        self
    }

    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync> {
        Arc::new(*self)
    }
}

struct Registered {
    id: TypeId,
    type_name: &'static str,
    dependencies: Vec<Dependency>,
    slot: Box<dyn Slot>,
}

impl Registered {
    fn name(&self) -> &'static str {
        short_name(self.type_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Pending,
    Complete,
}

/// Extensions registered before startup, at most one per type.
#[derive(Default)]
pub struct ExtensionMap {
    entries: Vec<Registered>,
}

impl ExtensionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `extension`, replacing an earlier one of the same type.
    pub fn insert<E: Extension>(&mut self, extension: E) {
        let entry = Registered {
            id: TypeId::of::<E>(),
            type_name: type_name::<E>(),
            dependencies: extension.dependencies(),
            slot: Box::new(extension),
        };
        match self.entries.iter().position(|e| e.id == entry.id) {
            Some(i) => {
                warn!(extension = entry.name(), "Extension registered twice, replacing");
                self.entries[i] = entry;
            }
            None => self.entries.push(entry),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extension names in the order they would be loaded.
    pub fn load_sort(&self) -> ExtensionResult<Vec<&'static str>> {
        Ok(self
            .order()?
            .into_iter()
            .map(|i| self.entries[i].name())
            .collect())
    }

    /// Initialises and loads every extension, dependencies first.
    pub fn load_all(self, ctx: &ExtensionContext<'_>) -> ExtensionResult<Extensions> {
        let order = self.order()?;
        let mut entries: Vec<Option<Registered>> = self.entries.into_iter().map(Some).collect();
        let mut sorted: Vec<Registered> = order
            .into_iter()
            .filter_map(|i| entries[i].take())
            .collect();

        for entry in &mut sorted {
            let name = entry.name();
            debug!(extension = name, "Initialising extension");
            entry
                .slot
                .extension()
                .init(ctx.bus())
                .map_err(|source| failed(name, "initialise", source))?;
        }

        let extensions = Extensions::new();
        for mut entry in sorted {
            let name = entry.name();
            entry
                .slot
                .extension()
                .load(ctx)
                .map_err(|source| failed(name, "load", source))?;
            info!(extension = name, "Extension loaded");
            extensions.loaded.write().push(Loaded {
                id: entry.id,
                type_name: entry.type_name,
                instance: entry.slot.into_shared(),
            });
        }
        Ok(extensions)
    }

    /// Depth-first topological order. An edge runs from each extension to
    /// every registered dependency.
    fn order(&self) -> ExtensionResult<Vec<usize>> {
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); self.entries.len()];

        for (i, entry) in self.entries.iter().enumerate() {
            for dependency in &entry.dependencies {
                let target = self
                    .entries
                    .iter()
                    .position(|e| dependency.matches(e.id, e.type_name));
                match target {
                    Some(j) if j != i => edges[i].push(j),
                    Some(_) => warn!(
                        extension = entry.name(),
                        "Extension depends on itself, ignored"
                    ),
                    None if dependency.required => {
                        return Err(ExtensionError::MissingDependency {
                            extension: entry.name(),
                            missing: dependency.name.clone(),
                        });
                    }
                    None => debug!(
                        extension = entry.name(),
                        dependency = dependency.name(),
                        "Optional dependency absent"
                    ),
                }
            }
        }

        let mut visits = vec![Visit::New; self.entries.len()];
        let mut order = Vec::with_capacity(self.entries.len());
        let mut path = Vec::new();
        for node in 0..self.entries.len() {
            self.visit(node, &edges, &mut visits, &mut path, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        node: usize,
        edges: &[Vec<usize>],
        visits: &mut [Visit],
        path: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> ExtensionResult<()> {
        match visits[node] {
            Visit::Complete => return Ok(()),
            Visit::Pending => {
                let start = path.iter().position(|&n| n == node).unwrap_or(0);
                let chain: Vec<&str> = path[start..]
                    .iter()
                    .chain(std::iter::once(&node))
                    .map(|&n| self.entries[n].name())
                    .collect();
                return Err(ExtensionError::CircularDependency(chain.join(" -> ")));
            }
            Visit::New => {}
        }

        visits[node] = Visit::Pending;
        path.push(node);
        for &next in &edges[node] {
            self.visit(next, edges, visits, path, order)?;
        }
        path.pop();
        visits[node] = Visit::Complete;
        order.push(node);
        Ok(())
    }
}

impl fmt::Debug for ExtensionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(Registered::name))
            .finish()
    }
}

fn failed(extension: &'static str, stage: &'static str, source: BoxError) -> ExtensionError {
    ExtensionError::Failed {
        extension,
        stage,
        source,
    }
}

// =============================================================================
// Extensions
// =============================================================================

struct Loaded {
    id: TypeId,
    type_name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
}

/// The loaded extensions of an instance, in load order.
#[derive(Default)]
pub struct Extensions {
    loaded: RwLock<Vec<Loaded>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<E: Extension>(&self) -> Option<Arc<E>> {
        let loaded = self.loaded.read();
        let entry = loaded.iter().find(|e| e.id == TypeId::of::<E>())?;
        Arc::clone(&entry.instance).downcast::<E>().ok()
    }

    pub fn contains<E: Extension>(&self) -> bool {
        self.loaded.read().iter().any(|e| e.id == TypeId::of::<E>())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.loaded
            .read()
            .iter()
            .map(|e| short_name(e.type_name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.loaded.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.read().is_empty()
    }

    /// Loads `extension` into a running instance. If one of the same type is
    /// already loaded, that one is returned and `extension` is dropped.
    pub fn load<E: Extension>(
        &self,
        mut extension: E,
        ctx: &ExtensionContext<'_>,
    ) -> ExtensionResult<Arc<E>> {
        if let Some(existing) = self.get::<E>() {
            return Ok(existing);
        }

        let name = short_name(type_name::<E>());
        let missing: Vec<String> = {
            let loaded = self.loaded.read();
            extension
                .dependencies()
                .into_iter()
                .filter(|d| d.required && !loaded.iter().any(|e| d.matches(e.id, e.type_name)))
                .map(|d| d.name)
                .collect()
        };
        if !missing.is_empty() {
            return Err(ExtensionError::MissingDependency {
                extension: name,
                missing: missing.join(", "),
            });
        }

        extension
            .init(ctx.bus())
            .map_err(|source| failed(name, "initialise", source))?;
        extension
            .load(ctx)
            .map_err(|source| failed(name, "load", source))?;

        let instance = Arc::new(extension);
        let mut loaded = self.loaded.write();
        if let Some(raced) = loaded.iter().find(|e| e.id == TypeId::of::<E>()) {
            if let Ok(existing) = Arc::clone(&raced.instance).downcast::<E>() {
                return Ok(existing);
            }
        }
        loaded.push(Loaded {
            id: TypeId::of::<E>(),
            type_name: type_name::<E>(),
            instance: instance.clone(),
        });
        info!(extension = name, "Extension loaded");
        Ok(instance)
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::scheduling::TickScheduler;

    type Log = Arc<Mutex<Vec<String>>>;

    macro_rules! recorder {
        ($name:ident) => {
            #[derive(Debug)]
            struct $name {
                log: Log,
                dependencies: Vec<Dependency>,
            }

            impl $name {
                fn new(log: &Log, dependencies: Vec<Dependency>) -> Self {
                    Self {
                        log: Arc::clone(log),
                        dependencies,
                    }
                }
            }

            impl Extension for $name {
                fn dependencies(&self) -> Vec<Dependency> {
                    self.dependencies.clone()
                }

                fn init(&mut self, _bus: &EventBus) -> Result<(), BoxError> {
                    self.log.lock().push(format!("init {}", stringify!($name)));
                    Ok(())
                }

                fn load(&mut self, _ctx: &ExtensionContext<'_>) -> Result<(), BoxError> {
                    self.log.lock().push(format!("load {}", stringify!($name)));
                    Ok(())
                }
            }
        };
    }

    recorder!(Storage);
    recorder!(Permissions);
    recorder!(Audit);

    struct Broken;

    impl Extension for Broken {
        fn load(&mut self, _ctx: &ExtensionContext<'_>) -> Result<(), BoxError> {
            Err("database unreachable".into())
        }
    }

    struct Parts {
        bus: EventBus,
        registry: TransformerRegistry,
        scheduler: Scheduler,
        metadata: Metadata,
    }

    impl Parts {
        fn new() -> Self {
            Self {
                bus: EventBus::new(),
                registry: TransformerRegistry::new(),
                scheduler: Scheduler::new(Arc::new(TickScheduler::new())),
                metadata: Metadata::new(),
            }
        }

        fn ctx(&self) -> ExtensionContext<'_> {
            ExtensionContext::new(
                &self.bus,
                &self.registry,
                &self.scheduler,
                &self.metadata,
                "mock",
            )
        }
    }

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_dependencies_load_first() {
        let log = log();
        let mut map = ExtensionMap::new();
        map.insert(Audit::new(
            &log,
            vec![
                Dependency::required::<Permissions>(),
                Dependency::optional::<Storage>(),
                Dependency::named("mimic_metrics::Metrics", false),
            ],
        ));
        map.insert(Permissions::new(&log, vec![Dependency::required::<Storage>()]));
        map.insert(Storage::new(&log, Vec::new()));

        assert_eq!(map.load_sort().unwrap(), vec!["Storage", "Permissions", "Audit"]);

        let parts = Parts::new();
        let extensions = map.load_all(&parts.ctx()).unwrap();
        assert_eq!(
            *log.lock(),
            vec![
                "init Storage",
                "init Permissions",
                "init Audit",
                "load Storage",
                "load Permissions",
                "load Audit",
            ]
        );
        assert_eq!(extensions.names(), vec!["Storage", "Permissions", "Audit"]);
        assert!(extensions.get::<Permissions>().is_some());
        assert!(extensions.get::<Broken>().is_none());
    }

    #[test]
    fn test_circular_dependency_is_rejected() {
        let log = log();
        let mut map = ExtensionMap::new();
        map.insert(Storage::new(&log, vec![Dependency::required::<Permissions>()]));
        map.insert(Permissions::new(&log, vec![Dependency::named("Storage", true)]));

        let err = map.load_sort().unwrap_err();
        assert_eq!(
            err.to_string(),
            "detected circular dependencies: Storage -> Permissions -> Storage"
        );

        let parts = Parts::new();
        assert!(matches!(
            map.load_all(&parts.ctx()),
            Err(ExtensionError::CircularDependency(_))
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_missing_required_dependency() {
        let log = log();
        let mut map = ExtensionMap::new();
        map.insert(Audit::new(&log, vec![Dependency::required::<Storage>()]));

        match map.load_sort() {
            Err(ExtensionError::MissingDependency { extension, missing }) => {
                assert_eq!(extension, "Audit");
                assert_eq!(missing, "Storage");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_failing_load_names_extension() {
        let mut map = ExtensionMap::new();
        map.insert(Broken);

        let parts = Parts::new();
        let err = map.load_all(&parts.ctx()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "extension Broken failed to load: database unreachable"
        );
    }

    #[test]
    fn test_late_load_checks_dependencies() {
        let log = log();
        let parts = Parts::new();
        let extensions = Extensions::new();

        let err = extensions
            .load(
                Audit::new(&log, vec![Dependency::required::<Storage>()]),
                &parts.ctx(),
            )
            .unwrap_err();
        assert!(matches!(err, ExtensionError::MissingDependency { .. }));
        assert!(log.lock().is_empty());

        extensions
            .load(Storage::new(&log, Vec::new()), &parts.ctx())
            .unwrap();
        extensions
            .load(
                Audit::new(&log, vec![Dependency::required::<Storage>()]),
                &parts.ctx(),
            )
            .unwrap();
        assert_eq!(
            *log.lock(),
            vec!["init Storage", "load Storage", "init Audit", "load Audit"]
        );
    }

    #[test]
    fn test_late_load_returns_existing() {
        let log = log();
        let parts = Parts::new();
        let extensions = Extensions::new();

        let first = extensions
            .load(Storage::new(&log, Vec::new()), &parts.ctx())
            .unwrap();
        let second = extensions
            .load(Storage::new(&log, Vec::new()), &parts.ctx())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(extensions.len(), 1);
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_short_names() {
        assert_eq!(short_name("a::b::Storage"), "Storage");
        assert_eq!(short_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_name("Plain"), "Plain");
    }
}
