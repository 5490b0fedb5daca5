//! # Mimic Framework
//!
//! The translation, dispatch and scheduling engine of Mimic.
//!
//! This layer provides:
//! - Transformer registry for type-directed value conversion
//! - Declarative mapper and native event translator
//! - Canonical event catalogue
//! - Priority-ordered, fault-isolating event bus
//! - Host-independent tasks and the scheduler seam
//! - Extensions loaded in dependency order, and typed metadata
//!
//! Everything here is synchronous and owns no threads. The runtime layer wires
//! it to a host and supplies a scheduler backend.

pub mod dispatch;
pub mod error;
pub mod event;
pub mod extension;
pub mod mapper;
pub mod metadata;
pub mod scheduling;
pub mod transform;

pub use dispatch::{
    Callback, EventBus, Handler, Listener, Predicate, Priority, Subscriber, SubscriberBuilder,
    Subscription,
};
pub use error::{
    BoxError, ExtensionError, ExtensionResult, HandlerResult, ScheduleError, ScheduleResult,
    panic_message,
};
pub use event::{
    Cancellable, CanonicalEvent, CustomEvent, DEFAULT_DISCONNECT_REASON, Disconnector, EventKind,
    EventVariant, ProxyUserConnectedEvent, ProxyUserServerConnectedEvent,
    ServerUserGameModeChangeEvent, ServerUserKickEvent, UserChatEvent, UserConnectEvent,
    UserDisconnectEvent,
};
pub use extension::{Dependency, Extension, ExtensionContext, ExtensionMap, Extensions};
pub use mapper::{EventTranslator, Mapper};
pub use metadata::{Metadata, MetadataHolder, MetadataKey};
pub use mimic_macros::MappedEvent;
pub use scheduling::{
    Job, MILLIS_PER_TICK, Schedule, ScheduledHandle, Scheduler, SchedulerBackend, Task,
    TaskBuilder, TaskKind, TickScheduler,
};
pub use transform::{
    BridgeDirection, BridgeTransformer, FnTransformer, Transformer, TransformerRegistry,
    TypeHierarchy,
};
