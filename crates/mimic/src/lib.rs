//! # Mimic
//!
//! Write game-server plugins once, run them on every host runtime.
//!
//! ## Overview
//!
//! Hosts (server and proxy platforms) each ship their own event types, player
//! objects and presentation classes. Mimic gives plugins one canonical view of
//! all of them and does the translation at the edge.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌──────────┐     ┌───────────────────┐
//! │ Native event │────▶│ Translator │────▶│ EventBus │────▶│ Handlers (ordered │
//! │   (host)     │◀────│ (Mapper)   │◀────│          │◀────│ by priority)      │
//! └──────────────┘     └────────────┘     └──────────┘     └───────────────────┘
//!        ▲  cancellation written back           │
//!        │                                      ▼
//!   ┌────────┐   presentation values    ┌─────────────┐
//!   │ Bridge │◀────────────────────────▶│ Transformers│
//!   └────────┘                          └─────────────┘
//! ```
//!
//! - **Mapper**: builds canonical values from host objects through per-field
//!   alias lists
//! - **Transformers**: type-directed conversions between host and canonical
//!   values
//! - **Bridge**: converts text components, titles, boss bars, sounds and books
//!   to and from the host's own copy
//! - **EventBus**: priority-ordered dispatch where one failing handler never
//!   stops the others
//! - **Scheduler**: host-independent delayed and repeating tasks
//! - **Extensions**: add-ons loaded in dependency order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mimic::prelude::*;
//!
//! let mimic = Mimic::builder(resolver)
//!     .transformers(MyHost::install)
//!     .build()?;
//!
//! mimic.bus().on::<UserConnectEvent, _>(|connect| {
//!     if connect.user().name() == "griefer" {
//!         connect.cancel_with(Component::text("Banned").color(NamedColor::Red));
//!     }
//!     Ok(())
//! });
//! ```
//!
//! ## Features
//!
//! - `toml-config`: Load `mimic.toml` (default)
//! - `yaml-config`: Load `mimic.yaml`
//! - `json-log`: JSON log output

#[cfg(test)]
extern crate self as mimic;

pub use mimic_core as core;
pub use mimic_framework as framework;
pub use mimic_runtime as runtime;

/// Paths used by `#[derive(MappedEvent)]`. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use mimic_core::{FieldSpec, Mapped, MappedFields, MappingResult, MappingSpec, TransformSpec};
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use mimic::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use mimic_runtime::{Mimic, MimicBuilder, MimicConfig, RuntimeError, RuntimeResult};

    // Events - for writing handlers
    pub use mimic_framework::{
        Cancellable, CanonicalEvent, CustomEvent, EventKind, ProxyUserConnectedEvent,
        ProxyUserServerConnectedEvent, ServerUserGameModeChangeEvent, ServerUserKickEvent,
        UserChatEvent, UserConnectEvent, UserDisconnectEvent,
    };

    // Dispatch
    pub use mimic_framework::{
        EventBus, Handler, HandlerResult, Listener, Priority, Subscriber, Subscription,
    };

    // Mapping host objects
    pub use mimic_core::Mapped;
    pub use mimic_framework::MappedEvent;

    // Scheduling
    pub use mimic_framework::{Schedule, Scheduler, Task};

    // Extensions and metadata
    pub use mimic_framework::{
        BoxError, Dependency, Extension, ExtensionContext, MetadataHolder, MetadataKey,
    };

    // Canonical objects and presentation types
    pub use mimic_core::{
        Book, BossBar, BossBarColor, BossBarFlag, BossBarOverlay, Component, GameMode, Key,
        NamedColor, Sound, SoundSource, SoundStop, Title, TitleTimes, User,
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{MappedFields, Value};
    use crate::prelude::*;

    #[derive(Debug, MappedEvent)]
    #[mapped(natives = ["host.economy.DepositEvent"])]
    struct Deposit {
        #[mapped(names = ["amount", "getAmount()"])]
        amount: i64,
        #[mapped(names = ["note"], platform_specific)]
        note: Option<String>,
        seen: bool,
    }

    #[test]
    fn test_derive_through_facade() {
        let spec = Deposit::mapping_spec();
        assert_eq!(spec.target, "Deposit");
        assert_eq!(spec.natives.to_vec(), vec!["host.economy.DepositEvent"]);
        assert_eq!(spec.fields.len(), 2);

        let mut fields = MappedFields::new();
        fields.insert("amount", Value::Int(5));
        fields.insert("note", Value::Null);
        let deposit = Deposit::from_fields(fields).unwrap();
        assert_eq!(deposit.amount, 5);
        assert_eq!(deposit.note, None);
        assert!(!deposit.seen);
    }
}
