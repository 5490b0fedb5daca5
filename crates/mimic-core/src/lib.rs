//! # Mimic Core
//!
//! The core model of the Mimic cross-runtime plugin framework.
//!
//! Plugins are written once against canonical objects and events, and run
//! unmodified on several mutually incompatible host runtimes. This crate holds
//! everything that is independent of event routing:
//!
//! ### Foundation Layer
//!
//! - **Value model**: host objects seen through [`Value`] and [`Object`]
//! - **Type resolution**: optional host types located by name ([`TypeResolver`])
//! - **Mapping descriptors**: per-field alias lists ([`MappingSpec`], [`Mapped`])
//! - **Canonical objects**: [`User`], [`GameMode`]
//!
//! ### Presentation Types
//!
//! The canonical copy of rich text and friends: [`Component`], [`Key`],
//! [`Title`], [`BossBar`], [`Sound`], [`SoundStop`], [`Book`].
//!
//! ### Integration Layer
//!
//! - **Bridge**: converts presentation values to and from the host's copy
//!   ([`Bridge`], [`Bridged`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use mimic_core::{Bridge, BridgeConfig, Component, NamedColor};
//!
//! let bridge = Bridge::new(resolver, BridgeConfig::default());
//! bridge.load()?;
//!
//! let greeting = Component::text("Welcome!").color(NamedColor::Gold);
//! let native = bridge.to_host(&greeting)?;
//! ```

pub mod error;
pub mod foundation;
pub mod integration;
pub mod presentation;

pub use error::{
    BridgeError, BridgeInitError, BridgeResult, HostCallError, HostResult, MappingError,
    MappingResult, RegistrationError, TransformError, TransformResult, ValueError, ValueResult,
};
pub use foundation::{
    Canonical, FieldSpec, FromValue, GameMode, HostFunction, HostMethod, HostType, Mapped,
    MappedFields, MappingSpec, Object, ObjectRef, SourceName, TransformSpec, TypeKey,
    TypeResolver, User, Value,
};
pub use integration::{Bridge, BridgeConfig, Bridged, BridgedType};
pub use presentation::{
    Book, BossBar, BossBarColor, BossBarFlag, BossBarOverlay, Component, ContentKind, Key,
    NamedColor, Sound, SoundSource, SoundStop, TextColor, Title, TitlePart, TitleTimes,
};
