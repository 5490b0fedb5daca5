//! Mimic Runtime - Host wiring for the Mimic framework.
//!
//! This crate provides:
//! - The [`Mimic`] service object and its builder
//! - Layered configuration (defaults, data directory files, environment)
//! - Logging configuration
//! - A tokio-backed scheduler for hosts without a tick loop of their own
//!
//! ```ignore
//! use mimic_runtime::Mimic;
//!
//! #[tokio::main]
//! async fn main() -> mimic_runtime::RuntimeResult<()> {
//!     let mimic = Mimic::builder(resolver)
//!         .transformers(MyHost::install)
//!         .build()?;
//!
//!     mimic.bus().on::<UserChatEvent, _>(|chat| {
//!         tracing::info!(user = %chat.user().name(), message = chat.message(), "chat");
//!         Ok(())
//!     });
//!
//!     // Forward host events from the host's event hook.
//!     mimic.handle_native_event(native.as_ref());
//!     Ok(())
//! }
//! ```
//!
//! # Scheduling
//!
//! Hosts that drive their own tick loop pass a
//! [`TickScheduler`](mimic_framework::TickScheduler) (or their own
//! [`SchedulerBackend`](mimic_framework::SchedulerBackend)) through
//! [`MimicBuilder::scheduler`]. Otherwise the builder creates a
//! [`TokioScheduler`] on the current tokio runtime, where synchronous tasks
//! run one at a time in submission order.

pub mod config;
pub mod error;
pub mod logging;
mod runtime;
mod scheduler;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DispatchConfig, LoggingConfig, MimicConfig,
    SchedulerConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{Mimic, MimicBuilder};
pub use scheduler::TokioScheduler;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
