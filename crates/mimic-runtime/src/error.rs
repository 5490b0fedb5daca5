//! Runtime error types.

use mimic_core::{BridgeError, RegistrationError};
use mimic_framework::{ExtensionError, ScheduleError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while building or running a [`Mimic`](crate::Mimic)
/// instance.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A transformer or event mapping could not be registered.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// The presentation bridge failed where it was required.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// An extension could not be ordered or loaded.
    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    /// A task could not be scheduled.
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// No scheduler backend was given and no tokio runtime is running.
    #[error("No scheduler backend configured and no tokio runtime available")]
    NoRuntime,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
