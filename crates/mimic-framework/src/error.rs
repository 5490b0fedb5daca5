//! Error types for the Mimic framework.
//!
//! Mapping, transform and registration errors live in mimic-core so the
//! derive macro and the bridge can name them. This module adds the errors
//! that only exist once events are dispatched and tasks are scheduled.

use std::any::Any;

use thiserror::Error;

/// Error type returned by event handlers and task work items.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single handler invocation.
pub type HandlerResult = Result<(), BoxError>;

/// Errors raised when handing a task to a scheduler backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The backend refused the task.
    #[error("scheduler rejected the task: {0}")]
    Rejected(String),

    /// The task was cancelled before it was scheduled.
    #[error("task is already cancelled")]
    Cancelled,

    /// The task was already handed to a backend.
    #[error("task is already scheduled")]
    AlreadyScheduled,

    /// The backend no longer accepts work.
    #[error("scheduler is shut down")]
    Shutdown,
}

impl ScheduleError {
    /// Creates a rejection error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Result type for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors raised while ordering or loading extensions.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// A required dependency is not registered or not loaded.
    #[error("{extension} requires dependencies but some are missing: {missing}")]
    MissingDependency {
        extension: &'static str,
        missing: String,
    },

    /// The dependency graph has a cycle, given as `A -> B -> A`.
    #[error("detected circular dependencies: {0}")]
    CircularDependency(String),

    /// An extension's own `init` or `load` failed.
    #[error("extension {extension} failed to {stage}: {source}")]
    Failed {
        extension: &'static str,
        stage: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Result type for extension operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Extracts the message of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
