//! Unified error types for the Mimic core.
//!
//! This module provides the error taxonomy shared by the mapper, the
//! transformer registry and the cross-runtime bridge. Dispatch and scheduling
//! errors are defined in mimic-framework.

use thiserror::Error;

use crate::foundation::value::TypeKey;
use crate::integration::bridge::BridgedType;

// =============================================================================
// Value Errors
// =============================================================================

/// Errors raised when a dynamic [`Value`](crate::Value) has the wrong shape.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    /// The value is of an unexpected type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Human readable name of the expected type.
        expected: &'static str,
        /// Runtime type of the value that was found.
        found: TypeKey,
    },

    /// The value has the right type but an invalid content.
    #[error("invalid {expected}: {reason}")]
    Invalid {
        /// Human readable name of the expected type.
        expected: &'static str,
        /// Why the content was rejected.
        reason: String,
    },
}

impl ValueError {
    /// Creates a type mismatch error.
    pub fn mismatch(expected: &'static str, found: TypeKey) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Creates an invalid content error.
    pub fn invalid(expected: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            expected,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Host Call Errors
// =============================================================================

/// Error returned by a host function or method invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("host call failed: {message}")]
pub struct HostCallError {
    message: String,
}

impl HostCallError {
    /// Creates a new host call error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ValueError> for HostCallError {
    fn from(err: ValueError) -> Self {
        Self::new(err.to_string())
    }
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors produced by the transformer registry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// No registered transformer converts between the two types.
    #[error("no transformer registered from {from} to {to}")]
    NoTransformer {
        /// Runtime type of the input value.
        from: TypeKey,
        /// Requested target type.
        to: TypeKey,
    },

    /// A matching transformer rejected the value.
    #[error("transform from {from} to {to} failed: {reason}")]
    Failed {
        /// Runtime type of the input value.
        from: TypeKey,
        /// Requested target type.
        to: TypeKey,
        /// Reason given by the transformer.
        reason: String,
    },

    /// A transformer returned a value that does not satisfy the target type.
    #[error("transformer for {to} returned a value of type {got}")]
    UnexpectedOutput {
        /// Requested target type.
        to: TypeKey,
        /// Runtime type of the returned value.
        got: TypeKey,
    },
}

impl TransformError {
    /// Creates a transform failure for the given types.
    pub fn failed(from: TypeKey, to: TypeKey, reason: impl Into<String>) -> Self {
        Self::Failed {
            from,
            to,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors produced while building a canonical object from a host object.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MappingError {
    /// A required field could not be resolved from any of its aliases.
    #[error("cannot map field {field} from names {aliases:?}")]
    MissingField {
        /// Canonical field name.
        field: &'static str,
        /// Candidate source names that were tried.
        aliases: Vec<&'static str>,
    },

    /// The resolved value could not be transformed.
    #[error("cannot transform field {field}: {source}")]
    Transform {
        /// Canonical field name.
        field: &'static str,
        /// Underlying transform error.
        #[source]
        source: TransformError,
    },

    /// The resolved value does not fit the canonical field type.
    #[error("cannot assign field {field}: {source}")]
    Value {
        /// Canonical field name.
        field: &'static str,
        /// Underlying value error.
        #[source]
        source: ValueError,
    },
}

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised when registering components into a registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The identical transformer instance is already registered.
    #[error("transformer '{name}' is already registered")]
    DuplicateTransformer {
        /// Name of the transformer.
        name: String,
    },

    /// A canonical event type is already registered with the translator.
    #[error("event '{target}' is already registered")]
    DuplicateEvent {
        /// Canonical event type name.
        target: &'static str,
    },

    /// A builder was finished without a mandatory part.
    #[error("incomplete registration: missing {0}")]
    Incomplete(&'static str),

    /// A builder setting has a value that can never take effect.
    #[error("invalid registration: {setting} {reason}")]
    Invalid {
        /// Name of the offending setting.
        setting: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

// =============================================================================
// Bridge Errors
// =============================================================================

/// Failure to build a bridge holder, meaning a packaging or version mismatch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeInitError {
    /// None of the candidate host types could be resolved.
    #[error("no host type for {bridged} among {candidates:?}")]
    TypeNotFound {
        /// The bridged canonical type.
        bridged: BridgedType,
        /// Host type names that were tried.
        candidates: Vec<String>,
    },

    /// The host type lacks a required function.
    #[error("host type {type_name} has no function '{function}'")]
    FunctionNotFound {
        /// Resolved host type name.
        type_name: String,
        /// Missing function name.
        function: String,
    },

    /// The host type lacks a required method.
    #[error("host type {type_name} has no method '{method}'")]
    MethodNotFound {
        /// Resolved host type name.
        type_name: String,
        /// Missing method name.
        method: String,
    },

    /// The host type lacks a required constant.
    #[error("host type {type_name} has no constant '{constant}'")]
    ConstantNotFound {
        /// Resolved host type name.
        type_name: String,
        /// Missing constant name.
        constant: String,
    },

    /// A holder this holder depends on failed to build.
    #[error("{bridged} depends on a bridge that failed: {source}")]
    Dependency {
        /// The bridged canonical type.
        bridged: BridgedType,
        /// Failure of the dependency.
        #[source]
        source: Box<BridgeInitError>,
    },
}

/// Errors produced by the cross-runtime bridge.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The bridge for this type could not be initialized.
    #[error("bridge initialization failed: {0}")]
    Init(#[from] BridgeInitError),

    /// A single conversion failed.
    #[error("failed to translate {bridged}: {reason}")]
    Translation {
        /// The bridged canonical type.
        bridged: BridgedType,
        /// Reason for the failure.
        reason: String,
    },
}

impl BridgeError {
    /// Creates a translation error.
    pub fn translation(bridged: BridgedType, reason: impl Into<String>) -> Self {
        Self::Translation {
            bridged,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for value conversions.
pub type ValueResult<T> = Result<T, ValueError>;

/// Result type for host calls.
pub type HostResult<T> = Result<T, HostCallError>;

/// Result type for transforms.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for mapping.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for bridge conversions.
pub type BridgeResult<T> = Result<T, BridgeError>;
