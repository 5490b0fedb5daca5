//! Configuration module for the Mimic runtime.
//!
//! Configuration is layered with figment: built-in defaults, `mimic.toml` in
//! the plugin data directory with an optional profile overlay, `MIMIC_*`
//! environment variables and programmatic overrides.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, MimicConfig,
    SchedulerConfig, SpanEventConfig,
};
pub use validation::validate_config;
