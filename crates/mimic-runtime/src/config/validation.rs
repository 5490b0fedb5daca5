//! Configuration validation utilities.

use std::collections::HashSet;

use mimic_core::BridgeConfig;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LoggingConfig, MimicConfig, SchedulerConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &MimicConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_bridge_config(&config.bridge)?;
    validate_scheduler_config(&config.scheduler)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if let Some(path) = &logging.file_path {
        if path.file_name().is_none() {
            return Err(ConfigError::validation(format!(
                "Log file path '{}' does not name a file",
                path.display()
            )));
        }
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: '{module}'"
            )));
        }
    }

    Ok(())
}

/// Every bridged type needs at least one candidate, and candidates within a
/// list must be distinct.
fn validate_bridge_config(bridge: &BridgeConfig) -> ConfigResult<()> {
    for (name, candidates) in bridge.entries() {
        if candidates.is_empty() {
            return Err(ConfigError::EmptyCandidates(name));
        }

        let mut seen = HashSet::new();
        for candidate in candidates {
            if candidate.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "Bridge type '{name}' has a blank candidate"
                )));
            }
            if !seen.insert(candidate) {
                return Err(ConfigError::validation(format!(
                    "Bridge type '{name}' lists '{candidate}' twice"
                )));
            }
        }
    }

    Ok(())
}

fn validate_scheduler_config(scheduler: &SchedulerConfig) -> ConfigResult<()> {
    if scheduler.sync_queue_capacity == 0 {
        return Err(ConfigError::validation(
            "Sync queue capacity must be greater than 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, LogOutput};

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&MimicConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_candidates() {
        let mut config = MimicConfig::default();
        config.bridge.sound_stop.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::EmptyCandidates("sound_stop"))
        ));
    }

    #[test]
    fn test_validate_duplicate_candidate() {
        let mut config = MimicConfig::default();
        config.bridge.key = vec!["a.Key".into(), "a.Key".into()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_log_file_path() {
        let mut config = MimicConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_ok());

        config.logging.file_path = Some("logs/..".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.logging.file_path = Some("logs/mimic.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_queue_capacity() {
        let mut config = MimicConfig::default();
        config.scheduler.sync_queue_capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_filter_target() {
        let mut config = MimicConfig::default();
        config
            .logging
            .filters
            .insert("mimic framework".into(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }
}
