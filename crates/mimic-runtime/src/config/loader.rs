//! Configuration loading.
//!
//! Mimic lives inside a host plugin, so configuration is read from the
//! plugin's data directory rather than from a list of search paths. Sources,
//! lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `mimic.toml` (or `mimic.yaml` / `mimic.yml`) in the data directory
//! 3. `mimic.{profile}.toml` next to it, when a profile is active
//! 4. `MIMIC_*` environment variables, `__` separating sections
//! 5. programmatic overrides
//!
//! An explicit [`ConfigLoader::file`] replaces steps 2 and 3 and must exist.
//! A data directory without a config file is normal on first start and
//! yields the defaults.
//!
//! `toml-config` *(default)* and `yaml-config` select the accepted formats.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .data_dir("plugins/mimic")
//!     .profile("staging")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::MimicConfig;

const ENV_PREFIX: &str = "MIMIC_";
const PROFILE_VAR: &str = "MIMIC_PROFILE";
const FILE_STEM: &str = "mimic";

/// Extensions tried in the data directory, in order.
const EXTENSIONS: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "toml",
    #[cfg(feature = "yaml-config")]
    "yaml",
    #[cfg(feature = "yaml-config")]
    "yml",
];

/// Builds a [`MimicConfig`] from files, environment and overrides.
pub struct ConfigLoader {
    data_dir: Option<PathBuf>,
    file: Option<PathBuf>,
    profile: Option<String>,
    env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Defaults plus environment. The profile is taken from `MIMIC_PROFILE`.
    pub fn new() -> Self {
        Self {
            data_dir: None,
            file: None,
            profile: std::env::var(PROFILE_VAR).ok().filter(|p| !p.is_empty()),
            env: true,
            overrides: Figment::new(),
        }
    }

    /// The directory holding `mimic.toml`, usually the host plugin's folder.
    pub fn data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of looking in the data directory.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Activates the `mimic.{profile}.*` overlay.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into().to_lowercase());
        self
    }

    /// Ignores `MIMIC_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Merges `config` over every other source.
    pub fn merge(mut self, config: MimicConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    pub fn load(self) -> ConfigResult<MimicConfig> {
        let mut figment = Figment::from(Serialized::defaults(MimicConfig::default()));

        match (&self.file, &self.data_dir) {
            (Some(path), _) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.clone()));
                }
                figment = merge_file(figment, path)?;
            }
            (None, Some(dir)) => figment = self.merge_data_dir(figment, dir)?,
            (None, None) => {}
        }

        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        let config: MimicConfig = figment
            .merge(self.overrides)
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("Failed to extract configuration: {e}")))?;

        debug!(
            profile = self.profile.as_deref().unwrap_or("-"),
            level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Base file first, then the profile overlay so it can refine the base.
    fn merge_data_dir(&self, mut figment: Figment, dir: &Path) -> ConfigResult<Figment> {
        match find_file(dir, FILE_STEM) {
            Some(base) => figment = merge_file(figment, &base)?,
            None => debug!(dir = %dir.display(), "No mimic config file, using defaults"),
        }

        if let Some(profile) = &self.profile {
            if let Some(overlay) = find_file(dir, &format!("{FILE_STEM}.{profile}")) {
                figment = merge_file(figment, &overlay)?;
            }
        }
        Ok(figment)
    }
}

fn find_file(dir: &Path, stem: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    info!(path = %path.display(), "Loading configuration file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================
