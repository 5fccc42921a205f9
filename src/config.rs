//! Layered configuration for the provisioning hook
//!
//! Configuration is read from TOML files in priority order (later files override
//! earlier ones key by key):
//!
//! 1. System: `/etc/knl-provision/config.toml`
//! 2. User: `<config dir>/knl-provision/config.toml`
//! 3. Local: `knl-provision.toml` in the current directory
//!
//! Missing files are skipped. Command-line flags and environment variables are
//! applied on top by the hook binary.

pub mod capmc;
pub mod poll;

pub use capmc::CapmcConfig;
pub use poll::PollConfig;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Format, Toml};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Candidate configuration file locations
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// System-wide configuration file
    pub system: PathBuf,

    /// Per-user configuration file, if a config directory can be determined
    pub user: Option<PathBuf>,

    /// Configuration file in the current working directory
    pub local: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Self {
        Self {
            system: PathBuf::from("/etc/knl-provision/config.toml"),
            user: dirs::config_dir().map(|dir| dir.join("knl-provision").join("config.toml")),
            local: PathBuf::from("knl-provision.toml"),
        }
    }

    /// Directory holding the user configuration file
    pub fn user_config_dir(&self) -> Option<&Path> {
        self.user.as_deref().and_then(Path::parent)
    }

    /// Paths that exist on disk, lowest priority first
    pub fn existing_paths(&self) -> Vec<&PathBuf> {
        std::iter::once(&self.system)
            .chain(self.user.iter())
            .chain(std::iter::once(&self.local))
            .filter(|path| path.is_file())
            .collect()
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level hook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// capmc location
    pub capmc: CapmcConfig,

    /// Readiness polling
    pub poll: PollConfig,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            capmc: CapmcConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl HookConfig {
    /// Load configuration from the standard locations
    pub fn load() -> Result<Self> {
        Self::load_with_paths(&ConfigPaths::new())
    }

    pub fn load_with_paths(paths: &ConfigPaths) -> Result<Self> {
        let files: Vec<PathBuf> = paths.existing_paths().into_iter().cloned().collect();
        Self::load_from_files(&files)
    }

    /// Load configuration by merging the given files in order.
    ///
    /// Files that do not exist are skipped.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self> {
        let mut figment = Figment::new();
        for path in files {
            if !path.is_file() {
                debug!("Skipping missing config file {}", path.display());
                continue;
            }
            debug!("Loading config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().context("Failed to load configuration")
    }

    /// Check every setting and collect all problems found
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {}, got '{}'",
                VALID_LOG_LEVELS.join(", "),
                self.log_level
            ));
        }
        if self.capmc.executable.trim().is_empty() {
            errors.push("capmc.executable must not be empty".to_string());
        }
        if self.poll.max_attempts == 0 {
            errors.push("poll.max_attempts must be at least 1".to_string());
        }
        if self.poll.reboot_failure_code == 0 {
            errors.push("poll.reboot_failure_code must be non-zero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Commented default configuration suitable for writing to a new file
    pub fn generate_default_config() -> String {
        let body = Self::default()
            .to_toml()
            .unwrap_or_else(|_| String::from("[capmc]\n\n[poll]\n"));
        format!(
            "# knl-provision configuration\n\
             # Later files override earlier ones: /etc/knl-provision/config.toml,\n\
             # ~/.config/knl-provision/config.toml, ./knl-provision.toml\n\n{}",
            body
        )
    }
}
