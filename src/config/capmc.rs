//! Configuration for the capmc node-management CLI

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location and name of the capmc executable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapmcConfig {
    /// Directory prepended to PATH for every capmc invocation
    pub bin_dir: PathBuf,

    /// Executable name (or absolute path) of the capmc binary
    pub executable: String,
}

impl Default for CapmcConfig {
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from("/opt/cray/capmc/default/bin"),
            executable: "capmc".to_string(),
        }
    }
}
