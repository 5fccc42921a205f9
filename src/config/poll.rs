//! Readiness polling configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait for a rebooted node to come back.
///
/// Nodes can take upwards of 15 minutes to reboot after a NUMA/MCDRAM change, so the
/// defaults allow 20 checks spaced one minute apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum number of node_status checks
    pub max_attempts: u32,

    /// Seconds to sleep before each node_status check
    pub interval_secs: u64,

    /// Reason code reported when the node never becomes ready
    pub reboot_failure_code: i32,
}

impl PollConfig {
    /// Get the poll interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval_secs: 60,
            reboot_failure_code: 211,
        }
    }
}
