//! Errors raised while provisioning a node

use thiserror::Error;

use super::outcome::Outcome;

/// Message reported when the node never comes back after the reboot
pub const REBOOT_FAILED_MESSAGE: &str = "Provisioning with reboot failed";

/// Everything that can end a provisioning run early
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Malformed `vnode` or `aoe` input
    #[error("{0}")]
    Parse(String),

    /// capmc exited with a non-zero return code
    #[error("Error while running {command}: {stderr}")]
    CommandFailed {
        command: String,
        stderr: String,
        return_code: i32,
    },

    /// The node did not report ready within the poll budget
    #[error("Provisioning with reboot failed")]
    NotReady { attempts: u32, code: i32 },

    /// capmc could not be started at all
    #[error("Caught exception : failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// capmc succeeded but its output was not the expected JSON payload
    #[error("Caught exception : invalid output from {command}: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// The environment needed to reach capmc could not be prepared
    #[error("Caught exception : {0}")]
    Setup(String),

    /// A panic escaped the provisioning flow
    #[error("Caught exception : {0}")]
    Panicked(String),
}

impl ProvisionError {
    /// Reason code handed to the scheduler alongside the rejection message
    pub fn reason_code(&self) -> Option<i32> {
        match self {
            Self::Parse(_) | Self::Decode { .. } | Self::Setup(_) | Self::Panicked(_) => None,
            Self::CommandFailed { return_code, .. } => Some(*return_code),
            Self::NotReady { code, .. } => Some(*code),
            Self::Spawn { source, .. } => source.raw_os_error(),
        }
    }

    pub fn into_outcome(self) -> Outcome {
        Outcome::Rejected {
            message: self.to_string(),
            code: self.reason_code(),
        }
    }
}
