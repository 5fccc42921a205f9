//! capmc command construction, execution and response decoding

use log::trace;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::error::ProvisionError;

/// One capmc invocation: program plus its ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapmcCommand {
    program: String,
    args: Vec<String>,
}

impl CapmcCommand {
    fn new(program: &str, subcommand: &str, nid: u64) -> Self {
        Self {
            program: program.to_string(),
            args: vec![
                subcommand.to_string(),
                "--nids".to_string(),
                nid.to_string(),
            ],
        }
    }

    fn with_mode(mut self, mode: &str) -> Self {
        self.args.push("--mode".to_string());
        self.args.push(mode.to_string());
        self
    }

    /// `set_numa_cfg --nids <nid> --mode <numa_mode>`
    pub fn set_numa_cfg(program: &str, nid: u64, numa_mode: &str) -> Self {
        Self::new(program, "set_numa_cfg", nid).with_mode(numa_mode)
    }

    /// `set_mcdram_cfg --nids <nid> --mode <cache_percent>`
    pub fn set_mcdram_cfg(program: &str, nid: u64, cache_percent: &str) -> Self {
        Self::new(program, "set_mcdram_cfg", nid).with_mode(cache_percent)
    }

    /// `node_reinit --nids <nid>`
    pub fn node_reinit(program: &str, nid: u64) -> Self {
        Self::new(program, "node_reinit", nid)
    }

    /// `node_status --nids <nid>`
    pub fn node_status(program: &str, nid: u64) -> Self {
        Self::new(program, "node_status", nid)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CapmcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.return_code == 0
    }

    /// Turn a non-zero exit into [`ProvisionError::CommandFailed`]
    pub fn check(self, command: &CapmcCommand) -> Result<Self, ProvisionError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ProvisionError::CommandFailed {
                command: command.to_string(),
                stderr: self.stderr.trim().to_string(),
                return_code: self.return_code,
            })
        }
    }

    /// Decode stdout as the JSON payload expected from `command`
    pub fn decode<T: DeserializeOwned>(&self, command: &CapmcCommand) -> Result<T, ProvisionError> {
        serde_json::from_str(&self.stdout).map_err(|source| ProvisionError::Decode {
            command: command.to_string(),
            source,
        })
    }
}

/// Executes capmc commands
pub trait CommandRunner {
    /// Run the command to completion. Only failure to launch is an error; a non-zero
    /// exit is reported through [`CommandOutput::return_code`].
    fn run(&self, command: &CapmcCommand) -> Result<CommandOutput, ProvisionError>;
}

/// Runs capmc as a child process with the capmc directory first on its PATH
pub struct ProcessRunner {
    search_path: OsString,
}

impl ProcessRunner {
    pub fn new(bin_dir: &Path) -> Result<Self, ProvisionError> {
        let search_path = prepend_search_path(bin_dir, env::var_os("PATH")).map_err(|e| {
            ProvisionError::Setup(format!(
                "invalid capmc directory {}: {}",
                bin_dir.display(),
                e
            ))
        })?;
        Ok(Self { search_path })
    }

    pub fn search_path(&self) -> &OsString {
        &self.search_path
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &CapmcCommand) -> Result<CommandOutput, ProvisionError> {
        trace!("Running command: {}", command);

        let output = Command::new(command.program())
            .args(command.args())
            .env("PATH", &self.search_path)
            .output()
            .map_err(|source| ProvisionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            return_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Build a PATH value with `dir` ahead of the existing entries
pub fn prepend_search_path(
    dir: &Path,
    current: Option<OsString>,
) -> Result<OsString, env::JoinPathsError> {
    let mut entries: Vec<PathBuf> = vec![dir.to_path_buf()];
    if let Some(current) = current {
        entries.extend(env::split_paths(&current));
    }
    env::join_paths(entries)
}

/// Payload returned by the configuration subcommands
#[derive(Debug, Clone, Deserialize)]
pub struct CapmcResponse {
    /// capmc error number, 0 on success
    #[serde(default)]
    pub e: Option<i64>,

    /// "Success" or a description of what went wrong
    pub err_msg: String,
}

/// Payload returned by `node_status`.
///
/// Each state key maps to the node ids currently in that state; only `ready` matters
/// here, the rest are kept for logging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub e: Option<i64>,

    #[serde(default)]
    pub err_msg: Option<String>,

    #[serde(default)]
    pub ready: Option<Vec<u64>>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl NodeStatus {
    pub fn is_ready(&self, nid: u64) -> bool {
        self.ready.as_ref().is_some_and(|ready| ready.contains(&nid))
    }
}
