//! Provisioning hook support for KNL compute nodes
//!
//! When a job asks for a node in a different NUMA clustering / MCDRAM cache mode, the
//! scheduler runs a provisioning hook. This crate implements that hook on top of the
//! Cray `capmc` CLI: it applies the requested modes, reboots the node, waits for it to
//! come back and tells the scheduler whether to accept or reject the request.
//!
//! The `knl-provision-hook` binary wires this library to the command line.

pub mod config;
pub mod provision;

pub use config::{CapmcConfig, ConfigPaths, HookConfig, PollConfig};
pub use provision::{
    CapmcCommand, CommandOutput, CommandPlan, CommandRunner, HookEvent, NodeStatus, Outcome,
    PollState, ProcessRunner, ProvisionError, ProvisionRequest, Provisioner, Sleeper,
    ThreadSleeper, wait_until_ready,
};
