//! Node provisioning through capmc
//!
//! A provisioning run reconfigures one KNL node into the hardware profile named by the
//! requested AOE and waits for it to come back:
//!
//! 1. Parse the vnode (`<prefix>_<nid>`) and AOE (`<numa_mode>_<cache_percent>`).
//! 2. Run `set_numa_cfg`, `set_mcdram_cfg` and `node_reinit`, in that order. The first
//!    non-zero exit rejects the request and nothing further is run.
//! 3. Poll `node_status` until the nid is listed as ready or the attempt budget is
//!    spent.
//!
//! Every path through [`Provisioner::provision`] ends in exactly one [`Outcome`].
//! Hardware commands already issued are never rolled back.

pub mod capmc;
pub mod error;
pub mod outcome;
pub mod poll;
pub mod request;

pub use capmc::{CapmcCommand, CommandOutput, CommandRunner, NodeStatus, ProcessRunner};
pub use error::{ProvisionError, REBOOT_FAILED_MESSAGE};
pub use outcome::{HookEvent, Outcome};
pub use poll::{PollState, Sleeper, ThreadSleeper, wait_until_ready};
pub use request::{AoeProfile, ProvisionRequest};

use log::{debug, error, info};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::config::{CapmcConfig, PollConfig};
use capmc::CapmcResponse;

/// The capmc calls for one node, in the order they are issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub set_numa_cfg: CapmcCommand,
    pub set_mcdram_cfg: CapmcCommand,
    pub node_reinit: CapmcCommand,
    pub node_status: CapmcCommand,
}

impl CommandPlan {
    pub fn new(program: &str, nid: u64, profile: &AoeProfile) -> Self {
        Self {
            set_numa_cfg: CapmcCommand::set_numa_cfg(program, nid, &profile.numa_mode),
            set_mcdram_cfg: CapmcCommand::set_mcdram_cfg(program, nid, &profile.cache_percent),
            node_reinit: CapmcCommand::node_reinit(program, nid),
            node_status: CapmcCommand::node_status(program, nid),
        }
    }

    /// Configuration commands; the reboot must come last
    pub fn configuration_steps(&self) -> [&CapmcCommand; 3] {
        [&self.set_numa_cfg, &self.set_mcdram_cfg, &self.node_reinit]
    }
}

/// Drives capmc for a single provisioning request
pub struct Provisioner<'a> {
    capmc: &'a CapmcConfig,
    poll: &'a PollConfig,
    runner: &'a dyn CommandRunner,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        capmc: &'a CapmcConfig,
        poll: &'a PollConfig,
        runner: &'a dyn CommandRunner,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            capmc,
            poll,
            runner,
            sleeper,
        }
    }

    /// Provision the node and decide whether the scheduler should accept.
    ///
    /// Never fails and never panics: errors and panics inside the run become a
    /// [`Outcome::Rejected`].
    pub fn provision(&self, request: &ProvisionRequest) -> Outcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.try_provision(request)));

        let outcome = match result {
            Ok(Ok(())) => {
                debug!("Ready to accept");
                Outcome::accepted()
            }
            Ok(Err(e)) => e.into_outcome(),
            Err(payload) => ProvisionError::Panicked(panic_message(payload)).into_outcome(),
        };

        match &outcome {
            Outcome::Accepted { .. } => info!(
                "Provisioned {} with aoe {}",
                request.vnode, request.aoe
            ),
            Outcome::Rejected { message, code } => error!(
                "Rejecting provisioning of {} with aoe {}: {} (code {:?})",
                request.vnode, request.aoe, message, code
            ),
        }
        outcome
    }

    fn try_provision(&self, request: &ProvisionRequest) -> Result<(), ProvisionError> {
        debug!("vnode: {}", request.vnode);
        debug!("aoe: {}", request.aoe);

        let profile = request.profile()?;
        let nid = request.nid()?;
        let plan = CommandPlan::new(&self.capmc.executable, nid, &profile);

        debug!("numa cmd: {}", plan.set_numa_cfg);
        debug!("cache cmd: {}", plan.set_mcdram_cfg);
        debug!("power reinit cmd: {}", plan.node_reinit);

        for cmd in plan.configuration_steps() {
            let output = self.runner.run(cmd)?.check(cmd)?;
            let response: CapmcResponse = output.decode(cmd)?;
            debug!(
                "{} return code: {} err_msg: {}",
                cmd, output.return_code, response.err_msg
            );
        }

        let state = wait_until_ready(self.runner, self.sleeper, &plan.node_status, nid, self.poll)?;
        if state.ready {
            Ok(())
        } else {
            Err(ProvisionError::NotReady {
                attempts: state.attempts_used,
                code: self.poll.reboot_failure_code,
            })
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "provisioning panicked".to_string()
    }
}
