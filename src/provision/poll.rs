//! Waiting for a rebooted node to report ready

use log::debug;
use std::thread;
use std::time::Duration;

use super::capmc::{CapmcCommand, CommandRunner, NodeStatus};
use super::error::ProvisionError;
use crate::config::PollConfig;

/// Blocks between readiness checks
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Progress of one readiness wait
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollState {
    pub attempts_used: u32,
    pub ready: bool,
}

/// Check `node_status` until `nid` shows up in its `ready` list or the attempt budget
/// runs out. Every check is preceded by one full poll interval.
///
/// A failing `node_status` call aborts the wait with an error; running out of attempts
/// does not, the returned state simply has `ready == false`.
pub fn wait_until_ready(
    runner: &dyn CommandRunner,
    sleeper: &dyn Sleeper,
    status_cmd: &CapmcCommand,
    nid: u64,
    config: &PollConfig,
) -> Result<PollState, ProvisionError> {
    let mut state = PollState::default();

    while !state.ready && state.attempts_used < config.max_attempts {
        sleeper.sleep(config.interval());

        let output = runner.run(status_cmd)?.check(status_cmd)?;
        debug!(
            "poll_cnt: {} node_status: {}",
            state.attempts_used,
            output.stdout.trim()
        );
        let status: NodeStatus = output.decode(status_cmd)?;

        if status.is_ready(nid) {
            debug!("Node {} was successfully powered on", nid);
            state.ready = true;
        }
        state.attempts_used += 1;
    }

    Ok(state)
}
