//! Provisioning request parsing

use serde::{Deserialize, Serialize};

use super::error::ProvisionError;

/// The vnode and AOE handed over by the scheduler's provisioning event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    /// Scheduler vnode name, e.g. `nid_1042`
    pub vnode: String,

    /// Requested AOE, `<numa_mode>_<cache_percent>`, e.g. `a2a_50`
    pub aoe: String,
}

/// Hardware profile requested through the AOE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AoeProfile {
    pub numa_mode: String,
    pub cache_percent: String,
}

impl ProvisionRequest {
    pub fn new(vnode: impl Into<String>, aoe: impl Into<String>) -> Self {
        Self {
            vnode: vnode.into(),
            aoe: aoe.into(),
        }
    }

    /// Split the AOE into NUMA mode and MCDRAM cache percentage
    pub fn profile(&self) -> Result<AoeProfile, ProvisionError> {
        parse_aoe(&self.aoe)
    }

    /// Numeric node id taken from the vnode name
    pub fn nid(&self) -> Result<u64, ProvisionError> {
        parse_nid(&self.vnode)
    }
}

/// Parse `<numa_mode>_<cache_percent>`; both parts must be present and non-empty.
pub fn parse_aoe(aoe: &str) -> Result<AoeProfile, ProvisionError> {
    let parts: Vec<&str> = aoe.split('_').collect();
    match parts.as_slice() {
        [numa_mode, cache_percent] if !numa_mode.is_empty() && !cache_percent.is_empty() => {
            Ok(AoeProfile {
                numa_mode: numa_mode.to_string(),
                cache_percent: cache_percent.to_string(),
            })
        }
        _ => Err(ProvisionError::Parse(format!(
            "Invalid aoe '{}': expected <numa_mode>_<cache_percent>",
            aoe
        ))),
    }
}

/// Take the second `_`-separated segment of the vnode name as the node id.
pub fn parse_nid(vnode: &str) -> Result<u64, ProvisionError> {
    let segment = vnode.split('_').nth(1).ok_or_else(|| {
        ProvisionError::Parse(format!(
            "Invalid vnode '{}': expected <prefix>_<nid>",
            vnode
        ))
    })?;

    segment.parse::<u64>().map_err(|e| {
        ProvisionError::Parse(format!(
            "Invalid vnode '{}': node id '{}' is not numeric: {}",
            vnode, segment, e
        ))
    })
}
