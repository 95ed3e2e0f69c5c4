use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::version::ConfigVersion;
use crate::supervisor::process::CollectorState;

/// A point-in-time health read on the supervised Collector process,
/// published on [`crate::event::AgentEvent::HealthChanged`] whenever it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    pub state: CollectorState,
    pub pid: Option<u32>,
    pub uptime: Duration,
    pub restart_count: u32,
    pub last_error: Option<String>,
    /// The `ConfigVersion` of the Collector actually active right now
    /// (§3, §4.8) — the Supervisor's own record of what it last swapped
    /// to, not merely the last config the Engine generated. `None` when no
    /// Collector has ever been successfully started.
    pub active_version: Option<ConfigVersion>,
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        matches!(self.state, CollectorState::Ready)
    }
}
