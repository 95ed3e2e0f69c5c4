//! Lightweight publish/subscribe primitives used to move events between the
//! threads that make up the agent (discovery methods, the supervisor's
//! process thread, the orchestrator loop, API handlers).

pub mod cancellation;
pub mod channel;

use crate::discovery::DiscoverySnapshot;
use crate::generator::GeneratedConfig;
use crate::supervisor::health::HealthState;

/// Events published by the orchestrator loop that the Control API and
/// self-telemetry subsystem observe.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    DiscoveryCompleted(DiscoverySnapshot),
    ConfigGenerated(GeneratedConfig),
    ApplySucceeded { version: u64 },
    ApplyFailed { reason: String },
    HealthChanged(HealthState),
}
