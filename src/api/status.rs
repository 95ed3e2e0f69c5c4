use serde::Serialize;

use crate::supervisor::HealthState;

/// The `/v1/status` response body: aggregated Collector health plus the
/// active configuration version (§4.8 table, §3's `HealthState`).
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub health: HealthState,
    pub active_config_version: Option<u64>,
    pub orchestrator_state: String,
}
