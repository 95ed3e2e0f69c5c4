use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::discovery::service::Service;

/// The result of one discovery cycle: every correlated service found, in a
/// stable order, tagged with a monotonically increasing id so downstream
/// consumers (the generator, the orchestrator, the control API) can tell
/// snapshots apart without relying on wall-clock time alone. `created_at`
/// carries the wall-clock timestamp (§3) for baseline reporting and
/// display; it plays no role in ordering or correlation, which is why
/// correlation (§8) stays deterministic independent of when it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySnapshot {
    pub id: u64,
    pub services: Vec<Service>,
    pub scan_duration: Duration,
    pub created_at: DateTime<Utc>,
}

impl DiscoverySnapshot {
    pub fn new(id: u64, services: Vec<Service>, scan_duration: Duration) -> Self {
        Self {
            id,
            services,
            scan_duration,
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
