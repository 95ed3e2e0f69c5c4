use serde::{Deserialize, Serialize};

use crate::discovery::service::Service;

pub const SCHEMA_VERSION: u32 = 1;

/// A small, additive host-metadata block (§4.5). Kept intentionally sparse
/// — enough for the remote service to target OS-specific config variants
/// without this crate having to model every field it might ever want.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMetadata {
    pub os: String,
    pub arch: String,
}

impl Default for HostMetadata {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// What the agent reports to the remote config service after each
/// discovery cycle (§4.5): host identifier, hostname, the sorted services
/// from the cycle, and a small host-metadata block, alongside enough
/// versioning information for the service to decide whether it has
/// anything new to hand back. Clients must tolerate servers adding fields
/// here in the future (`schema_version` is the compatibility marker); the
/// reverse direction — servers tolerating additive fields from us — is
/// just as important, so new fields are always added with `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineReport {
    pub schema_version: u32,
    pub agent_version: String,
    pub host_id: String,
    pub hostname: String,
    #[serde(default)]
    pub host_metadata: HostMetadata,
    pub current_config_version: Option<u64>,
    pub services: Vec<Service>,
}

impl BaselineReport {
    pub fn new(
        host_id: impl Into<String>,
        hostname: impl Into<String>,
        current_config_version: Option<u64>,
        services: Vec<Service>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            host_id: host_id.into(),
            hostname: hostname.into(),
            host_metadata: HostMetadata::default(),
            current_config_version,
            services,
        }
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

/// What the remote config service hands back: either nothing changed, or a
/// fresh user-facing config document to merge in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteConfigResponse {
    Unchanged,
    Updated { remote_config_version: u64, document: serde_json::Value },
}
