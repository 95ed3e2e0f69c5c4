use std::time::Duration;

use crate::supervisor::error::SupervisorError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Polls a Collector's health endpoint. A trait so the blue-green swap
/// (§4.6) and its tests don't depend on a real `otelcol` binary exposing a
/// real HTTP health check.
pub trait HealthProbe: Send + Sync {
    /// `Ok(true)` if the endpoint reports ready, `Ok(false)` if it
    /// responded but isn't ready yet, `Err` if the endpoint could not be
    /// reached at all (treated the same as "not ready" by callers, but kept
    /// distinct for logging).
    fn poll_ready(&self, health_address: &str) -> Result<bool, SupervisorError>;
}

/// Polls `http://<health_address>/ready` with a short timeout, the shape
/// the Collector's own health extension exposes.
pub struct HttpHealthProbe {
    client: reqwest::blocking::Client,
}

impl HttpHealthProbe {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::builder()
                .timeout(PROBE_TIMEOUT)
                .build()
                .expect("health probe client builds with a static config"),
        }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthProbe for HttpHealthProbe {
    fn poll_ready(&self, health_address: &str) -> Result<bool, SupervisorError> {
        let url = format!("http://{health_address}/ready");
        match self.client.get(&url).send() {
            Ok(response) => Ok(response.status().is_success()),
            Err(err) => Err(SupervisorError::HealthCheckFailed(err.to_string())),
        }
    }
}
