use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::api::token_store::SharedTokenStore;
use crate::config::engine::Engine;
use crate::discovery::engine::DiscoveryEngine;
use crate::orchestrator::Orchestrator;
use crate::supervisor::Supervisor;
use crate::telemetry::Metrics;

/// Everything a handler needs, shared read-only (beyond the interior
/// mutability each collaborator already provides) across the worker pool.
pub struct ApiState {
    pub engine: Arc<Engine>,
    pub discovery: Arc<DiscoveryEngine>,
    pub supervisor: Arc<Supervisor>,
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: Arc<Metrics>,
    pub token_store: SharedTokenStore,
    pub rate_limiter: Arc<RateLimiter>,
}
