use serde::{Deserialize, Serialize};

use crate::orchestrator::Orchestrator;
use crate::supervisor::{CollectorState, Supervisor};

/// The `/ready` answer: whether the agent is fit to receive traffic-
/// affecting requests (the Control API's mutating routes) and whether its
/// telemetry is trustworthy. Distinct from `/health`, which only asks
/// whether the process is alive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    pub collector_state: CollectorState,
    pub discovery_fresh: bool,
    pub last_apply_error: Option<String>,
}

/// Folds the active Collector's health and the orchestrator's discovery
/// freshness into a single readiness verdict (§4.9). The agent is ready
/// once the Collector has reported healthy at least once and the most
/// recent discovery cycle is within twice its configured interval.
pub fn compute(supervisor: &Supervisor, orchestrator: &Orchestrator) -> Readiness {
    let health = supervisor.status();
    let discovery_fresh = orchestrator.discovery_is_fresh();
    let collector_ready = matches!(health.state, CollectorState::Ready | CollectorState::Degraded);

    Readiness {
        ready: collector_ready && discovery_fresh,
        collector_state: health.state,
        discovery_fresh,
        last_apply_error: health.last_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::engine::Engine;
    use crate::config::schema::UserConfig;
    use crate::discovery::engine::DiscoveryEngine;
    use crate::event::channel::pub_sub;
    use crate::event::AgentEvent;
    use crate::generator::signer::P256Signer;
    use crate::generator::ConfigGenerator;
    use crate::supervisor::health_probe::HealthProbe;
    use crate::supervisor::error::SupervisorError;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct NeverReady;
    impl HealthProbe for NeverReady {
        fn poll_ready(&self, _health_address: &str) -> Result<bool, SupervisorError> {
            Ok(false)
        }
    }

    #[test]
    fn freshly_constructed_agent_is_not_ready() {
        let dir = tempdir().unwrap();
        let pem = P256Signer::generate_pkcs8_pem().unwrap();
        let signer = Arc::new(P256Signer::from_pkcs8_pem(&pem).unwrap());
        let engine = Arc::new(Engine::new(ConfigGenerator::new(signer)));
        let discovery = Arc::new(DiscoveryEngine::with_methods(vec![], std::time::Duration::from_millis(200)));
        let paths = crate::paths::Paths::new(
            dir.path().join("config"),
            dir.path().join("data"),
            dir.path().join("log"),
        );
        let supervisor = Arc::new(Supervisor::new(paths, None, Arc::new(NeverReady)));
        let (publisher, _consumer) = pub_sub::<AgentEvent>();
        let orchestrator = Orchestrator::new(
            engine,
            discovery,
            supervisor.clone(),
            None,
            UserConfig {
                license_key: "k".to_string(),
                service: Default::default(),
                auto_config: Default::default(),
                api: Default::default(),
                logging: Default::default(),
            },
            publisher,
        );

        let readiness = compute(&supervisor, &orchestrator);
        assert!(!readiness.ready);
        assert!(!readiness.discovery_fresh);
    }
}
