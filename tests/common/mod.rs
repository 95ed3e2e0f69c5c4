//! Shared harness for the end-to-end scenario tests: builds a full
//! Engine/DiscoveryEngine/Supervisor/Orchestrator stack against a temp
//! directory, the same way `src/bin/main.rs` wires the composition root,
//! but with fakes standing in for the OS process and the remote service.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use nrdot_host::config::engine::Engine;
use nrdot_host::config::schema::{AutoConfigSection, UserConfig};
use nrdot_host::discovery::error::DiscoveryError;
use nrdot_host::discovery::service::{DiscoveryMethodKind, RawFinding, ServiceType};
use nrdot_host::discovery::DiscoveryEngine;
use nrdot_host::event::channel::{pub_sub, EventPublisher};
use nrdot_host::event::AgentEvent;
use nrdot_host::generator::signer::P256Signer;
use nrdot_host::generator::ConfigGenerator;
use nrdot_host::orchestrator::Orchestrator;
use nrdot_host::paths::Paths;
use nrdot_host::remote::{BaselineReport, RemoteConfigClient, RemoteConfigResponse};
use nrdot_host::supervisor::health_probe::HealthProbe;
use nrdot_host::supervisor::{HealthState, Supervisor};

/// A fixed discovery method — stands in for a live `ProcessScanner`/
/// `PortScanner` so scenarios control exactly what's "discovered" without
/// touching the real host.
pub struct FixedMethod {
    pub kind: DiscoveryMethodKind,
    pub findings: Vec<RawFinding>,
}

impl nrdot_host::discovery::methods::DiscoveryMethod for FixedMethod {
    fn kind(&self) -> DiscoveryMethodKind {
        self.kind
    }
    fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
        Ok(self.findings.clone())
    }
}

/// A discovery method that always errors, for the degradation scenario.
pub struct AlwaysFailsMethod(pub DiscoveryMethodKind);

impl nrdot_host::discovery::methods::DiscoveryMethod for AlwaysFailsMethod {
    fn kind(&self) -> DiscoveryMethodKind {
        self.0
    }
    fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
        Err(DiscoveryError::MethodFailed(format!("{:?}", self.0), "unreachable in test sandbox".to_string()))
    }
}

pub fn redis_finding() -> RawFinding {
    RawFinding {
        service_type: ServiceType::Redis,
        endpoint: "127.0.0.1:6379".to_string(),
        method: DiscoveryMethodKind::PortScan,
        config_path: None,
        process_name: None,
    }
}

pub struct AlwaysReady;
impl HealthProbe for AlwaysReady {
    fn poll_ready(&self, _health_address: &str) -> Result<bool, nrdot_host::supervisor::SupervisorError> {
        Ok(true)
    }
}

/// A transport that always returns a single, fixed remote response —
/// either an override document or "unchanged".
pub struct FixedTransport(pub RemoteConfigResponse);

impl nrdot_host::remote::RemoteConfigTransport for FixedTransport {
    fn fetch(&self, _report: &BaselineReport) -> Result<RemoteConfigResponse, nrdot_host::remote::RemoteConfigError> {
        Ok(self.0.clone())
    }
}

pub fn paths(dir: &tempfile::TempDir) -> Paths {
    Paths::new(dir.path().join("config"), dir.path().join("data"), dir.path().join("log"))
}

pub fn user_config() -> UserConfig {
    UserConfig {
        license_key: "test-license-key".to_string(),
        service: Default::default(),
        auto_config: AutoConfigSection {
            scan_interval: Duration::from_secs(30),
            ..Default::default()
        },
        api: Default::default(),
        logging: Default::default(),
    }
}

pub fn engine() -> Arc<Engine> {
    let pem = P256Signer::generate_pkcs8_pem().unwrap();
    let signer = Arc::new(P256Signer::from_pkcs8_pem(&pem).unwrap());
    Arc::new(Engine::new(ConfigGenerator::new(signer)))
}

pub fn discovery_with_findings(findings: Vec<RawFinding>) -> Arc<DiscoveryEngine> {
    Arc::new(DiscoveryEngine::with_methods(
        vec![Arc::new(FixedMethod { kind: DiscoveryMethodKind::PortScan, findings })],
        Duration::from_millis(500),
    ))
}

pub fn empty_discovery() -> Arc<DiscoveryEngine> {
    discovery_with_findings(Vec::new())
}

/// A supervisor wired against `yes` in place of a real Collector binary.
/// `yes` runs until killed, repeating its argv forever, and blocks once its
/// unread `Stdio::piped()` stdout fills — so the fake candidate stays alive
/// for the duration of a test instead of racing the `status()` assertion
/// against its own exit the way a quick-exiting binary like `true` would.
/// `Supervisor::stop`/the next swap's drain always reaps it with SIGTERM.
pub fn supervisor(dir: &tempfile::TempDir, probe: Arc<dyn HealthProbe>) -> Arc<Supervisor> {
    Arc::new(
        Supervisor::new(paths(dir), None, probe)
            .with_binary("yes")
            .with_timeouts(Duration::from_millis(500), Duration::from_millis(200))
            .with_health_polling(Duration::from_millis(10), 2),
    )
}

/// A probe that's ready until flipped off, for scenarios that need the
/// first swap to succeed and a later one to fail.
pub struct ToggleableProbe(pub Arc<std::sync::atomic::AtomicBool>);

impl HealthProbe for ToggleableProbe {
    fn poll_ready(&self, _health_address: &str) -> Result<bool, nrdot_host::supervisor::SupervisorError> {
        Ok(self.0.load(std::sync::atomic::Ordering::SeqCst))
    }
}

pub fn orchestrator_parts() -> (EventPublisher<AgentEvent>, nrdot_host::event::channel::EventConsumer<AgentEvent>) {
    pub_sub::<AgentEvent>()
}

#[allow(clippy::too_many_arguments)]
pub fn orchestrator(
    engine: Arc<Engine>,
    discovery: Arc<DiscoveryEngine>,
    supervisor: Arc<Supervisor>,
    remote: Option<Arc<RemoteConfigClient>>,
    user: UserConfig,
    events: EventPublisher<AgentEvent>,
) -> Orchestrator {
    Orchestrator::with_host_identity(
        engine,
        discovery,
        supervisor,
        remote,
        user,
        events,
        "test-host-id".to_string(),
        "test-host".to_string(),
    )
}

pub fn exclude_none() -> HashSet<String> {
    HashSet::new()
}

pub fn assert_healthy(health: &HealthState) {
    assert!(health.is_healthy(), "expected collector to be healthy, got {health:?}");
}
