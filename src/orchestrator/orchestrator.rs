use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, tick, Receiver, Sender};

use crate::config::engine::Engine;
use crate::config::fragments::RenderedDocument;
use crate::config::schema::UserConfig;
use crate::discovery::engine::DiscoveryEngine;
use crate::discovery::snapshot::DiscoverySnapshot;
use crate::event::cancellation::CancellationMessage;
use crate::event::channel::{EventConsumer, EventPublisher};
use crate::event::AgentEvent;
use crate::generator::GeneratedConfig;
use crate::orchestrator::error::OrchestratorError;
use crate::orchestrator::state::{CycleOutcome, OrchestratorState};
use crate::remote::baseline::{BaselineReport, RemoteConfigResponse};
use crate::remote::client::RemoteConfigClient;
use crate::supervisor::supervisor::{ApplyOutcome, Supervisor};
use crate::telemetry::Metrics;

const DEFAULT_REMOTE_FETCH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Freshness window used by C9's readiness computation: a discovery cycle
/// is considered stale once it's older than twice the engine's scan
/// interval.
pub const DISCOVERY_STALENESS_FACTOR: u32 = 2;

struct SharedState {
    user_config: UserConfig,
    current_state: OrchestratorState,
    last_discovery_completed_at: Option<Instant>,
    last_snapshot: Option<DiscoverySnapshot>,
    last_cycle_outcome: Option<CycleOutcome>,
}

/// The single long-running loop tying discovery, generation, and the
/// supervisor's swap together (§4.7). Owns no OS thread itself — callers
/// drive `run_cycle` directly (for CLI one-shot invocations, tests, and the
/// `/v1/config/reload` handler) or wrap it in a
/// [`crate::utils::thread_context::NotStartedThreadContext`] for the
/// steady-state timer loop.
pub struct Orchestrator {
    engine: Arc<Engine>,
    discovery: Arc<DiscoveryEngine>,
    supervisor: Arc<Supervisor>,
    remote: Option<Arc<RemoteConfigClient>>,
    host_id: String,
    hostname: String,
    events: EventPublisher<AgentEvent>,
    state: RwLock<SharedState>,
    trigger_tx: Sender<()>,
    trigger_rx: Receiver<()>,
    remote_fetch_interval: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<Engine>,
        discovery: Arc<DiscoveryEngine>,
        supervisor: Arc<Supervisor>,
        remote: Option<Arc<RemoteConfigClient>>,
        user_config: UserConfig,
        events: EventPublisher<AgentEvent>,
    ) -> Self {
        Self::with_host_identity(
            engine,
            discovery,
            supervisor,
            remote,
            user_config,
            events,
            "unknown-host".to_string(),
            crate::remote::hostname(),
        )
    }

    /// As [`Self::new`], but with an explicit, persisted host identifier
    /// (§4.5's baseline report needs one stable across restarts). The
    /// composition root loads this once via
    /// [`crate::remote::load_or_create_host_id`] and threads it in here.
    #[allow(clippy::too_many_arguments)]
    pub fn with_host_identity(
        engine: Arc<Engine>,
        discovery: Arc<DiscoveryEngine>,
        supervisor: Arc<Supervisor>,
        remote: Option<Arc<RemoteConfigClient>>,
        user_config: UserConfig,
        events: EventPublisher<AgentEvent>,
        host_id: String,
        hostname: String,
    ) -> Self {
        let (trigger_tx, trigger_rx) = bounded(1);
        Self {
            engine,
            discovery,
            supervisor,
            remote,
            host_id,
            hostname,
            events,
            state: RwLock::new(SharedState {
                user_config,
                current_state: OrchestratorState::Idle,
                last_discovery_completed_at: None,
                last_snapshot: None,
                last_cycle_outcome: None,
            }),
            trigger_tx,
            trigger_rx,
            remote_fetch_interval: DEFAULT_REMOTE_FETCH_INTERVAL,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// Collapses an external trigger (API call, file-watch, SIGHUP-
    /// equivalent) into a pending immediate cycle. Repeated triggers before
    /// the pending one runs are dropped, per §4.7 (bounded(1) + try_send).
    pub fn trigger(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    pub fn current_state(&self) -> OrchestratorState {
        self.state.read().expect("orchestrator state poisoned").current_state
    }

    pub fn last_discovery_snapshot(&self) -> Option<DiscoverySnapshot> {
        self.state
            .read()
            .expect("orchestrator state poisoned")
            .last_snapshot
            .clone()
    }

    /// Whether the most recent discovery cycle completed within
    /// `DISCOVERY_STALENESS_FACTOR` times the configured scan interval,
    /// folded into C9's readiness signal.
    pub fn discovery_is_fresh(&self) -> bool {
        let state = self.state.read().expect("orchestrator state poisoned");
        let Some(completed_at) = state.last_discovery_completed_at else {
            return false;
        };
        let staleness_window = state.user_config.auto_config.scan_interval * DISCOVERY_STALENESS_FACTOR;
        completed_at.elapsed() <= staleness_window
    }

    pub fn replace_user_config(&self, user_config: UserConfig) {
        self.state.write().expect("orchestrator state poisoned").user_config = user_config;
    }

    pub fn user_config(&self) -> UserConfig {
        self.state.read().expect("orchestrator state poisoned").user_config.clone()
    }

    pub fn last_cycle_outcome(&self) -> Option<CycleOutcome> {
        self.state
            .read()
            .expect("orchestrator state poisoned")
            .last_cycle_outcome
            .clone()
    }

    fn set_state(&self, next: OrchestratorState) {
        let mut state = self.state.write().expect("orchestrator state poisoned");
        let previous = state.current_state;
        state.current_state = next;
        tracing::info!(?previous, ?next, "orchestrator state transition");
    }

    /// Runs one full pass of the state machine: Discovering → Reporting →
    /// Fetching → Generating → Applying → Idle. Returns to Idle early (with
    /// [`CycleOutcome::NoChange`]) when the diff against the active config
    /// is empty.
    pub fn run_cycle(&self) -> Result<CycleOutcome, OrchestratorError> {
        let user_config = self
            .state
            .read()
            .expect("orchestrator state poisoned")
            .user_config
            .clone();

        self.set_state(OrchestratorState::Discovering);
        let exclude: HashSet<String> = user_config.auto_config.exclude_services.clone();
        let discovery_started = Instant::now();
        let snapshot = self.discovery.run_cycle(&exclude)?;
        if let Some(metrics) = &self.metrics {
            metrics
                .discovery_cycle_duration_seconds
                .observe(discovery_started.elapsed().as_secs_f64());
        }
        self.events.publish(AgentEvent::DiscoveryCompleted(snapshot.clone())).ok();
        {
            let mut state = self.state.write().expect("orchestrator state poisoned");
            state.last_discovery_completed_at = Some(Instant::now());
            state.last_snapshot = Some(snapshot.clone());
        }

        self.set_state(OrchestratorState::Reporting);
        let active_version = self.supervisor.status().active_version;
        let report = BaselineReport::new(
            self.host_id.clone(),
            self.hostname.clone(),
            active_version.map(|v| v.0),
            snapshot.services.clone(),
        );

        self.set_state(OrchestratorState::Fetching);
        let fetched = self.fetch_remote(&report);

        // Captured before `generate` below pushes the new candidate into
        // the engine's history (engine.rs's `generate` always does this,
        // applied or not) — otherwise `engine.current()` would return the
        // candidate itself and every diff against it would be empty.
        let previous_fragments = self
            .engine
            .current()
            .map(|c| c.fragments.clone())
            .unwrap_or_default();

        self.set_state(OrchestratorState::Generating);
        let effective_user_config = fetched.unwrap_or(user_config);
        let generation_started = Instant::now();
        let candidate = self.engine.generate(&effective_user_config, &snapshot)?;
        if let Some(metrics) = &self.metrics {
            metrics
                .generation_duration_seconds
                .observe(generation_started.elapsed().as_secs_f64());
        }
        self.events.publish(AgentEvent::ConfigGenerated(candidate.clone())).ok();

        let diff = self.engine.diff(&previous_fragments, &candidate.fragments);
        if diff.is_empty() {
            self.set_state(OrchestratorState::Idle);
            self.record_outcome(CycleOutcome::NoChange);
            return Ok(CycleOutcome::NoChange);
        }

        self.set_state(OrchestratorState::Applying);
        let outcome = self.apply_with_rollback(&candidate)?;
        self.set_state(OrchestratorState::Idle);
        self.record_outcome(outcome.clone());
        Ok(outcome)
    }

    fn record_outcome(&self, outcome: CycleOutcome) {
        self.state.write().expect("orchestrator state poisoned").last_cycle_outcome = Some(outcome);
    }

    /// Best-effort remote fetch: any failure (transport, cache miss) simply
    /// falls back to local-only generation per §4.5's "Orchestrator falls
    /// back to a config generated purely from local discovery."
    fn fetch_remote(&self, report: &BaselineReport) -> Option<UserConfig> {
        let remote = self.remote.as_ref()?;
        match remote.fetch(report) {
            Ok(RemoteConfigResponse::Updated { document, .. }) => {
                serde_json::from_value(document).ok()
            }
            Ok(RemoteConfigResponse::Unchanged) | Err(_) => None,
        }
    }

    fn apply_with_rollback(&self, candidate: &GeneratedConfig) -> Result<CycleOutcome, OrchestratorError> {
        match self.supervisor.apply(candidate)? {
            ApplyOutcome::Applied { version } => {
                if let Some(metrics) = &self.metrics {
                    metrics.apply_success_total.inc();
                }
                self.events
                    .publish(AgentEvent::ApplySucceeded { version: version.0 })
                    .ok();
                Ok(CycleOutcome::Applied { version: version.0 })
            }
            ApplyOutcome::Failed { reason, .. } => {
                if let Some(metrics) = &self.metrics {
                    metrics.apply_failure_total.inc();
                }
                self.events
                    .publish(AgentEvent::ApplyFailed { reason: reason.to_string() })
                    .ok();
                let rolled_back = match self.engine.rollback() {
                    Ok(previous) => matches!(
                        self.supervisor.apply(&previous),
                        Ok(ApplyOutcome::Applied { .. })
                    ),
                    Err(_) => false,
                };
                if rolled_back {
                    if let Some(metrics) = &self.metrics {
                        metrics.rollback_total.inc();
                    }
                }
                Ok(CycleOutcome::AppliedFailure { rolled_back })
            }
        }
    }

    /// The steady-state background loop: wakes on a discovery timer, a
    /// remote-fetch timer, or an external trigger, whichever fires first,
    /// and runs one cycle each time. Intended to be handed to a
    /// [`crate::utils::thread_context::NotStartedThreadContext`].
    pub fn run_forever(&self, stop: EventConsumer<CancellationMessage>) {
        let scan_interval = self
            .state
            .read()
            .expect("orchestrator state poisoned")
            .user_config
            .auto_config
            .scan_interval;
        let discovery_tick = tick(scan_interval);
        let remote_tick = tick(self.remote_fetch_interval);

        loop {
            if stop.is_cancelled(Duration::from_millis(1)) {
                return;
            }

            crossbeam::channel::select! {
                recv(discovery_tick) -> _ => { let _ = self.run_cycle(); }
                recv(remote_tick) -> _ => { let _ = self.run_cycle(); }
                recv(self.trigger_rx) -> _ => { let _ = self.run_cycle(); }
                default(Duration::from_millis(200)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::error::DiscoveryError;
    use crate::discovery::methods::DiscoveryMethod;
    use crate::discovery::service::{DiscoveryMethodKind, RawFinding, ServiceType};
    use crate::event::channel::pub_sub;
    use crate::generator::signer::P256Signer;
    use crate::generator::ConfigGenerator;
    use crate::supervisor::error::SupervisorError;
    use crate::supervisor::health_probe::HealthProbe;
    use tempfile::tempdir;

    struct AlwaysReady;
    impl HealthProbe for AlwaysReady {
        fn poll_ready(&self, _health_address: &str) -> Result<bool, SupervisorError> {
            Ok(true)
        }
    }

    struct StubMethod;
    impl DiscoveryMethod for StubMethod {
        fn kind(&self) -> DiscoveryMethodKind {
            DiscoveryMethodKind::PortScan
        }
        fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
            Ok(vec![RawFinding {
                service_type: ServiceType::Redis,
                endpoint: "127.0.0.1:6379".to_string(),
                method: DiscoveryMethodKind::PortScan,
                config_path: None,
                process_name: None,
            }])
        }
    }

    fn user_config() -> UserConfig {
        UserConfig {
            license_key: "k".to_string(),
            service: Default::default(),
            auto_config: Default::default(),
            api: Default::default(),
            logging: Default::default(),
        }
    }

    fn orchestrator(dir: &tempfile::TempDir) -> Orchestrator {
        let pem = P256Signer::generate_pkcs8_pem().unwrap();
        let signer = Arc::new(P256Signer::from_pkcs8_pem(&pem).unwrap());
        let engine = Arc::new(Engine::new(ConfigGenerator::new(signer)));
        let discovery = Arc::new(DiscoveryEngine::with_methods(
            vec![Arc::new(StubMethod)],
            Duration::from_millis(200),
        ));
        let paths = crate::paths::Paths::new(
            dir.path().join("config"),
            dir.path().join("data"),
            dir.path().join("log"),
        );
        let supervisor = Arc::new(
            Supervisor::new(paths, None, Arc::new(AlwaysReady))
                .with_binary("true")
                .with_timeouts(Duration::from_millis(300), Duration::from_millis(200)),
        );
        let (publisher, _consumer) = pub_sub::<AgentEvent>();
        Orchestrator::new(engine, discovery, supervisor, None, user_config(), publisher)
    }

    #[test]
    fn trigger_coalesces_repeated_calls() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(&dir);
        orch.trigger();
        orch.trigger();
        orch.trigger();
        assert_eq!(orch.trigger_rx.len(), 1);
    }

    #[test]
    fn discovery_freshness_is_false_before_any_cycle() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(&dir);
        assert!(!orch.discovery_is_fresh());
    }

    #[test]
    #[serial_test::serial(redis_password_env)]
    fn first_cycle_with_a_discovered_service_applies_against_empty_active() {
        std::env::set_var("REDIS_PASSWORD", "secret");
        let dir = tempdir().unwrap();
        let orch = orchestrator(&dir);
        let outcome = orch.run_cycle().unwrap();
        assert!(matches!(outcome, CycleOutcome::Applied { .. }));
        assert_eq!(orch.current_state(), OrchestratorState::Idle);
        std::env::remove_var("REDIS_PASSWORD");
    }

    #[test]
    #[serial_test::serial(redis_password_env)]
    fn missing_required_env_surfaces_as_applied_failure() {
        std::env::remove_var("REDIS_PASSWORD");
        let dir = tempdir().unwrap();
        let orch = orchestrator(&dir);
        let outcome = orch.run_cycle().unwrap();
        assert!(matches!(
            outcome,
            CycleOutcome::AppliedFailure { rolled_back: false }
        ));
    }
}
