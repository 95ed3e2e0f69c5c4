use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use p256::ecdsa::VerifyingKey;

use crate::config::version::ConfigVersion;
use crate::generator::generated_config::GeneratedConfig;
use crate::paths::Paths;
use crate::supervisor::error::SupervisorError;
use crate::supervisor::health::HealthState;
use crate::supervisor::health_probe::HealthProbe;
use crate::supervisor::process::{CollectorProcess, CollectorState};
use crate::supervisor::restart::{RestartDecision, RestartPolicy};
use crate::supervisor::swap::{self, SwapPhase};

const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_CONSECUTIVE_POLLS_REQUIRED: u32 = 3;
const DEFAULT_BINARY: &str = "otelcol";
const DEFAULT_HEALTH_HOST: &str = "127.0.0.1";
const DEFAULT_HEALTH_PORT: u16 = 13133;

/// The outcome of one [`Supervisor::apply`] call. A `Failed` outcome is not
/// itself an `Err`: the apply mechanism completed its decision, it just
/// decided not to swap (§7: surfaced as `AppliedFailure` with a nested
/// reason kind, never a bare error).
#[derive(Debug)]
pub enum ApplyOutcome {
    Applied { version: ConfigVersion },
    Failed { phase: SwapPhase, reason: SupervisorError },
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}

struct ActiveCollector {
    process: CollectorProcess,
    version: ConfigVersion,
    health_address: String,
    working_dir: PathBuf,
}

struct SupervisorState {
    active: Option<ActiveCollector>,
    restart_policy: RestartPolicy,
    last_apply_outcome: Option<String>,
    degraded: bool,
}

/// Owns the Collector process end to end: launching it, swapping it for a
/// new candidate with zero observable downtime, draining the previous
/// instance, and restarting it on an unplanned exit. §3's ownership rule:
/// the Supervisor is the only thing that ever touches a [`CollectorProcess`]
/// or its working directory.
pub struct Supervisor {
    binary: String,
    paths: Paths,
    verifying_key: Option<VerifyingKey>,
    health_probe: Arc<dyn HealthProbe>,
    start_timeout: Duration,
    drain_timeout: Duration,
    health_poll_interval: Duration,
    consecutive_polls_required: u32,
    health_host: String,
    health_port: u16,
    attempt_counter: AtomicU64,
    state: Mutex<SupervisorState>,
}

impl Supervisor {
    pub fn new(paths: Paths, verifying_key: Option<VerifyingKey>, health_probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            paths,
            verifying_key,
            health_probe,
            start_timeout: DEFAULT_START_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            health_poll_interval: DEFAULT_HEALTH_POLL_INTERVAL,
            consecutive_polls_required: DEFAULT_CONSECUTIVE_POLLS_REQUIRED,
            health_host: DEFAULT_HEALTH_HOST.to_string(),
            health_port: DEFAULT_HEALTH_PORT,
            attempt_counter: AtomicU64::new(0),
            state: Mutex::new(SupervisorState {
                active: None,
                restart_policy: RestartPolicy::new(),
                last_apply_outcome: None,
                degraded: false,
            }),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeouts(mut self, start_timeout: Duration, drain_timeout: Duration) -> Self {
        self.start_timeout = start_timeout;
        self.drain_timeout = drain_timeout;
        self
    }

    /// Overrides how often [`Self::wait_for_candidate_ready`] polls the
    /// health probe and how many consecutive ready polls it requires before
    /// declaring the candidate up. Exposed mainly for tests driving a short
    /// `start_timeout`, where the 1s/3-poll defaults would time out a
    /// perfectly healthy candidate.
    pub fn with_health_polling(mut self, interval: Duration, consecutive_required: u32) -> Self {
        self.health_poll_interval = interval;
        self.consecutive_polls_required = consecutive_required.max(1);
        self
    }

    /// First launch of the Collector: fails outright if one is already
    /// running rather than silently swapping (use [`Self::apply`] for
    /// that).
    pub fn start(&self, config: &GeneratedConfig) -> Result<(), SupervisorError> {
        let mut state = self.state.lock().expect("supervisor mutex poisoned");
        if state.active.is_some() {
            return Err(SupervisorError::SpawnFailed(
                "a collector is already active; use apply() to replace it".to_string(),
            ));
        }
        match self.perform_swap(&mut state, config) {
            Ok(()) => Ok(()),
            Err((_, reason)) => Err(reason),
        }
    }

    /// The blue-green swap (§4.6). Serialized: a caller that finds an apply
    /// already running gets `Busy` immediately.
    pub fn apply(&self, config: &GeneratedConfig) -> Result<ApplyOutcome, SupervisorError> {
        let mut state = self.state.try_lock().map_err(|_| SupervisorError::Busy)?;
        match self.perform_swap(&mut state, config) {
            Ok(()) => {
                state.last_apply_outcome = Some(format!("applied {}", config.version));
                Ok(ApplyOutcome::Applied { version: config.version })
            }
            Err((phase, reason)) => {
                state.last_apply_outcome = Some(format!("failed at {phase:?}: {reason}"));
                Ok(ApplyOutcome::Failed { phase, reason })
            }
        }
    }

    pub fn stop(&self, grace: Duration) -> Result<(), SupervisorError> {
        let mut state = self.state.lock().expect("supervisor mutex poisoned");
        let Some(mut active) = state.active.take() else {
            return Ok(());
        };
        self.drain_and_stop(&mut active, grace)
    }

    pub fn status(&self) -> HealthState {
        let mut state = self.state.lock().expect("supervisor mutex poisoned");
        let degraded = state.degraded;
        match &mut state.active {
            Some(active) => {
                let alive = active.process.is_alive().unwrap_or(false);
                let reported_state = if !alive {
                    CollectorState::Failed
                } else if degraded {
                    CollectorState::Degraded
                } else {
                    active.process.state
                };
                HealthState {
                    state: reported_state,
                    pid: Some(active.process.pid()),
                    uptime: active.process.started_at.elapsed(),
                    restart_count: 0,
                    last_error: state.last_apply_outcome.clone().filter(|_| !alive || degraded),
                    active_version: Some(active.version),
                }
            }
            None => HealthState {
                state: CollectorState::Stopped,
                pid: None,
                uptime: Duration::ZERO,
                restart_count: 0,
                last_error: state.last_apply_outcome.clone(),
                active_version: None,
            },
        }
    }

    /// Called by the orchestrator's watchdog loop when it observes the
    /// active process has exited without a matching `Apply`/`Stop` call.
    /// Applies the restart policy and either relaunches `config` after the
    /// computed delay or marks the supervisor `Degraded`.
    pub fn handle_unplanned_exit(&self, config: &GeneratedConfig) -> Result<(), SupervisorError> {
        let decision = {
            let mut state = self.state.lock().expect("supervisor mutex poisoned");
            state.active = None;
            state.restart_policy.note_exit()
        };

        match decision {
            RestartDecision::Retry { delay } => {
                std::thread::sleep(delay);
                self.start(config)?;
                let mut state = self.state.lock().expect("supervisor mutex poisoned");
                state.restart_policy.note_started();
                state.degraded = false;
                Ok(())
            }
            RestartDecision::Cooldown => {
                let mut state = self.state.lock().expect("supervisor mutex poisoned");
                state.degraded = true;
                Ok(())
            }
        }
    }

    fn perform_swap(
        &self,
        state: &mut SupervisorState,
        config: &GeneratedConfig,
    ) -> Result<(), (SwapPhase, SupervisorError)> {
        swap::resolve_env(config).map_err(|e| (SwapPhase::ResolvingEnv, e))?;
        swap::verify_signature(self.verifying_key.as_ref(), config)
            .map_err(|e| (SwapPhase::ResolvingEnv, e))?;

        let attempt = self.attempt_counter.fetch_add(1, Ordering::SeqCst);
        let attempt_id = format!("{}-{attempt}", config.version);
        let working_dir = self.paths.collector_working_dir(&attempt_id);

        let config_path = swap::render_candidate(&self.paths, &attempt_id, config)
            .map_err(|e| (SwapPhase::Rendering, e))?;

        let health_address =
            swap::candidate_health_address(&self.health_host, self.health_port, attempt as u32);

        let mut candidate = match CollectorProcess::spawn(&self.binary, config_path, &working_dir, &health_address)
        {
            Ok(process) => process,
            Err(err) => {
                crate::utils::fs::remove_dir_best_effort(&working_dir);
                return Err((SwapPhase::LaunchingCandidate, err));
            }
        };

        if let Err(err) = self.wait_for_candidate_ready(&mut candidate, &health_address) {
            let _ = candidate.kill();
            crate::utils::fs::remove_dir_best_effort(&working_dir);
            return Err((SwapPhase::PollingHealth, err));
        }
        candidate.state = CollectorState::Ready;

        let new_active = ActiveCollector {
            process: candidate,
            version: config.version,
            health_address,
            working_dir,
        };

        // Linearizable swap point: from here on, Status() only ever
        // reports the new active.
        let previous = state.active.replace(new_active);
        state.restart_policy.note_started();

        if let Some(mut previous) = previous {
            previous.process.state = CollectorState::Draining;
            let _ = self.drain_and_stop(&mut previous, self.drain_timeout);
        }

        Ok(())
    }

    fn wait_for_candidate_ready(
        &self,
        candidate: &mut CollectorProcess,
        health_address: &str,
    ) -> Result<(), SupervisorError> {
        let deadline = Instant::now() + self.start_timeout;
        let mut consecutive_ready = 0u32;

        while Instant::now() < deadline {
            if !candidate.is_alive()? {
                return Err(SupervisorError::SpawnFailed(
                    "candidate collector exited during startup".to_string(),
                ));
            }

            match self.health_probe.poll_ready(health_address) {
                Ok(true) => {
                    consecutive_ready += 1;
                    if consecutive_ready >= self.consecutive_polls_required {
                        return Ok(());
                    }
                }
                Ok(false) | Err(_) => {
                    consecutive_ready = 0;
                }
            }

            std::thread::sleep(self.health_poll_interval);
        }

        Err(SupervisorError::StartTimeout)
    }

    fn drain_and_stop(&self, active: &mut ActiveCollector, grace: Duration) -> Result<(), SupervisorError> {
        let _ = active.process.terminate();

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            match active.process.is_alive() {
                Ok(true) => std::thread::sleep(Duration::from_millis(100)),
                Ok(false) => break,
                Err(_) => break,
            }
        }

        if active.process.is_alive().unwrap_or(false) {
            active.process.kill()?;
        }

        crate::utils::fs::remove_dir_best_effort(&active.working_dir);
        Ok(())
    }
}
