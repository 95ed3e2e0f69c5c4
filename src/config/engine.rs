use std::sync::Mutex;

use crate::config::diff::{self, ChangeSet};
use crate::config::error::ConfigEngineError;
use crate::config::history::{ConfigHistory, DEFAULT_CAPACITY};
use crate::config::schema::{self, UserConfig, ValidationReport};
use crate::discovery::snapshot::DiscoverySnapshot;
use crate::generator::{ConfigGenerator, GeneratedConfig};

struct EngineState {
    history: ConfigHistory,
}

/// The single owner of generated-config state: the ring buffer of past
/// configs and the signer-backed generator. `Generate` and `Rollback`
/// serialize through `state`; a caller that finds it already locked gets
/// `Busy` immediately rather than blocking, since both operations are
/// triggered by the orchestrator's single-threaded loop and contention
/// means something is already in flight.
pub struct Engine {
    state: Mutex<EngineState>,
    generator: ConfigGenerator,
}

impl Engine {
    pub fn new(generator: ConfigGenerator) -> Self {
        Self {
            state: Mutex::new(EngineState {
                history: ConfigHistory::new(DEFAULT_CAPACITY),
            }),
            generator,
        }
    }

    /// Pure validation; never touches history.
    pub fn validate(&self, user: &UserConfig) -> ValidationReport {
        schema::validate(user)
    }

    pub fn generate(
        &self,
        user: &UserConfig,
        snapshot: &DiscoverySnapshot,
    ) -> Result<GeneratedConfig, ConfigEngineError> {
        let report = self.validate(user);
        if !report.is_valid() {
            let message = report
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.path, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigEngineError::Invalid(message));
        }

        let mut state = self
            .state
            .try_lock()
            .map_err(|_| ConfigEngineError::Busy)?;
        let generated = self.generator.generate(user, snapshot)?;
        state.history.push(generated.clone());
        Ok(generated)
    }

    /// Structural diff between two rendered documents. Pure, does not read
    /// history — callers pass whichever two documents they want compared
    /// (typically the current and the newly generated one).
    pub fn diff(
        &self,
        from: &crate::config::fragments::RenderedDocument,
        to: &crate::config::fragments::RenderedDocument,
    ) -> ChangeSet {
        diff::diff(from, to)
    }

    pub fn rollback(&self) -> Result<GeneratedConfig, ConfigEngineError> {
        let mut state = self
            .state
            .try_lock()
            .map_err(|_| ConfigEngineError::Busy)?;
        state
            .history
            .rollback()
            .cloned()
            .ok_or(ConfigEngineError::NothingToRollBack)
    }

    pub fn current(&self) -> Option<GeneratedConfig> {
        self.state.lock().expect("engine mutex poisoned").history.current().cloned()
    }

    /// A snapshot report of every generated config still in history,
    /// oldest first.
    pub fn report(&self) -> Vec<GeneratedConfig> {
        self.state
            .lock()
            .expect("engine mutex poisoned")
            .history
            .iter()
            .cloned()
            .collect()
    }
}
