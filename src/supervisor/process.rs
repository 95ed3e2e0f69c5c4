use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::supervisor::error::SupervisorError;

/// The lifecycle states a single Collector process instance moves through.
/// `Draining` is specific to blue-green swaps: the old instance is kept
/// alive briefly after the new one goes `Ready`, in case the new one fails
/// health checks and the swap needs to abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorState {
    Starting,
    Ready,
    Degraded,
    Draining,
    Stopped,
    Failed,
}

/// One running (or exited) `otelcol` child process plus the bookkeeping
/// the supervisor needs around it.
pub struct CollectorProcess {
    child: Child,
    pub config_path: PathBuf,
    pub started_at: Instant,
    pub state: CollectorState,
}

impl CollectorProcess {
    /// Launches `binary` with the rendered config file and the health
    /// address it should bind its health-check endpoint to (§6: "launched
    /// with a config file path argument and a health endpoint address").
    pub fn spawn(
        binary: &str,
        config_path: PathBuf,
        working_dir: &PathBuf,
        health_address: &str,
    ) -> Result<Self, SupervisorError> {
        let child = Command::new(binary)
            .arg("--config")
            .arg(&config_path)
            .arg("--health-addr")
            .arg(health_address)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| SupervisorError::SpawnFailed(err.to_string()))?;

        Ok(Self {
            child,
            config_path,
            started_at: Instant::now(),
            state: CollectorState::Starting,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking liveness check: `Some(true)` if still running,
    /// `Some(false)` if it has exited, propagates the error on a wait
    /// failure.
    pub fn is_alive(&mut self) -> Result<bool, SupervisorError> {
        match self.child.try_wait() {
            Ok(None) => Ok(true),
            Ok(Some(_)) => Ok(false),
            Err(err) => Err(SupervisorError::WaitFailed(err.to_string())),
        }
    }

    #[cfg(unix)]
    pub fn terminate(&mut self) -> Result<(), SupervisorError> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM)
            .map_err(|err| SupervisorError::StopFailed(err.to_string()))
    }

    #[cfg(not(unix))]
    pub fn terminate(&mut self) -> Result<(), SupervisorError> {
        self.child
            .kill()
            .map_err(|err| SupervisorError::StopFailed(err.to_string()))
    }

    pub fn kill(&mut self) -> Result<(), SupervisorError> {
        self.child
            .kill()
            .map_err(|err| SupervisorError::StopFailed(err.to_string()))
    }
}
