use thiserror::Error;

use crate::config::ConfigEngineError;
use crate::discovery::DiscoveryError;
use crate::error::ErrorKind;
use crate::remote::RemoteConfigError;
use crate::supervisor::SupervisorError;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("config engine error: {0}")]
    Config(#[from] ConfigEngineError),
    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),
    #[error("remote config error: {0}")]
    Remote(#[from] RemoteConfigError),
}

impl OrchestratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::Discovery(e) => e.kind(),
            OrchestratorError::Config(e) => e.kind(),
            OrchestratorError::Supervisor(e) => e.kind(),
            OrchestratorError::Remote(e) => e.kind(),
        }
    }
}
