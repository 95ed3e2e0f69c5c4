use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigEngineError;
use crate::discovery::DiscoveryError;
use crate::generator::GeneratorError;
use crate::orchestrator::OrchestratorError;
use crate::remote::RemoteConfigError;
use crate::supervisor::SupervisorError;

/// The closed set of error kinds surfaced in API responses and logs (§7).
/// Every subsystem error maps to exactly one of these so operators can
/// distinguish failure modes without string-matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfig,
    MissingEnv,
    DiscoveryFailed,
    HelperUnavailable,
    SignatureInvalid,
    RemoteUnavailable,
    StartTimeout,
    HealthFailed,
    AppliedFailure,
    RollbackFailed,
    Busy,
    NotFound,
    Unauthenticated,
    Forbidden,
    RateLimited,
    Internal,
}

/// Top-level crate error, wrapping every subsystem's error type.
#[derive(Error, Debug)]
pub enum NrdotError {
    #[error("configuration engine error: {0}")]
    Config(#[from] ConfigEngineError),

    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("config generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("remote config error: {0}")]
    Remote(#[from] RemoteConfigError),

    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("control api error: {0}")]
    Api(#[from] ApiError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl NrdotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NrdotError::Config(e) => e.kind(),
            NrdotError::Discovery(e) => e.kind(),
            NrdotError::Generator(e) => e.kind(),
            NrdotError::Remote(e) => e.kind(),
            NrdotError::Supervisor(e) => e.kind(),
            NrdotError::Orchestrator(e) => e.kind(),
            NrdotError::Api(e) => e.kind(),
            NrdotError::Io(_) => ErrorKind::Internal,
            NrdotError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Maps to the process exit codes enumerated in §6:
    /// 0 success, 1 generic failure, 2 invalid arguments/config,
    /// 3 runtime health failure at startup.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidConfig => 2,
            ErrorKind::StartTimeout | ErrorKind::HealthFailed => 3,
            _ => 1,
        }
    }
}
