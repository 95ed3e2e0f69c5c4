use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("failed to spawn collector process: {0}")]
    SpawnFailed(String),
    #[error("failed to wait on collector process: {0}")]
    WaitFailed(String),
    #[error("failed to stop collector process: {0}")]
    StopFailed(String),
    #[error("collector did not become ready before the start timeout")]
    StartTimeout,
    #[error("collector health checks failed: {0}")]
    HealthCheckFailed(String),
    #[error("an apply is already in progress")]
    Busy,
    #[error("missing required environment variables: {0:?}")]
    MissingEnv(Vec<String>),
    #[error("candidate configuration signature is invalid")]
    SignatureInvalid,
    #[error("failed to render candidate working directory: {0}")]
    RenderFailed(String),
    #[error("rollback failed: {0}")]
    RollbackFailed(String),
}

impl SupervisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SupervisorError::SpawnFailed(_) => ErrorKind::Internal,
            SupervisorError::WaitFailed(_) => ErrorKind::Internal,
            SupervisorError::StopFailed(_) => ErrorKind::Internal,
            SupervisorError::StartTimeout => ErrorKind::StartTimeout,
            SupervisorError::HealthCheckFailed(_) => ErrorKind::HealthFailed,
            SupervisorError::Busy => ErrorKind::Busy,
            SupervisorError::MissingEnv(_) => ErrorKind::MissingEnv,
            SupervisorError::SignatureInvalid => ErrorKind::SignatureInvalid,
            SupervisorError::RenderFailed(_) => ErrorKind::Internal,
            SupervisorError::RollbackFailed(_) => ErrorKind::RollbackFailed,
        }
    }
}
