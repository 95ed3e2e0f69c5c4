use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Error, Debug)]
pub enum RemoteConfigError {
    #[error("remote config service unavailable: {0}")]
    Unavailable(String),
    #[error("remote config service returned an unexpected response: {0}")]
    InvalidResponse(String),
    #[error("local cache error: {0}")]
    Cache(String),
}

impl RemoteConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteConfigError::Unavailable(_) => ErrorKind::RemoteUnavailable,
            RemoteConfigError::InvalidResponse(_) => ErrorKind::RemoteUnavailable,
            RemoteConfigError::Cache(_) => ErrorKind::Internal,
        }
    }
}
