use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to register metric `{0}`: {1}")]
    RegistrationFailed(String, String),
    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

impl TelemetryError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}
