use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("no receivers were produced from the discovery snapshot")]
    EmptyDocument,
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
}

impl GeneratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeneratorError::EmptyDocument => ErrorKind::InvalidConfig,
            GeneratorError::SigningFailed(_) => ErrorKind::SignatureInvalid,
            GeneratorError::KeyUnavailable(_) => ErrorKind::Internal,
        }
    }
}
