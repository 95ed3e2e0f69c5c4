use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Error, Debug)]
pub enum ConfigEngineError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("no generated configuration to roll back from")]
    NothingToRollBack,
    #[error("another apply is already in progress")]
    Busy,
    #[error(transparent)]
    Generator(#[from] crate::generator::GeneratorError),
}

impl ConfigEngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigEngineError::Invalid(_) => ErrorKind::InvalidConfig,
            ConfigEngineError::NothingToRollBack => ErrorKind::RollbackFailed,
            ConfigEngineError::Busy => ErrorKind::Busy,
            ConfigEngineError::Generator(err) => err.kind(),
        }
    }
}
