use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("discovery method `{0}` failed: {1}")]
    MethodFailed(String, String),
    #[error("privileged helper unavailable: {0}")]
    HelperUnavailable(String),
    #[error("discovery cycle exceeded its deadline")]
    DeadlineExceeded,
    #[error("all {0} discovery methods failed")]
    AllMethodsFailed(usize),
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::MethodFailed(..) => ErrorKind::DiscoveryFailed,
            DiscoveryError::HelperUnavailable(_) => ErrorKind::HelperUnavailable,
            DiscoveryError::DeadlineExceeded => ErrorKind::DiscoveryFailed,
            DiscoveryError::AllMethodsFailed(_) => ErrorKind::DiscoveryFailed,
        }
    }
}
