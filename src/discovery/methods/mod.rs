pub mod config_locator;
pub mod package_detector;
pub mod port_scanner;
pub mod process_scanner;

use crate::discovery::error::DiscoveryError;
use crate::discovery::service::{DiscoveryMethodKind, RawFinding};

/// One independent way of spotting a running service. Each method runs on
/// its own thread during a discovery cycle and reports whatever it found;
/// [`crate::discovery::correlate::correlate`] merges the results.
pub trait DiscoveryMethod: Send + Sync {
    fn kind(&self) -> DiscoveryMethodKind;
    fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError>;
}
