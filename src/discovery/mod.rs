pub mod correlate;
pub mod engine;
pub mod error;
pub mod helper_client;
pub mod methods;
pub mod service;
pub mod snapshot;

pub use engine::DiscoveryEngine;
pub use error::DiscoveryError;
pub use service::{Confidence, DiscoveryMethodKind, Service, ServiceType};
pub use snapshot::DiscoverySnapshot;
