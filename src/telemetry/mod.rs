//! Self-telemetry: the Prometheus registry exposed at `/metrics` and the
//! readiness computation exposed at `/ready` (§4.9).

pub mod error;
pub mod metrics;
pub mod readiness;

pub use error::TelemetryError;
pub use metrics::{Metrics, SharedMetrics};
pub use readiness::{compute as compute_readiness, Readiness};
