//! Owns the Collector process lifecycle: cold start, blue-green swap on
//! config apply, drain of the outgoing instance, and restart on unplanned
//! exit (§4.6).

pub mod error;
pub mod health;
pub mod health_probe;
pub mod process;
pub mod restart;
pub mod supervisor;
pub mod swap;

pub use error::SupervisorError;
pub use health::HealthState;
pub use health_probe::{HealthProbe, HttpHealthProbe};
pub use process::{CollectorProcess, CollectorState};
pub use restart::{RestartDecision, RestartPolicy};
pub use supervisor::{ApplyOutcome, Supervisor};
pub use swap::SwapPhase;
