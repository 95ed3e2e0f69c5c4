//! nrdot-host: a Linux host telemetry agent that discovers local services,
//! renders and signs an OpenTelemetry Collector configuration for them, and
//! supervises the Collector process through zero-downtime reloads.

pub mod api;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod event;
pub mod generator;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod remote;
pub mod supervisor;
pub mod telemetry;
pub mod utils;

pub use error::{ErrorKind, NrdotError};
pub use paths::Paths;
