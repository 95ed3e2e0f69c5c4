pub mod config;
pub mod init;

pub use config::{LogFormat, LoggingConfig};
pub use init::{try_init_tracing, TracingGuard};
