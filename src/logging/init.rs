use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use super::config::{LogFormat, LoggingConfig};

#[derive(Error, Debug)]
pub enum TracingError {
    #[error("invalid logging directive `{0}`: {1}")]
    InvalidDirective(String, String),
    #[error("could not initialize global tracing subscriber: {0}")]
    Init(String),
}

/// Holds resources (e.g. the non-blocking file writer's flush guard) that
/// must stay alive for the lifetime of the process.
pub type TracingGuard = Option<WorkerGuard>;

/// Initializes the global `tracing` subscriber from `config`. If `log_dir`
/// is `Some`, logs are additionally written to a rotating file there.
pub fn try_init_tracing(
    config: &LoggingConfig,
    log_dir: Option<&Path>,
) -> Result<TracingGuard, TracingError> {
    let filter = EnvFilter::builder()
        .parse(config.filter_directive())
        .map_err(|err| TracingError::InvalidDirective(config.filter_directive(), err.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let (guard, non_blocking_writer) = if let Some(dir) = log_dir {
        let file_appender = tracing_appender::rolling::daily(dir, "nrdot-host.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        (Some(guard), Some(writer))
    } else {
        (None, None)
    };

    match (config.format, non_blocking_writer) {
        (LogFormat::Json, Some(writer)) => builder
            .json()
            .with_writer(writer)
            .try_init()
            .map_err(|err| TracingError::Init(err.to_string()))?,
        (LogFormat::Json, None) => builder
            .json()
            .try_init()
            .map_err(|err| TracingError::Init(err.to_string()))?,
        (LogFormat::Text, Some(writer)) => builder
            .with_writer(writer)
            .try_init()
            .map_err(|err| TracingError::Init(err.to_string()))?,
        (LogFormat::Text, None) => builder
            .try_init()
            .map_err(|err| TracingError::Init(err.to_string()))?,
    }

    Ok(guard)
}
