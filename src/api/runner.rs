use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

use crate::api::config::ServerConfig;
use crate::api::server::run_api_server;
use crate::api::state::ApiState;
use crate::event::cancellation::CancellationMessage;
use crate::event::channel::EventConsumer;
use crate::utils::thread_context::{NotStartedThreadContext, StartedThreadContext, ThreadContextStopperError};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ApiServerError {
    #[error("failed to bind the control api: {0}")]
    BindError(String),
    #[error("control api startup timed out after {0:?}")]
    StartupTimeout(Duration),
    #[error("control api thread failed during startup")]
    StartupChannelClosed,
    #[error("error stopping control api: {0}")]
    Stop(#[from] ThreadContextStopperError),
}

/// Spawns the Control API on a dedicated OS thread, owning a `tokio`
/// current-thread runtime, mirroring the teacher's status-server runner
/// (§4.8 + §9's "every OS thread owns its own async runtime" convention).
pub struct Runner {
    config: ServerConfig,
    runtime: Arc<Runtime>,
    state: Arc<ApiState>,
}

pub struct StartedApiServer {
    thread_context: Option<StartedThreadContext>,
}

impl Runner {
    pub fn new(config: ServerConfig, runtime: Arc<Runtime>, state: Arc<ApiState>) -> Self {
        Self { config, runtime, state }
    }

    pub fn start(self) -> Result<StartedApiServer, ApiServerError> {
        let (startup_publisher, startup_consumer) = std::sync::mpsc::channel();

        let callback = move |stop_consumer: EventConsumer<CancellationMessage>| {
            self.runtime
                .block_on(run_api_server(self.config, self.state, stop_consumer, startup_publisher));
        };

        let thread_context = NotStartedThreadContext::new("control-api", callback).start();

        let startup_result = startup_consumer.recv_timeout(STARTUP_TIMEOUT).map_err(|err| match err {
            std::sync::mpsc::RecvTimeoutError::Timeout => ApiServerError::StartupTimeout(STARTUP_TIMEOUT),
            std::sync::mpsc::RecvTimeoutError::Disconnected => ApiServerError::StartupChannelClosed,
        })?;
        startup_result.map_err(ApiServerError::BindError)?;

        Ok(StartedApiServer {
            thread_context: Some(thread_context),
        })
    }
}

impl Drop for StartedApiServer {
    fn drop(&mut self) {
        info!("waiting for control api to stop gracefully...");
        let Some(thread_context) = self.thread_context.take() else {
            return;
        };
        let _ = thread_context
            .stop()
            .inspect(|_| debug!("control api thread stopped"))
            .inspect_err(|err| error!(%err, "error stopping control api"));
    }
}
