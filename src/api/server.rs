use std::sync::Arc;

use actix_web::{dev::ServerHandle, web, App, HttpServer};
use tokio::runtime::Handle;
use tracing::{debug, error, info};

use crate::api::config::{ServerConfig, DEFAULT_WORKERS};
use crate::api::handlers;
use crate::api::state::ApiState;
use crate::event::cancellation::CancellationMessage;
use crate::event::channel::EventConsumer;

/// Runs the Control API to completion: binds, serves, and blocks until
/// `stop` is signalled, then drains the server gracefully (§4.8, §5's
/// "every externally triggered operation carries a timeout").
pub async fn run_api_server(
    server_config: ServerConfig,
    state: Arc<ApiState>,
    stop: EventConsumer<CancellationMessage>,
    startup_publisher: std::sync::mpsc::Sender<Result<(), String>>,
) {
    let (server_handle_publisher, server_handle_consumer) = std::sync::mpsc::channel();

    debug!("spawning thread for the control api server");
    let rt = Handle::current();
    let server_join_handle = rt.spawn(async move {
        let _ = run_server(server_config, state, server_handle_publisher, startup_publisher)
            .await
            .inspect_err(|err| error!(error_msg = %err, "starting control api server"));
    });

    debug!("waiting for stop signal");
    while !stop.is_cancelled(std::time::Duration::from_millis(200)) {}

    if let Ok(server_handle) = server_handle_consumer.recv() {
        debug!("stopping control api server");
        server_handle.stop(true).await;
    }

    let _ = server_join_handle.await;
    info!("control api server gracefully stopped");
}

async fn run_server(
    server_config: ServerConfig,
    state: Arc<ApiState>,
    tx: std::sync::mpsc::Sender<ServerHandle>,
    startup_publisher: std::sync::mpsc::Sender<Result<(), String>>,
) -> std::io::Result<()> {
    info!(
        "starting control api at http://{}:{}",
        server_config.host, server_config.port
    );

    // `state` is already an `Arc<ApiState>`; `Data::from` adopts it directly
    // instead of `Data::new` double-wrapping it, so handlers can extract
    // `web::Data<ApiState>` rather than `web::Data<Arc<ApiState>>`.
    let app_data = web::Data::from(state);

    let server = match HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .route("/health", web::get().to(handlers::health))
            .route("/ready", web::get().to(handlers::ready))
            .route("/v1/status", web::get().to(handlers::status))
            .route("/v1/discovery", web::get().to(handlers::discovery))
            .route("/v1/discovery/preview", web::post().to(handlers::discovery_preview))
            .route("/v1/config/reload", web::post().to(handlers::config_reload))
            .route("/v1/tokens", web::post().to(handlers::tokens_upsert))
            .route("/v1/tokens/{token}", web::delete().to(handlers::tokens_revoke))
            .route("/metrics", web::get().to(handlers::metrics))
    })
    .bind((server_config.host.to_string(), server_config.port.clone().into()))
    {
        Ok(server) => server,
        Err(err) => {
            let _ = startup_publisher.send(Err(err.to_string()));
            return Err(err);
        }
    };

    let server = server.workers(DEFAULT_WORKERS).run();
    let _ = tx.send(server.handle());
    let _ = startup_publisher.send(Ok(()));

    server.await
}
