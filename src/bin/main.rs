use std::fs;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{error, info, warn};
use url::Url;

use nrdot_host::api::{ApiState, RateLimiter, Runner as ApiRunner, ServerConfig};
use nrdot_host::cli::{Cli, Command, RunMode};
use nrdot_host::config::engine::Engine;
use nrdot_host::config::schema::{self, UserConfig};
use nrdot_host::config::ConfigEngineError;
use nrdot_host::discovery::helper_client::{PrivilegedHelperClient, SocketHelperClient};
use nrdot_host::discovery::DiscoveryEngine;
use nrdot_host::event::channel::pub_sub;
use nrdot_host::event::AgentEvent;
use nrdot_host::generator::{ConfigGenerator, ConfigSigner, P256Signer};
use nrdot_host::logging::try_init_tracing;
use nrdot_host::orchestrator::Orchestrator;
use nrdot_host::remote::{HttpRemoteConfigTransport, RemoteConfigClient};
use nrdot_host::supervisor::{HttpHealthProbe, Supervisor};
use nrdot_host::telemetry::Metrics;
use nrdot_host::utils::thread_context::NotStartedThreadContext;
use nrdot_host::{NrdotError, Paths};

/// Where, absent any remote endpoint configuration in the user document, the
/// remote config client looks for updates. Mirrors the way the Collector's
/// own default OTLP exporter endpoint is a fixed New Relic hostname rather
/// than something every user document has to spell out.
const DEFAULT_REMOTE_CONFIG_ENDPOINT: &str = "https://config.nr-data.net";

fn main() {
    let cli = Cli::parse_args();
    let paths = resolve_paths(&cli);

    if let Err(err) = run(cli, paths) {
        error!(kind = ?err.kind(), error = %err, "nrdot-host exited with an error");
        exit(err.exit_code());
    }
}

fn resolve_paths(cli: &Cli) -> Paths {
    let defaults = Paths::default();
    Paths::new(
        cli.config_dir.clone().unwrap_or(defaults.config_dir),
        cli.data_dir.clone().unwrap_or(defaults.data_dir),
        cli.log_dir.clone().unwrap_or(defaults.log_dir),
    )
}

fn run(cli: Cli, paths: Paths) -> Result<(), NrdotError> {
    match cli.command {
        Command::Validate => run_validate(&paths),
        Command::Discover => run_discover(&paths),
        Command::Preview => run_preview(&paths),
        Command::Status { api_base_url, token } => run_status(&api_base_url, token),
        Command::Run { mode } => run_agent(paths, mode),
    }
}

fn read_user_config(paths: &Paths) -> Result<UserConfig, NrdotError> {
    let path = paths.user_config_file();
    let contents = fs::read_to_string(&path)
        .map_err(|err| NrdotError::Internal(format!("reading {}: {err}", path.display())))?;
    serde_yaml::from_str(&contents)
        .map_err(|err| NrdotError::Internal(format!("parsing {}: {err}", path.display())))
}

/// Reads and validates the user document, failing with `InvalidConfig`
/// (exit code 2, §6) rather than a generic internal error when it parses
/// but doesn't pass [`schema::validate`].
fn load_valid_user_config(paths: &Paths) -> Result<UserConfig, NrdotError> {
    let user = read_user_config(paths)?;
    let report = schema::validate(&user);
    if !report.is_valid() {
        let message = report
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigEngineError::Invalid(message).into());
    }
    Ok(user)
}

fn run_validate(paths: &Paths) -> Result<(), NrdotError> {
    let user = read_user_config(paths)?;
    let report = schema::validate(&user);
    if report.is_valid() {
        println!("configuration is valid");
        Ok(())
    } else {
        for error in &report.errors {
            eprintln!("{}: {}", error.path, error.message);
        }
        Err(ConfigEngineError::Invalid(format!("{} validation error(s)", report.errors.len())).into())
    }
}

fn run_discover(paths: &Paths) -> Result<(), NrdotError> {
    let user = load_valid_user_config(paths)?;
    let engine = build_discovery_engine(paths);
    let snapshot = engine.run_cycle(&user.auto_config.exclude_services)?;
    print_json(&snapshot)
}

fn run_preview(paths: &Paths) -> Result<(), NrdotError> {
    let user = load_valid_user_config(paths)?;
    let discovery = build_discovery_engine(paths);
    let snapshot = discovery.run_cycle(&user.auto_config.exclude_services)?;
    let signer = load_or_bootstrap_signer(paths)?;
    let generator = ConfigGenerator::new(Arc::new(signer));
    let engine = Engine::new(generator);
    let candidate = engine.generate(&user, &snapshot)?;
    print_json(&candidate)
}

fn run_status(api_base_url: &str, token: Option<String>) -> Result<(), NrdotError> {
    let client = reqwest::blocking::Client::new();
    let mut request = client.get(format!("{api_base_url}/v1/status"));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .map_err(|err| NrdotError::Internal(format!("querying {api_base_url}: {err}")))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| NrdotError::Internal(format!("reading status response: {err}")))?;
    println!("{body}");
    if status.is_success() {
        Ok(())
    } else {
        Err(NrdotError::Internal(format!("control api returned {status}")))
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), NrdotError> {
    let text = serde_json::to_string_pretty(value).map_err(|err| NrdotError::Internal(err.to_string()))?;
    println!("{text}");
    Ok(())
}

/// Loads the P-256 signing key from disk, generating and persisting one on
/// first run (§6: the signing key is bootstrapped, never hand-provisioned).
fn load_or_bootstrap_signer(paths: &Paths) -> Result<P256Signer, NrdotError> {
    let key_path = paths.signing_key_file();
    match fs::read_to_string(&key_path) {
        Ok(pem) => P256Signer::from_pkcs8_pem(&pem).map_err(NrdotError::from),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %key_path.display(), "bootstrapping signing key");
            let pem = P256Signer::generate_pkcs8_pem().map_err(NrdotError::from)?;
            nrdot_host::utils::fs::write_atomic(&key_path, pem.as_bytes())?;
            P256Signer::from_pkcs8_pem(&pem).map_err(NrdotError::from)
        }
        Err(err) => Err(NrdotError::Internal(format!("reading {}: {err}", key_path.display()))),
    }
}

/// Wires a `SocketHelperClient` into discovery's `ProcessScanner` when the
/// privileged helper's socket is present (§4.3); falls back to direct
/// `/proc` reads only, same as before, when it isn't running.
fn build_discovery_engine(paths: &Paths) -> DiscoveryEngine {
    let socket = paths.helper_socket();
    if socket.exists() {
        let helper: Arc<dyn PrivilegedHelperClient> = Arc::new(SocketHelperClient::new(socket));
        DiscoveryEngine::with_privileged_helper(helper)
    } else {
        DiscoveryEngine::new()
    }
}

fn build_remote_client(user: &UserConfig, paths: &Paths) -> Option<Arc<RemoteConfigClient>> {
    let base_url = match Url::parse(DEFAULT_REMOTE_CONFIG_ENDPOINT) {
        Ok(url) => url,
        Err(err) => {
            warn!(%err, "invalid remote config endpoint, remote config disabled");
            return None;
        }
    };
    let transport = match HttpRemoteConfigTransport::new(base_url, user.license_key.clone()) {
        Ok(transport) => transport,
        Err(err) => {
            warn!(%err, "could not build remote config transport, remote config disabled");
            return None;
        }
    };
    Some(Arc::new(RemoteConfigClient::new(
        Box::new(transport),
        paths.remote_config_cache_file(),
    )))
}

fn run_agent(paths: Paths, mode: RunMode) -> Result<(), NrdotError> {
    let user = load_valid_user_config(&paths)?;
    let _tracing_guard =
        try_init_tracing(&user.logging, Some(&paths.log_dir)).map_err(|err| NrdotError::Internal(err.to_string()))?;

    info!(?mode, "starting nrdot-host");

    let signer = load_or_bootstrap_signer(&paths)?;
    let verifying_key = signer.verifying_key();
    let generator = ConfigGenerator::new(Arc::new(signer) as Arc<dyn ConfigSigner>);
    let engine = Arc::new(Engine::new(generator));
    let discovery = Arc::new(build_discovery_engine(&paths));
    let health_probe = Arc::new(HttpHealthProbe::new());
    let supervisor = Arc::new(Supervisor::new(paths.clone(), Some(verifying_key), health_probe));
    let remote = if mode != RunMode::Api {
        build_remote_client(&user, &paths)
    } else {
        None
    };

    let metrics = Arc::new(Metrics::new().map_err(|err| NrdotError::Internal(err.to_string()))?);
    let (events_publisher, _events_consumer) = pub_sub::<AgentEvent>();

    let host_id = nrdot_host::remote::load_or_create_host_id(&paths.host_id_file())
        .map_err(|err| NrdotError::Internal(format!("loading host id: {err}")))?;
    let hostname = nrdot_host::remote::hostname();

    let orchestrator = Arc::new(
        Orchestrator::with_host_identity(
            Arc::clone(&engine),
            Arc::clone(&discovery),
            Arc::clone(&supervisor),
            remote,
            user.clone(),
            events_publisher,
            host_id,
            hostname,
        )
        .with_metrics(Arc::clone(&metrics)),
    );

    let (shutdown_publisher, shutdown_consumer) = pub_sub::<()>();
    ctrlc::set_handler(move || {
        info!("received shutdown signal");
        let _ = shutdown_publisher.publish(());
    })
    .map_err(|err| NrdotError::Internal(format!("installing signal handler: {err}")))?;

    let orchestrator_thread = matches!(mode, RunMode::All | RunMode::Agent).then(|| {
        let orchestrator = Arc::clone(&orchestrator);
        NotStartedThreadContext::new("orchestrator", move |stop| orchestrator.run_forever(stop)).start()
    });

    let api_server = if matches!(mode, RunMode::All | RunMode::Api) {
        let token_store = nrdot_host::api::token_store::shared(&user.api.auth.tokens);
        let rate_limiter = Arc::new(RateLimiter::new(user.api.rate_limit.clone()));
        let server_config = ServerConfig::from_listen_address(user.api.listen_address.as_deref(), user.api.rate_limit.clone());
        let state = Arc::new(ApiState {
            engine: Arc::clone(&engine),
            discovery: Arc::clone(&discovery),
            supervisor: Arc::clone(&supervisor),
            orchestrator: Arc::clone(&orchestrator),
            metrics: Arc::clone(&metrics),
            token_store,
            rate_limiter,
        });
        let runtime = Arc::new(
            Runtime::new().map_err(|err| NrdotError::Internal(format!("building control api runtime: {err}")))?,
        );
        Some(
            ApiRunner::new(server_config, runtime, state)
                .start()
                .map_err(|err| NrdotError::Internal(err.to_string()))?,
        )
    } else {
        None
    };

    while !shutdown_consumer.is_cancelled(Duration::from_millis(200)) {}

    info!("shutting down");
    drop(api_server);
    if let Some(thread) = orchestrator_thread {
        thread
            .stop()
            .map_err(|err| NrdotError::Internal(err.to_string()))?;
    }

    Ok(())
}
