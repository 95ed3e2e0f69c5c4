use std::collections::HashSet;
use std::time::Instant;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::api::auth::authenticate;
use crate::api::error::ApiError;
use crate::api::state::ApiState;
use crate::api::status::StatusResponse;
use crate::config::schema::Role;
use crate::discovery::snapshot::DiscoverySnapshot;
use crate::generator::GeneratedConfig;

/// `GET /health` — liveness only, unauthenticated.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// `GET /ready` — §4.8: ready once the active Collector is healthy and
/// discovery is fresh.
pub async fn ready(state: web::Data<ApiState>) -> HttpResponse {
    let readiness = crate::telemetry::compute_readiness(&state.supervisor, &state.orchestrator);
    if readiness.ready {
        HttpResponse::Ok().json(readiness)
    } else {
        HttpResponse::ServiceUnavailable().json(readiness)
    }
}

/// Enforces the configured rate limit for `route`, incrementing the
/// rejection counter on the way out, before any auth check runs.
fn enforce_rate_limit(req: &HttpRequest, state: &ApiState, route: &str) -> Result<(), ApiError> {
    state.rate_limiter.enforce(req, route).inspect_err(|_| {
        state
            .metrics
            .rate_limiter_rejections_total
            .with_label_values(&[route])
            .inc();
    })
}

/// `GET /v1/status` — aggregated health plus the active config version.
pub async fn status(req: HttpRequest, state: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    enforce_rate_limit(&req, &state, "/v1/status")?;
    authenticate(&req, &state.token_store, Role::Viewer)?;
    let health = state.supervisor.status();
    let response = StatusResponse {
        active_config_version: health.active_version.map(|v| v.0),
        health,
        orchestrator_state: state.orchestrator.current_state().to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// `GET /v1/discovery` — runs an on-demand discovery cycle and returns it.
pub async fn discovery(req: HttpRequest, state: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    enforce_rate_limit(&req, &state, "/v1/discovery")?;
    authenticate(&req, &state.token_store, Role::Viewer)?;
    let exclude: HashSet<String> = state.orchestrator.user_config().auto_config.exclude_services;
    let start = Instant::now();
    let snapshot = state.discovery.run_cycle(&exclude)?;
    state
        .metrics
        .discovery_cycle_duration_seconds
        .observe(start.elapsed().as_secs_f64());
    Ok(HttpResponse::Ok().json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub snapshot: Option<DiscoverySnapshot>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub candidate: GeneratedConfig,
}

/// `POST /v1/discovery/preview` — generates, but never applies, a
/// candidate configuration from a supplied or freshly run snapshot.
pub async fn discovery_preview(
    req: HttpRequest,
    state: web::Data<ApiState>,
    body: web::Json<PreviewRequest>,
) -> Result<HttpResponse, ApiError> {
    enforce_rate_limit(&req, &state, "/v1/discovery/preview")?;
    authenticate(&req, &state.token_store, Role::Operator)?;

    let user_config = state.orchestrator.user_config();
    let snapshot = match body.into_inner().snapshot {
        Some(snapshot) => snapshot,
        None => state.discovery.run_cycle(&user_config.auto_config.exclude_services)?,
    };

    let candidate = state.engine.generate(&user_config, &snapshot)?;
    Ok(HttpResponse::Ok().json(PreviewResponse { candidate }))
}

/// `POST /v1/config/reload` — forces a re-read of the user document and a
/// full discover/generate/apply cycle.
pub async fn config_reload(req: HttpRequest, state: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    enforce_rate_limit(&req, &state, "/v1/config/reload")?;
    authenticate(&req, &state.token_store, Role::Operator)?;
    let outcome = state.orchestrator.run_cycle()?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "outcome": format!("{outcome:?}") })))
}

/// `GET /metrics` — self-telemetry in Prometheus text exposition format.
pub async fn metrics(state: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let body = state.metrics.encode()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

#[derive(Debug, Deserialize)]
pub struct TokenMutationRequest {
    pub token: String,
    pub role: Role,
}

/// `POST /v1/tokens` — admin-only mutation of the in-memory token store.
pub async fn tokens_upsert(
    req: HttpRequest,
    state: web::Data<ApiState>,
    body: web::Json<TokenMutationRequest>,
) -> Result<HttpResponse, ApiError> {
    enforce_rate_limit(&req, &state, "/v1/tokens")?;
    authenticate(&req, &state.token_store, Role::Admin)?;
    let body = body.into_inner();
    state
        .token_store
        .write()
        .expect("token store poisoned")
        .insert(body.token, body.role);
    Ok(HttpResponse::NoContent().finish())
}

/// `DELETE /v1/tokens/{token}` — admin-only revocation.
pub async fn tokens_revoke(
    req: HttpRequest,
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    enforce_rate_limit(&req, &state, "/v1/tokens")?;
    authenticate(&req, &state.token_store, Role::Admin)?;
    let revoked = state.token_store.write().expect("token store poisoned").revoke(&path);
    if revoked {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound)
    }
}

