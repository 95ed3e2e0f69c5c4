use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::error::ErrorKind;

/// The Control API's single error type (§4.8). Every handler returns
/// `Result<_, ApiError>`; actix converts the `Err` side into a JSON body
/// via [`ResponseError`] using the status mapping in [`ApiError::status_code`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing or invalid bearer token")]
    Unauthenticated,

    #[error("role does not permit this operation")]
    Forbidden,

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("resource not found")]
    NotFound,

    #[error("operation already in progress")]
    Busy,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Discovery(#[from] crate::discovery::DiscoveryError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigEngineError),

    #[error(transparent)]
    Supervisor(#[from] crate::supervisor::SupervisorError),

    #[error(transparent)]
    Orchestrator(#[from] crate::orchestrator::OrchestratorError),

    #[error(transparent)]
    Telemetry(#[from] crate::telemetry::TelemetryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthenticated => ErrorKind::Unauthenticated,
            ApiError::Forbidden => ErrorKind::Forbidden,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::Busy => ErrorKind::Busy,
            ApiError::InvalidRequest(_) => ErrorKind::InvalidConfig,
            ApiError::Discovery(e) => e.kind(),
            ApiError::Config(e) => e.kind(),
            ApiError::Supervisor(e) => e.kind(),
            ApiError::Orchestrator(e) => e.kind(),
            ApiError::Telemetry(e) => e.kind(),
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::InvalidConfig
            | ErrorKind::MissingEnv
            | ErrorKind::SignatureInvalid => StatusCode::BAD_REQUEST,
            ErrorKind::DiscoveryFailed
            | ErrorKind::HelperUnavailable
            | ErrorKind::RemoteUnavailable
            | ErrorKind::StartTimeout
            | ErrorKind::HealthFailed
            | ErrorKind::AppliedFailure
            | ErrorKind::RollbackFailed
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let ApiError::RateLimited { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        builder.json(ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_maps_to_401() {
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rate_limited_maps_to_429() {
        assert_eq!(
            ApiError::RateLimited { retry_after_secs: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn busy_maps_to_503() {
        assert_eq!(ApiError::Busy.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
