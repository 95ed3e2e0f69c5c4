//! The Control API (§4.8): HTTP surface for status, discovery, preview,
//! reload, token administration, and self-telemetry, gated by bearer auth
//! and a per-key rate limiter.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod runner;
pub mod server;
pub mod state;
pub mod status;
pub mod token_store;

pub use config::ServerConfig;
pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use runner::{ApiServerError, Runner, StartedApiServer};
pub use state::ApiState;
pub use token_store::{SharedTokenStore, TokenStore};
