use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use actix_web::HttpRequest;

use crate::api::error::ApiError;
use crate::config::schema::{RateLimitKey, RateLimitSection};

/// A single token bucket: capacity `burst`, refilling continuously at
/// `refill_per_second` (§4.8).
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(burst: u32) -> Self {
        Self {
            tokens: burst as f64,
            last_refill: Instant::now(),
        }
    }

    fn try_take(&mut self, burst: u32, refill_per_second: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * refill_per_second).min(burst as f64);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-key token-bucket limiter. Key selection is configurable between
/// the caller's remote address, its authenticated token identity, or the
/// route being called (§4.8).
pub struct RateLimiter {
    section: Option<RateLimitSection>,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(section: Option<RateLimitSection>) -> Self {
        Self {
            section,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn key_selector(&self) -> RateLimitKey {
        self.section.as_ref().map(|s| s.key).unwrap_or_default()
    }

    /// Returns `Ok(())` if the request may proceed, or `Err(retry_after_secs)`
    /// if the bucket for `key` is exhausted.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let Some(section) = &self.section else {
            return Ok(());
        };

        let mut buckets = self.buckets.lock().expect("rate limiter poisoned");
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(section.burst));

        if bucket.try_take(section.burst, section.refill_per_second) {
            Ok(())
        } else {
            let retry_after_secs = (1.0 / section.refill_per_second).ceil() as u64;
            Err(retry_after_secs.max(1))
        }
    }

    /// Derives the bucket key for `req`/`route` from the configured
    /// [`RateLimitKey`] and enforces it, translating a rejection into the
    /// `RateLimited` API error.
    pub fn enforce(&self, req: &HttpRequest, route: &str) -> Result<(), ApiError> {
        let key = match self.key_selector() {
            RateLimitKey::RemoteAddress => req
                .peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            RateLimitKey::TokenIdentity => req
                .headers()
                .get(actix_web::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("anonymous")
                .to_string(),
            RateLimitKey::Route => route.to_string(),
        };

        self.check(&key)
            .map_err(|retry_after_secs| ApiError::RateLimited { retry_after_secs })
    }
}
