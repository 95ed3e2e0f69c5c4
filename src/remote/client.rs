use std::path::PathBuf;
use std::time::Duration;

use crate::remote::baseline::{BaselineReport, RemoteConfigResponse};
use crate::remote::cache;
use crate::remote::error::RemoteConfigError;
use crate::remote::transport::RemoteConfigTransport;
use crate::utils::backoff::ExponentialBackoff;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: u32 = 2;
const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);
const MAX_ATTEMPTS: u32 = 5;

/// Fetches config from the remote service, retrying transient failures
/// with the same exponential backoff shape the supervisor's restart policy
/// uses, and falling back to the on-disk cache when every attempt fails.
pub struct RemoteConfigClient {
    transport: Box<dyn RemoteConfigTransport>,
    cache_path: PathBuf,
}

impl RemoteConfigClient {
    pub fn new(transport: Box<dyn RemoteConfigTransport>, cache_path: PathBuf) -> Self {
        Self { transport, cache_path }
    }

    pub fn fetch(&self, report: &BaselineReport) -> Result<RemoteConfigResponse, RemoteConfigError> {
        let mut backoff = ExponentialBackoff::new(INITIAL_BACKOFF, BACKOFF_FACTOR, MAX_BACKOFF);
        let mut last_error = None;

        for _ in 0..MAX_ATTEMPTS {
            match self.transport.fetch(report) {
                Ok(response) => {
                    let _ = cache::store(&self.cache_path, &response);
                    return Ok(response);
                }
                Err(err) => {
                    last_error = Some(err);
                    std::thread::sleep(backoff.next_delay());
                }
            }
        }

        if let Some(cached) = cache::load(&self.cache_path)? {
            return Ok(cached);
        }

        Err(last_error.unwrap_or(RemoteConfigError::Unavailable("no attempts made".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::tempdir;

    struct FlakyTransport {
        failures_remaining: AtomicU32,
    }

    impl RemoteConfigTransport for FlakyTransport {
        fn fetch(&self, _report: &BaselineReport) -> Result<RemoteConfigResponse, RemoteConfigError> {
            if self.failures_remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(RemoteConfigError::Unavailable("flaky".to_string()))
            } else {
                Ok(RemoteConfigResponse::Unchanged)
            }
        }
    }

    struct AlwaysFailsTransport;

    impl RemoteConfigTransport for AlwaysFailsTransport {
        fn fetch(&self, _report: &BaselineReport) -> Result<RemoteConfigResponse, RemoteConfigError> {
            Err(RemoteConfigError::Unavailable("down".to_string()))
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let dir = tempdir().unwrap();
        let client = RemoteConfigClient::new(
            Box::new(FlakyTransport { failures_remaining: AtomicU32::new(2) }),
            dir.path().join("cache.json"),
        );
        let report = BaselineReport::new("host-1", "test-host", None, Vec::new());
        assert_eq!(client.fetch(&report).unwrap(), RemoteConfigResponse::Unchanged);
    }

    #[test]
    fn falls_back_to_cache_when_every_attempt_fails() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        cache::store(&cache_path, &RemoteConfigResponse::Unchanged).unwrap();

        let client = RemoteConfigClient::new(Box::new(AlwaysFailsTransport), cache_path);
        let report = BaselineReport::new("host-1", "test-host", None, Vec::new());
        assert_eq!(client.fetch(&report).unwrap(), RemoteConfigResponse::Unchanged);
    }

    #[test]
    fn fails_when_every_attempt_fails_and_no_cache_exists() {
        let dir = tempdir().unwrap();
        let client = RemoteConfigClient::new(Box::new(AlwaysFailsTransport), dir.path().join("cache.json"));
        let report = BaselineReport::new("host-1", "test-host", None, Vec::new());
        assert!(client.fetch(&report).is_err());
    }
}
