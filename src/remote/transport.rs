use std::time::Duration;

use url::Url;

use crate::remote::baseline::{BaselineReport, RemoteConfigResponse};
use crate::remote::error::RemoteConfigError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How the remote client talks to the remote config service. A trait so
/// tests can substitute a canned transport instead of making real HTTP
/// calls.
pub trait RemoteConfigTransport: Send + Sync {
    fn fetch(&self, report: &BaselineReport) -> Result<RemoteConfigResponse, RemoteConfigError>;
}

/// `reqwest`-backed transport, blocking — the remote client runs on its own
/// dedicated thread, so there is no async runtime to integrate with.
pub struct HttpRemoteConfigTransport {
    base_url: Url,
    license_key: String,
    client: reqwest::blocking::Client,
}

impl HttpRemoteConfigTransport {
    pub fn new(base_url: Url, license_key: String) -> Result<Self, RemoteConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| RemoteConfigError::Unavailable(err.to_string()))?;
        Ok(Self { base_url, license_key, client })
    }
}

impl RemoteConfigTransport for HttpRemoteConfigTransport {
    fn fetch(&self, report: &BaselineReport) -> Result<RemoteConfigResponse, RemoteConfigError> {
        let url = self
            .base_url
            .join("v1/config")
            .map_err(|err| RemoteConfigError::Unavailable(err.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.license_key)
            .json(report)
            .send()
            .map_err(|err| RemoteConfigError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteConfigError::Unavailable(format!(
                "remote config service responded with status {}",
                response.status()
            )));
        }

        response
            .json::<RemoteConfigResponse>()
            .map_err(|err| RemoteConfigError::InvalidResponse(err.to_string()))
    }
}
