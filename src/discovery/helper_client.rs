use std::io::{BufRead, BufReader, Write};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::discovery::error::DiscoveryError;

/// Requests the discovery engine can delegate to the privileged helper
/// process for operations that require elevated permissions the agent
/// itself deliberately does not run with.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HelperRequest {
    ReadFile { path: String },
    ListDir { path: String },
    ReadNetInfo,
    CheckPort { port: u16 },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HelperResponse {
    Ok { payload: serde_json::Value },
    Error { message: String },
}

/// The privileged helper collaborator, reached over a local Unix domain
/// socket. Kept as a trait so discovery methods and tests can substitute a
/// fake without a real helper process running.
pub trait PrivilegedHelperClient: Send + Sync {
    fn read_file(&self, path: &str) -> Result<String, DiscoveryError>;
    fn list_dir(&self, path: &str) -> Result<Vec<String>, DiscoveryError>;
    fn read_net_info(&self) -> Result<serde_json::Value, DiscoveryError>;
    fn check_port(&self, port: u16) -> Result<bool, DiscoveryError>;
}

/// Talks to the helper over a Unix domain socket using newline-delimited
/// JSON requests and responses, one round trip per call.
pub struct SocketHelperClient {
    socket_path: std::path::PathBuf,
}

impl SocketHelperClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self { socket_path: socket_path.as_ref().to_path_buf() }
    }

    #[cfg(unix)]
    fn roundtrip(&self, request: &HelperRequest) -> Result<HelperResponse, DiscoveryError> {
        let mut stream = UnixStream::connect(&self.socket_path).map_err(|err| {
            DiscoveryError::HelperUnavailable(format!(
                "connecting to {}: {err}",
                self.socket_path.display()
            ))
        })?;

        let request_line = serde_json::to_string(request)
            .map_err(|err| DiscoveryError::HelperUnavailable(err.to_string()))?;
        stream
            .write_all(format!("{request_line}\n").as_bytes())
            .map_err(|err| DiscoveryError::HelperUnavailable(err.to_string()))?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|err| DiscoveryError::HelperUnavailable(err.to_string()))?;

        serde_json::from_str(line.trim())
            .map_err(|err| DiscoveryError::HelperUnavailable(err.to_string()))
    }

    #[cfg(not(unix))]
    fn roundtrip(&self, _request: &HelperRequest) -> Result<HelperResponse, DiscoveryError> {
        Err(DiscoveryError::HelperUnavailable(
            "privileged helper is only supported on unix".to_string(),
        ))
    }

    fn unwrap_payload(response: HelperResponse) -> Result<serde_json::Value, DiscoveryError> {
        match response {
            HelperResponse::Ok { payload } => Ok(payload),
            HelperResponse::Error { message } => Err(DiscoveryError::HelperUnavailable(message)),
        }
    }
}

impl PrivilegedHelperClient for SocketHelperClient {
    fn read_file(&self, path: &str) -> Result<String, DiscoveryError> {
        let payload = Self::unwrap_payload(self.roundtrip(&HelperRequest::ReadFile {
            path: path.to_string(),
        })?)?;
        payload
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DiscoveryError::HelperUnavailable("expected string payload".to_string()))
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, DiscoveryError> {
        let payload = Self::unwrap_payload(self.roundtrip(&HelperRequest::ListDir {
            path: path.to_string(),
        })?)?;
        serde_json::from_value(payload)
            .map_err(|err| DiscoveryError::HelperUnavailable(err.to_string()))
    }

    fn read_net_info(&self) -> Result<serde_json::Value, DiscoveryError> {
        Self::unwrap_payload(self.roundtrip(&HelperRequest::ReadNetInfo)?)
    }

    fn check_port(&self, port: u16) -> Result<bool, DiscoveryError> {
        let payload = Self::unwrap_payload(self.roundtrip(&HelperRequest::CheckPort { port })?)?;
        payload
            .as_bool()
            .ok_or_else(|| DiscoveryError::HelperUnavailable("expected bool payload".to_string()))
    }
}
