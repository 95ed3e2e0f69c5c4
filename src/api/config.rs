use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::config::schema::RateLimitSection;

const DEFAULT_PORT: u16 = 8431;
pub(super) const DEFAULT_WORKERS: usize = 2;
const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(PartialEq, Deserialize, Serialize, Debug, Clone)]
pub struct Port(u16);

#[derive(PartialEq, Deserialize, Serialize, Debug, Clone)]
pub struct Host(String);

impl Default for Port {
    fn default() -> Self {
        Port(DEFAULT_PORT)
    }
}

impl From<u16> for Port {
    fn from(value: u16) -> Self {
        Port(value)
    }
}

impl From<Port> for u16 {
    fn from(value: Port) -> Self {
        value.0
    }
}

impl Default for Host {
    fn default() -> Self {
        Host(String::from(DEFAULT_HOST))
    }
}

impl Display for Port {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Host {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server bind address plus the rate-limit policy lifted from the user
/// document's `api` section (§4.8).
#[derive(PartialEq, Deserialize, Serialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default)]
    pub port: Port,
    #[serde(default)]
    pub host: Host,
    #[serde(default)]
    pub rate_limit: Option<RateLimitSection>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: Port::default(),
            host: Host::default(),
            rate_limit: None,
        }
    }
}

impl ServerConfig {
    /// Parses the user document's `listen_address` (`host:port`), falling
    /// back to the default bind address when absent or malformed.
    pub fn from_listen_address(listen_address: Option<&str>, rate_limit: Option<RateLimitSection>) -> Self {
        let (host, port) = listen_address
            .and_then(|addr| addr.rsplit_once(':'))
            .and_then(|(host, port)| port.parse::<u16>().ok().map(|port| (host.to_string(), port)))
            .unwrap_or_else(|| (DEFAULT_HOST.to_string(), DEFAULT_PORT));

        Self {
            port: Port(port),
            host: Host(host),
            rate_limit,
        }
    }
}
