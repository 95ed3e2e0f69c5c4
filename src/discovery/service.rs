use serde::{Deserialize, Serialize};

/// How strongly the correlator believes a discovered service is real and
/// correctly typed. Derived from how many independent discovery methods
/// agreed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// The well-known service types the built-in template library understands.
/// `Other` carries through a freeform kind string for anything else a
/// discovery method reports, so correlation and rendering degrade rather
/// than drop the finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Mysql,
    Postgresql,
    Nginx,
    Redis,
    Other(String),
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::Mysql => write!(f, "mysql"),
            ServiceType::Postgresql => write!(f, "postgresql"),
            ServiceType::Nginx => write!(f, "nginx"),
            ServiceType::Redis => write!(f, "redis"),
            ServiceType::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// Placeholder `primary_endpoint` for methods that can't determine a port or
/// address on their own (§4.3: "a sentinel if none"). [`crate::discovery::correlate::correlate`]
/// folds sentinel findings into whichever concrete-endpoint group of the
/// same type exists, rather than grouping them as a separate service.
pub const SENTINEL_ENDPOINT: &str = "localhost";

/// Which discovery method produced (or corroborated) a [`Service`] finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethodKind {
    ProcessScan,
    PortScan,
    ConfigLocator,
    PackageDetector,
}

/// A single correlated service finding, post-correlation. `primary_endpoint`
/// is the `host:port` (or unix socket path) the correlator picked as the
/// canonical identity for grouping duplicate findings from different
/// methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub service_type: ServiceType,
    pub primary_endpoint: String,
    pub confidence: Confidence,
    pub methods: Vec<DiscoveryMethodKind>,
    pub config_path: Option<String>,
    pub process_name: Option<String>,
}

/// A single, uncorrelated sighting as reported by one discovery method,
/// before [`crate::discovery::correlate::correlate`] groups and scores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFinding {
    pub service_type: ServiceType,
    pub endpoint: String,
    pub method: DiscoveryMethodKind,
    pub config_path: Option<String>,
    pub process_name: Option<String>,
}
