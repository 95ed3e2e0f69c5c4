use std::path::{Path, PathBuf};

use crate::discovery::error::DiscoveryError;
use crate::discovery::methods::DiscoveryMethod;
use crate::discovery::service::{DiscoveryMethodKind, RawFinding, ServiceType, SENTINEL_ENDPOINT};

const WELL_KNOWN_CONFIGS: &[(&str, ServiceType)] = &[
    ("/etc/mysql/my.cnf", ServiceType::Mysql),
    ("/etc/postgresql", ServiceType::Postgresql),
    ("/etc/nginx/nginx.conf", ServiceType::Nginx),
    ("/etc/redis/redis.conf", ServiceType::Redis),
];

/// Checks for the presence of each service's canonical configuration file
/// or directory. Weakest signal of the four methods: a leftover config file
/// from an uninstalled package still counts, so correlation never trusts
/// this method alone for `High` confidence.
pub struct ConfigLocator {
    roots: Vec<(PathBuf, ServiceType)>,
}

impl ConfigLocator {
    pub fn new() -> Self {
        Self {
            roots: WELL_KNOWN_CONFIGS
                .iter()
                .map(|(path, service_type)| (PathBuf::from(path), service_type.clone()))
                .collect(),
        }
    }

    #[cfg(test)]
    fn with_roots(roots: Vec<(PathBuf, ServiceType)>) -> Self {
        Self { roots }
    }
}

impl Default for ConfigLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryMethod for ConfigLocator {
    fn kind(&self) -> DiscoveryMethodKind {
        DiscoveryMethodKind::ConfigLocator
    }

    fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
        let mut findings = Vec::new();
        for (path, service_type) in &self.roots {
            if Path::new(path).exists() {
                findings.push(RawFinding {
                    service_type: service_type.clone(),
                    endpoint: SENTINEL_ENDPOINT.to_string(),
                    method: self.kind(),
                    config_path: Some(path.display().to_string()),
                    process_name: None,
                });
            }
        }
        Ok(findings)
    }
}
