use std::path::{Path, PathBuf};

use crate::discovery::error::DiscoveryError;
use crate::discovery::methods::DiscoveryMethod;
use crate::discovery::service::{DiscoveryMethodKind, RawFinding, ServiceType, SENTINEL_ENDPOINT};

const WELL_KNOWN_BINARIES: &[(&str, ServiceType)] = &[
    ("/usr/sbin/mysqld", ServiceType::Mysql),
    ("/usr/lib/postgresql", ServiceType::Postgresql),
    ("/usr/sbin/nginx", ServiceType::Nginx),
    ("/usr/bin/redis-server", ServiceType::Redis),
];

/// Checks for the presence of each service's installed binary under its
/// conventional path. Doesn't shell out to a package manager — Linux
/// distributions disagree enough on `dpkg`/`rpm` invocation that a direct
/// filesystem check is both cheaper and more portable.
pub struct PackageDetector {
    binaries: Vec<(PathBuf, ServiceType)>,
}

impl PackageDetector {
    pub fn new() -> Self {
        Self {
            binaries: WELL_KNOWN_BINARIES
                .iter()
                .map(|(path, service_type)| (PathBuf::from(path), service_type.clone()))
                .collect(),
        }
    }

    #[cfg(test)]
    fn with_binaries(binaries: Vec<(PathBuf, ServiceType)>) -> Self {
        Self { binaries }
    }
}

impl Default for PackageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryMethod for PackageDetector {
    fn kind(&self) -> DiscoveryMethodKind {
        DiscoveryMethodKind::PackageDetector
    }

    fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
        let mut findings = Vec::new();
        for (path, service_type) in &self.binaries {
            if Path::new(path).exists() {
                findings.push(RawFinding {
                    service_type: service_type.clone(),
                    endpoint: SENTINEL_ENDPOINT.to_string(),
                    method: self.kind(),
                    config_path: None,
                    process_name: None,
                });
            }
        }
        Ok(findings)
    }
}
