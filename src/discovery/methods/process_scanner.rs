use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::discovery::error::DiscoveryError;
use crate::discovery::helper_client::PrivilegedHelperClient;
use crate::discovery::methods::DiscoveryMethod;
use crate::discovery::service::{DiscoveryMethodKind, RawFinding, ServiceType, SENTINEL_ENDPOINT};

/// Walks `/proc/<pid>/comm` looking for well-known service process names.
/// Reports the sentinel endpoint since a process name alone doesn't carry a
/// port — [`crate::discovery::correlate`] folds it into whichever port
/// scanner finding of the same type exists when corroborating.
pub struct ProcessScanner {
    proc_dir: std::path::PathBuf,
    helper: Option<Arc<dyn PrivilegedHelperClient>>,
}

impl ProcessScanner {
    pub fn new() -> Self {
        Self {
            proc_dir: Path::new("/proc").to_path_buf(),
            helper: None,
        }
    }

    /// Uses `helper` as a fallback reader for `comm` files this process
    /// can't read directly (§4.3: process info for processes not owned by
    /// the agent's account is delegated to the `PrivilegedHelper`) instead
    /// of silently skipping them.
    pub fn with_helper(helper: Arc<dyn PrivilegedHelperClient>) -> Self {
        Self {
            proc_dir: Path::new("/proc").to_path_buf(),
            helper: Some(helper),
        }
    }

    #[cfg(test)]
    fn with_proc_dir(proc_dir: std::path::PathBuf) -> Self {
        Self { proc_dir, helper: None }
    }

    #[cfg(test)]
    fn with_proc_dir_and_helper(
        proc_dir: std::path::PathBuf,
        helper: Arc<dyn PrivilegedHelperClient>,
    ) -> Self {
        Self {
            proc_dir,
            helper: Some(helper),
        }
    }

    fn read_comm(&self, comm_path: &Path) -> Option<String> {
        match fs::read_to_string(comm_path) {
            Ok(comm) => Some(comm),
            Err(_) => self
                .helper
                .as_ref()
                .and_then(|helper| helper.read_file(&comm_path.display().to_string()).ok()),
        }
    }
}

impl Default for ProcessScanner {
    fn default() -> Self {
        Self::new()
    }
}

const KNOWN_PROCESSES: &[(&str, ServiceTypeTag)] = &[
    ("mysqld", ServiceTypeTag::Mysql),
    ("postgres", ServiceTypeTag::Postgresql),
    ("nginx", ServiceTypeTag::Nginx),
    ("redis-server", ServiceTypeTag::Redis),
];

enum ServiceTypeTag {
    Mysql,
    Postgresql,
    Nginx,
    Redis,
}

impl ServiceTypeTag {
    fn to_service_type(&self) -> ServiceType {
        match self {
            ServiceTypeTag::Mysql => ServiceType::Mysql,
            ServiceTypeTag::Postgresql => ServiceType::Postgresql,
            ServiceTypeTag::Nginx => ServiceType::Nginx,
            ServiceTypeTag::Redis => ServiceType::Redis,
        }
    }
}

impl DiscoveryMethod for ProcessScanner {
    fn kind(&self) -> DiscoveryMethodKind {
        DiscoveryMethodKind::ProcessScan
    }

    fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
        let mut findings = Vec::new();

        let entries = match fs::read_dir(&self.proc_dir) {
            Ok(entries) => entries,
            Err(err) => {
                return Err(DiscoveryError::MethodFailed(
                    "process_scanner".to_string(),
                    err.to_string(),
                ))
            }
        };

        for entry in entries.flatten() {
            let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };
            let comm_path = entry.path().join("comm");
            let Some(comm) = self.read_comm(&comm_path) else {
                continue;
            };
            let comm = comm.trim();

            if let Some((_, tag)) = KNOWN_PROCESSES.iter().find(|(name, _)| *name == comm) {
                findings.push(RawFinding {
                    service_type: tag.to_service_type(),
                    endpoint: SENTINEL_ENDPOINT.to_string(),
                    method: self.kind(),
                    config_path: None,
                    process_name: Some(format!("{comm} (pid {pid})")),
                });
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_process(proc_dir: &Path, pid: &str, comm: &str) {
        let dir = proc_dir.join(pid);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
    }

    #[test]
    fn finds_known_process_by_comm() {
        let dir = tempdir().unwrap();
        write_process(dir.path(), "123", "mysqld");
        write_process(dir.path(), "456", "bash");

        let scanner = ProcessScanner::with_proc_dir(dir.path().to_path_buf());
        let findings = scanner.scan().unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].service_type, ServiceType::Mysql);
    }

    #[test]
    fn empty_proc_dir_yields_no_findings() {
        let dir = tempdir().unwrap();
        let scanner = ProcessScanner::with_proc_dir(dir.path().to_path_buf());
        assert!(scanner.scan().unwrap().is_empty());
    }

    mockall::mock! {
        pub Helper {}
        impl PrivilegedHelperClient for Helper {
            fn read_file(&self, path: &str) -> Result<String, DiscoveryError>;
            fn list_dir(&self, path: &str) -> Result<Vec<String>, DiscoveryError>;
            fn read_net_info(&self) -> Result<serde_json::Value, DiscoveryError>;
            fn check_port(&self, port: u16) -> Result<bool, DiscoveryError>;
        }
    }

    #[test]
    fn falls_back_to_helper_when_comm_is_unreadable() {
        let dir = tempdir().unwrap();
        let pid_dir = dir.path().join("789");
        fs::create_dir_all(&pid_dir).unwrap();
        // No `comm` file written: the direct read fails and must fall
        // back to the helper.

        let mut helper = MockHelper::new();
        helper
            .expect_read_file()
            .withf(|path: &str| path.ends_with("789/comm"))
            .returning(|_| Ok("nginx\n".to_string()));

        let scanner = ProcessScanner::with_proc_dir_and_helper(dir.path().to_path_buf(), Arc::new(helper));
        let findings = scanner.scan().unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].service_type, ServiceType::Nginx);
    }

    #[test]
    fn helper_failure_is_treated_as_no_finding() {
        let dir = tempdir().unwrap();
        let pid_dir = dir.path().join("321");
        fs::create_dir_all(&pid_dir).unwrap();

        let mut helper = MockHelper::new();
        helper
            .expect_read_file()
            .returning(|_| Err(DiscoveryError::HelperUnavailable("denied".to_string())));

        let scanner = ProcessScanner::with_proc_dir_and_helper(dir.path().to_path_buf(), Arc::new(helper));
        assert!(scanner.scan().unwrap().is_empty());
    }
}
