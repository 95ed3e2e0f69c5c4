use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::bounded;

use crate::discovery::correlate::{correlate, drop_excluded};
use crate::discovery::error::DiscoveryError;
use crate::discovery::helper_client::PrivilegedHelperClient;
use crate::discovery::methods::config_locator::ConfigLocator;
use crate::discovery::methods::package_detector::PackageDetector;
use crate::discovery::methods::port_scanner::PortScanner;
use crate::discovery::methods::process_scanner::ProcessScanner;
use crate::discovery::methods::DiscoveryMethod;
use crate::discovery::snapshot::DiscoverySnapshot;
use crate::utils::threads::spawn_named_thread;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Runs every [`DiscoveryMethod`] concurrently on its own thread and joins
/// their results into one [`DiscoverySnapshot`]. A method that doesn't
/// finish within the cycle deadline is treated as having found nothing
/// rather than blocking the whole cycle.
pub struct DiscoveryEngine {
    methods: Vec<Arc<dyn DiscoveryMethod>>,
    deadline: Duration,
    next_id: AtomicU64,
}

impl DiscoveryEngine {
    pub fn new() -> Self {
        Self::with_methods(
            vec![
                Arc::new(ProcessScanner::new()) as Arc<dyn DiscoveryMethod>,
                Arc::new(PortScanner::new()),
                Arc::new(ConfigLocator::new()),
                Arc::new(PackageDetector::new()),
            ],
            DEFAULT_DEADLINE,
        )
    }

    /// Like [`Self::new`], but wires `helper` into the `ProcessScanner` and
    /// `PortScanner` so each can delegate reads it can't perform directly
    /// (§4.3) instead of treating the corresponding process or socket
    /// table as absent.
    pub fn with_privileged_helper(helper: Arc<dyn PrivilegedHelperClient>) -> Self {
        Self::with_methods(
            vec![
                Arc::new(ProcessScanner::with_helper(Arc::clone(&helper))) as Arc<dyn DiscoveryMethod>,
                Arc::new(PortScanner::with_helper(helper)),
                Arc::new(ConfigLocator::new()),
                Arc::new(PackageDetector::new()),
            ],
            DEFAULT_DEADLINE,
        )
    }

    pub fn with_methods(methods: Vec<Arc<dyn DiscoveryMethod>>, deadline: Duration) -> Self {
        Self {
            methods,
            deadline,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn run_cycle(
        &self,
        exclude: &std::collections::HashSet<String>,
    ) -> Result<DiscoverySnapshot, DiscoveryError> {
        let start = Instant::now();
        let (tx, rx) = bounded(self.methods.len());

        for method in &self.methods {
            let method = Arc::clone(method);
            let tx = tx.clone();
            spawn_named_thread(format!("{:?}", method.kind()), move || {
                let result = method.scan();
                let _ = tx.send(result);
            });
        }
        drop(tx);

        let mut findings = Vec::new();
        let mut remaining = self.methods.len();
        let mut deadline_exceeded = false;
        let mut methods_errored = 0usize;

        while remaining > 0 {
            let elapsed = start.elapsed();
            if elapsed >= self.deadline {
                deadline_exceeded = true;
                break;
            }
            match rx.recv_timeout(self.deadline - elapsed) {
                Ok(Ok(method_findings)) => findings.extend(method_findings),
                Ok(Err(err)) => {
                    tracing::warn!(%err, "discovery method failed, degrading confidence rather than failing the cycle");
                    methods_errored += 1;
                }
                Err(_) => {
                    deadline_exceeded = true;
                    break;
                }
            }
            remaining -= 1;
        }

        if deadline_exceeded && findings.is_empty() {
            return Err(DiscoveryError::DeadlineExceeded);
        }

        if !self.methods.is_empty() && methods_errored == self.methods.len() {
            return Err(DiscoveryError::AllMethodsFailed(methods_errored));
        }

        let services = drop_excluded(correlate(findings), exclude);

        Ok(DiscoverySnapshot::new(
            self.next_id.fetch_add(1, Ordering::SeqCst),
            services,
            start.elapsed(),
        ))
    }
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::service::{DiscoveryMethodKind, RawFinding, ServiceType};

    struct StubMethod {
        kind: DiscoveryMethodKind,
        findings: Vec<RawFinding>,
    }

    impl DiscoveryMethod for StubMethod {
        fn kind(&self) -> DiscoveryMethodKind {
            self.kind
        }
        fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
            Ok(self.findings.clone())
        }
    }

    #[test]
    fn run_cycle_correlates_across_methods() {
        let engine = DiscoveryEngine::with_methods(
            vec![
                Arc::new(StubMethod {
                    kind: DiscoveryMethodKind::PortScan,
                    findings: vec![RawFinding {
                        service_type: ServiceType::Mysql,
                        endpoint: "127.0.0.1:3306".to_string(),
                        method: DiscoveryMethodKind::PortScan,
                        config_path: None,
                        process_name: None,
                    }],
                }),
                Arc::new(StubMethod {
                    kind: DiscoveryMethodKind::ConfigLocator,
                    findings: vec![RawFinding {
                        service_type: ServiceType::Mysql,
                        endpoint: "127.0.0.1:3306".to_string(),
                        method: DiscoveryMethodKind::ConfigLocator,
                        config_path: Some("/etc/mysql/my.cnf".to_string()),
                        process_name: None,
                    }],
                }),
            ],
            Duration::from_secs(2),
        );

        let snapshot = engine.run_cycle(&std::collections::HashSet::new()).unwrap();
        assert_eq!(snapshot.services.len(), 1);
        assert_eq!(snapshot.services[0].methods.len(), 2);
    }

    #[test]
    fn snapshot_ids_increase_across_cycles() {
        let engine = DiscoveryEngine::with_methods(vec![], Duration::from_millis(50));
        let first = engine.run_cycle(&std::collections::HashSet::new());
        let second = engine.run_cycle(&std::collections::HashSet::new());
        assert_eq!(first.unwrap().id, 1);
        assert_eq!(second.unwrap().id, 2);
    }

    struct FailingMethod(DiscoveryMethodKind);

    impl DiscoveryMethod for FailingMethod {
        fn kind(&self) -> DiscoveryMethodKind {
            self.0
        }
        fn scan(&self) -> Result<Vec<RawFinding>, DiscoveryError> {
            Err(DiscoveryError::MethodFailed(format!("{:?}", self.0), "boom".to_string()))
        }
    }

    #[test]
    fn one_failing_method_degrades_rather_than_fails_the_cycle() {
        let engine = DiscoveryEngine::with_methods(
            vec![
                Arc::new(FailingMethod(DiscoveryMethodKind::ProcessScan)),
                Arc::new(StubMethod {
                    kind: DiscoveryMethodKind::PortScan,
                    findings: vec![RawFinding {
                        service_type: ServiceType::Redis,
                        endpoint: "127.0.0.1:6379".to_string(),
                        method: DiscoveryMethodKind::PortScan,
                        config_path: None,
                        process_name: None,
                    }],
                }),
            ],
            Duration::from_secs(2),
        );

        let snapshot = engine.run_cycle(&std::collections::HashSet::new()).unwrap();
        assert_eq!(snapshot.services.len(), 1);
    }

    #[test]
    fn every_method_failing_fails_the_cycle() {
        let engine = DiscoveryEngine::with_methods(
            vec![
                Arc::new(FailingMethod(DiscoveryMethodKind::ProcessScan)),
                Arc::new(FailingMethod(DiscoveryMethodKind::PortScan)),
                Arc::new(FailingMethod(DiscoveryMethodKind::ConfigLocator)),
                Arc::new(FailingMethod(DiscoveryMethodKind::PackageDetector)),
            ],
            Duration::from_secs(2),
        );

        let err = engine.run_cycle(&std::collections::HashSet::new()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DiscoveryFailed);
        assert!(matches!(err, DiscoveryError::AllMethodsFailed(4)));
    }
}
