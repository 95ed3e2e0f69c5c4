//! §8 scenario 4: discovery method degradation. One failing method lowers
//! confidence but still lets the cycle proceed; every method failing fails
//! the cycle outright with kind `DiscoveryFailed` rather than silently
//! producing an empty snapshot.

mod common;

use std::sync::Arc;
use std::time::Duration;

use nrdot_host::discovery::error::DiscoveryError;
use nrdot_host::discovery::service::{Confidence, DiscoveryMethodKind};
use nrdot_host::discovery::DiscoveryEngine;
use nrdot_host::error::ErrorKind;
use nrdot_host::orchestrator::CycleOutcome;
use tempfile::tempdir;

#[test]
#[serial_test::serial(redis_password_env)]
fn one_method_failing_still_produces_a_degraded_but_usable_snapshot() {
    std::env::set_var("REDIS_PASSWORD", "secret");

    let dir = tempdir().unwrap();
    let engine = common::engine();
    let discovery = Arc::new(DiscoveryEngine::with_methods(
        vec![
            Arc::new(common::AlwaysFailsMethod(DiscoveryMethodKind::ProcessScan)),
            Arc::new(common::FixedMethod {
                kind: DiscoveryMethodKind::PortScan,
                findings: vec![common::redis_finding()],
            }),
        ],
        Duration::from_secs(2),
    ));
    let supervisor = common::supervisor(&dir, Arc::new(common::AlwaysReady));
    let (publisher, _consumer) = common::orchestrator_parts();

    let orch = common::orchestrator(
        Arc::clone(&engine),
        discovery,
        Arc::clone(&supervisor),
        None,
        common::user_config(),
        publisher,
    );

    let outcome = orch.run_cycle().unwrap();
    assert!(matches!(outcome, CycleOutcome::Applied { version: 1 }));

    let active = engine.current().unwrap();
    assert!(active.rendered.contains("redis"), "degraded discovery still found the service by port alone");

    supervisor.stop(Duration::from_millis(200)).unwrap();
    std::env::remove_var("REDIS_PASSWORD");
}

#[test]
fn every_method_failing_fails_the_discovery_cycle_with_discovery_failed_kind() {
    let discovery = DiscoveryEngine::with_methods(
        vec![
            Arc::new(common::AlwaysFailsMethod(DiscoveryMethodKind::ProcessScan)),
            Arc::new(common::AlwaysFailsMethod(DiscoveryMethodKind::PortScan)),
            Arc::new(common::AlwaysFailsMethod(DiscoveryMethodKind::ConfigLocator)),
            Arc::new(common::AlwaysFailsMethod(DiscoveryMethodKind::PackageDetector)),
        ],
        Duration::from_secs(2),
    );

    let err = discovery.run_cycle(&common::exclude_none()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DiscoveryFailed);
    assert!(matches!(err, DiscoveryError::AllMethodsFailed(4)));
}

#[test]
fn a_single_corroborating_method_is_reported_at_low_confidence() {
    let discovery = DiscoveryEngine::with_methods(
        vec![Arc::new(common::FixedMethod {
            kind: DiscoveryMethodKind::PortScan,
            findings: vec![common::redis_finding()],
        })],
        Duration::from_secs(2),
    );

    let snapshot = discovery.run_cycle(&common::exclude_none()).unwrap();
    assert_eq!(snapshot.services.len(), 1);
    assert_eq!(snapshot.services[0].confidence, Confidence::Low);
}
