//! §8 scenario 1: cold start, no remote config, one service discovered —
//! the orchestrator should discover, generate, sign, and apply against an
//! empty active configuration with no prior history.

mod common;

use std::sync::Arc;

use nrdot_host::orchestrator::CycleOutcome;
use tempfile::tempdir;

#[test]
#[serial_test::serial(redis_password_env)]
fn first_cycle_discovers_generates_and_applies_with_no_prior_state() {
    std::env::set_var("REDIS_PASSWORD", "secret");

    let dir = tempdir().unwrap();
    let engine = common::engine();
    let discovery = common::discovery_with_findings(vec![common::redis_finding()]);
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

    assert!(engine.current().is_none(), "no prior config before the first cycle");

    let outcome = orch.run_cycle().unwrap();
    assert!(matches!(outcome, CycleOutcome::Applied { version: 1 }));

    let active = engine.current().expect("a config was generated and recorded");
    assert_eq!(active.version.0, 1);
    assert!(active.rendered.contains("redis"));
    common::assert_healthy(&supervisor.status());

    std::env::remove_var("REDIS_PASSWORD");
}
