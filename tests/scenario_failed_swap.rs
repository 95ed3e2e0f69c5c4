//! §8 scenario 3: a candidate config that references an unset environment
//! variable must not replace the active Collector. Apply fails with a
//! nested `MissingEnv`, the active ConfigVersion is unchanged, and the
//! prior Collector is still Ready.

mod common;

use std::sync::Arc;

use nrdot_host::config::schema::ServiceIdentity;
use nrdot_host::orchestrator::CycleOutcome;
use tempfile::tempdir;

#[test]
#[serial_test::serial(redis_password_env)]
fn missing_env_on_the_candidate_preserves_the_active_config() {
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

    let first = orch.run_cycle().unwrap();
    assert!(matches!(first, CycleOutcome::Applied { version: 1 }));
    let active_after_first = engine.current().expect("first cycle recorded a config");
    let pid_after_first = supervisor.status().pid.expect("a collector is active");

    // Force a new candidate (same redis service, different rendered
    // document) and pull the environment variable its receiver needs out
    // from under it before the next cycle runs.
    std::env::remove_var("REDIS_PASSWORD");
    let mut changed = common::user_config();
    changed.service = ServiceIdentity {
        name: None,
        environment: Some("staging".to_string()),
    };
    orch.replace_user_config(changed);

    let second = orch.run_cycle().unwrap();
    assert!(
        matches!(second, CycleOutcome::AppliedFailure { rolled_back: false }),
        "expected the apply to fail on the missing env var with no prior version to roll back to successfully, got {second:?}"
    );

    let active_after_second = engine.current().expect("history still has an entry after the failed cycle");
    assert_eq!(active_after_second.version, active_after_first.version);
    assert_eq!(active_after_second.rendered, active_after_first.rendered);

    let status_after_second = supervisor.status();
    assert!(status_after_second.is_healthy(), "prior collector should still be Ready, got {status_after_second:?}");
    assert_eq!(status_after_second.pid, Some(pid_after_first), "the active process was never touched by the aborted swap");

    supervisor.stop(std::time::Duration::from_millis(200)).unwrap();
    std::env::set_var("REDIS_PASSWORD", "secret");
}
