//! §8 scenario 2: a reachable remote config service returns a document
//! that should take precedence over the local user document for rendering
//! (§4.5: the fetched body, once signature-verified by the client layer,
//! replaces the local document for that cycle).

mod common;

use std::sync::Arc;

use nrdot_host::config::schema::{ServiceIdentity, UserConfig};
use nrdot_host::orchestrator::CycleOutcome;
use nrdot_host::remote::{RemoteConfigClient, RemoteConfigResponse};
use tempfile::tempdir;

#[test]
#[serial_test::serial(redis_password_env)]
fn remote_document_overrides_the_local_one_for_generation() {
    std::env::set_var("REDIS_PASSWORD", "secret");

    let dir = tempdir().unwrap();
    let engine = common::engine();
    let discovery = common::discovery_with_findings(vec![common::redis_finding()]);
    let supervisor = common::supervisor(&dir, Arc::new(common::AlwaysReady));

    let mut local = common::user_config();
    local.service = ServiceIdentity {
        name: Some("local-name".to_string()),
        environment: None,
    };

    let mut remote_document = local.clone();
    remote_document.service.name = Some("remote-name".to_string());

    let transport = common::FixedTransport(RemoteConfigResponse::Updated {
        remote_config_version: 1,
        document: serde_json::to_value(&remote_document).unwrap(),
    });
    let remote = Arc::new(RemoteConfigClient::new(
        Box::new(transport),
        common::paths(&dir).remote_config_cache_file(),
    ));

    let (publisher, _consumer) = common::orchestrator_parts();
    let orch = common::orchestrator(
        Arc::clone(&engine),
        discovery,
        supervisor,
        Some(remote),
        local,
        publisher,
    );

    let outcome = orch.run_cycle().unwrap();
    assert!(matches!(outcome, CycleOutcome::Applied { .. }));

    let active = engine.current().unwrap();
    assert!(active.rendered.contains("remote-name"), "rendered document: {}", active.rendered);
    assert!(!active.rendered.contains("local-name"));

    // Verify UserConfig round-trips through JSON the way the remote client
    // expects, so this test stays honest about the wire shape.
    let _: UserConfig = serde_json::from_value(serde_json::to_value(&remote_document).unwrap()).unwrap();

    std::env::remove_var("REDIS_PASSWORD");
}
