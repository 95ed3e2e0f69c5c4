//! §8 scenario 6: RBAC and rate limiting at the Control API boundary. A
//! Viewer token may read discovery but not trigger a reload; an Operator
//! token floods a rate-limited route and only the first `burst` requests
//! within the window succeed.

mod common;

use std::sync::Arc;

use actix_web::{test, web, App};
use tempfile::tempdir;

use nrdot_host::api::handlers;
use nrdot_host::api::rate_limit::RateLimiter;
use nrdot_host::api::state::ApiState;
use nrdot_host::api::token_store;
use nrdot_host::config::schema::{RateLimitKey, RateLimitSection, Role, TokenEntry};
use nrdot_host::telemetry::Metrics;

fn state(rate_limit: Option<RateLimitSection>) -> web::Data<ApiState> {
    // Leak the tempdir so its paths outlive the test's App factory closures,
    // which actix may invoke more than once per worker.
    let dir: &'static tempfile::TempDir = &*Box::leak(Box::new(tempdir().unwrap()));

    let engine = common::engine();
    let discovery = common::empty_discovery();
    let supervisor = common::supervisor(dir, Arc::new(common::AlwaysReady));
    let (publisher, _consumer) = common::orchestrator_parts();
    let orchestrator = Arc::new(common::orchestrator(
        Arc::clone(&engine),
        Arc::clone(&discovery),
        Arc::clone(&supervisor),
        None,
        common::user_config(),
        publisher,
    ));

    let tokens = vec![
        TokenEntry { token: "viewer-token".to_string(), role: Role::Viewer },
        TokenEntry { token: "operator-token".to_string(), role: Role::Operator },
    ];

    web::Data::from(Arc::new(ApiState {
        engine,
        discovery,
        supervisor,
        orchestrator,
        metrics: Arc::new(Metrics::new().unwrap()),
        token_store: token_store::shared(&tokens),
        rate_limiter: Arc::new(RateLimiter::new(rate_limit)),
    }))
}

macro_rules! test_app {
    ($data:expr) => {
        App::new()
            .app_data($data)
            .route("/v1/discovery", web::get().to(handlers::discovery))
            .route("/v1/config/reload", web::post().to(handlers::config_reload))
    };
}

#[actix_web::test]
async fn viewer_token_reads_discovery_but_cannot_trigger_a_reload() {
    let data = state(None);
    let app = test::init_service(test_app!(data)).await;

    let read_req = test::TestRequest::get()
        .uri("/v1/discovery")
        .insert_header(("Authorization", "Bearer viewer-token"))
        .to_request();
    let read_resp = test::call_service(&app, read_req).await;
    assert_eq!(read_resp.status(), 200);

    let reload_req = test::TestRequest::post()
        .uri("/v1/config/reload")
        .insert_header(("Authorization", "Bearer viewer-token"))
        .to_request();
    let reload_resp = test::call_service(&app, reload_req).await;
    assert_eq!(reload_resp.status(), 403);
}

#[actix_web::test]
async fn operator_flood_is_rate_limited_after_the_burst() {
    let burst = 3;
    let data = state(Some(RateLimitSection {
        key: RateLimitKey::TokenIdentity,
        burst,
        refill_per_second: 0.001, // effectively no refill within the test
    }));
    let app = test::init_service(test_app!(data)).await;

    for i in 0..burst {
        let req = test::TestRequest::get()
            .uri("/v1/discovery")
            .insert_header(("Authorization", "Bearer operator-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200, "request {i} within the burst should succeed");
    }

    let over_budget = test::TestRequest::get()
        .uri("/v1/discovery")
        .insert_header(("Authorization", "Bearer operator-token"))
        .to_request();
    let resp = test::call_service(&app, over_budget).await;
    assert_eq!(resp.status(), 429);

    // A different token identity has its own untouched bucket.
    let other_token_req = test::TestRequest::get()
        .uri("/v1/discovery")
        .insert_header(("Authorization", "Bearer viewer-token"))
        .to_request();
    let resp = test::call_service(&app, other_token_req).await;
    assert_eq!(resp.status(), 200);
}
