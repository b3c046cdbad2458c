//! Integration tests for the API.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::json;
use tower::ServiceExt;

use fns_client::api::{NetworkConfigResponse, create_router};
use fns_client::app::{AppState, ManagePage, NavAction, NavBar, SessionProvider};
use fns_client::domain::{
    ErrorResponse, HealthResponse, HealthStatus, QuoteState, SessionSnapshot,
};
use fns_client::infra::FlowNetworkConfig;
use fns_client::test_utils::{MockChainGateway, MockWallet, sample_domain, test_owner};

const HASH: &str = "f1e2d3";

struct TestApp {
    router: Router,
    gateway: Arc<MockChainGateway>,
    wallet: Arc<MockWallet>,
    session: Arc<SessionProvider>,
    state: Arc<AppState>,
}

fn create_test_app() -> TestApp {
    let owner = test_owner();
    let gateway = Arc::new(
        MockChainGateway::new().with_domain(sample_domain(&owner, "alice.fns", HASH)),
    );
    let wallet = Arc::new(MockWallet::with_account(owner));
    let session = SessionProvider::start(wallet.clone(), gateway.clone());
    let state = Arc::new(AppState::new(
        Arc::clone(&session),
        gateway.clone(),
        FlowNetworkConfig::testnet(),
    ));
    TestApp {
        router: create_router(Arc::clone(&state)),
        gateway,
        wallet,
        session,
        state,
    }
}

async fn logged_in_app() -> TestApp {
    let app = create_test_app();
    app.session.log_in().await.unwrap();
    let mut rx = app.session.subscribe();
    tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| s.is_initialized))
        .await
        .unwrap()
        .unwrap();
    app
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = body_json(response).await;
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.chain, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_health_check_unhealthy() {
    let app = create_test_app();
    app.gateway.set_healthy(false);

    let response = app.router.oneshot(get("/health")).await.unwrap();
    let health: HealthResponse = body_json(response).await;
    assert_eq!(health.chain, HealthStatus::Unhealthy);
}

#[tokio::test]
async fn test_config_entries() {
    let app = create_test_app();

    let response = app.router.oneshot(get("/config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let config: NetworkConfigResponse = body_json(response).await;
    assert_eq!(
        config.entries.get("accessNode.api").map(String::as_str),
        Some("https://rest-testnet.onflow.org")
    );
    assert_eq!(
        config.entries.get("0xDomains").map(String::as_str),
        Some("0x2566f24c5d792f8f")
    );
}

#[tokio::test]
async fn test_nav_follows_session() {
    let app = create_test_app();

    let response = app.router.clone().oneshot(get("/nav")).await.unwrap();
    let nav: NavBar = body_json(response).await;
    assert_eq!(nav.control.label, "Login");
    assert_eq!(nav.control.action, NavAction::Login);

    let app = logged_in_app().await;
    let response = app.router.oneshot(get("/nav")).await.unwrap();
    let nav: NavBar = body_json(response).await;
    assert_eq!(nav.control.label, "Log Out");
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_json("/session/login", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = app.router.clone().oneshot(get("/session")).await.unwrap();
    let snapshot: SessionSnapshot = body_json(response).await;
    assert_eq!(snapshot.session.addr, Some(test_owner()));
    assert!(snapshot.is_initialized);

    app.wallet.set_deliver_logout(false);
    let response = app
        .router
        .oneshot(post_json("/session/logout", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot: SessionSnapshot = body_json(response).await;
    assert_eq!(snapshot.session.addr, None);
    assert!(!snapshot.session.logged_in);
    assert!(!snapshot.is_initialized);
}

#[tokio::test]
async fn test_manage_requires_login() {
    let app = create_test_app();

    let response = app.router.oneshot(get(&format!("/manage/{}", HASH))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.error.r#type, "authentication_error");
}

#[tokio::test]
async fn test_manage_renders_page() {
    let app = logged_in_app().await;

    let response = app
        .router
        .oneshot(get(&format!("/manage/{}", HASH)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: ManagePage = body_json(response).await;
    assert_eq!(page.title, "Flow Name Service - Manage Domain");
    assert_eq!(page.name, "alice.fns");
    assert_eq!(page.bio, "Not Set");
    assert_eq!(page.address, "Not Set");
    assert!(matches!(page.quote, QuoteState::Ready { .. }));
}

#[tokio::test]
async fn test_manage_uninitialized_account_renders_nothing() {
    let app = logged_in_app().await;
    app.gateway.set_initialized(&test_owner(), false);
    app.session.check_init().await.unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/manage/{}", HASH)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.gateway.domain_reads(), 0);
}

#[tokio::test]
async fn test_manage_after_account_uninitialized_renders_nothing() {
    let app = logged_in_app().await;
    let uri = format!("/manage/{}", HASH);

    let response = app.router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reads = app.gateway.domain_reads();

    app.gateway.set_initialized(&test_owner(), false);
    assert!(!app.session.check_init().await.unwrap());

    let response = app.router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.gateway.domain_reads(), reads);

    let response = app
        .router
        .oneshot(get(&format!("{}/quote?years=1", uri)))
        .await
        .unwrap();
    let quote: QuoteState = body_json(response).await;
    assert_eq!(quote, QuoteState::Unknown);
}

#[tokio::test]
async fn test_manage_unknown_domain() {
    let app = logged_in_app().await;

    let response = app.router.oneshot(get("/manage/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_domains_do_not_accumulate_views() {
    let app = logged_in_app().await;

    for i in 0..5 {
        let response = app
            .router
            .clone()
            .oneshot(get(&format!("/manage/unknown{}", i)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    assert_eq!(app.state.manager_count(), 0);

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/manage/{}", HASH)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.state.manager_count(), 1);

    let response = app
        .router
        .oneshot(post_json("/session/logout", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.state.manager_count(), 0);
}

#[tokio::test]
async fn test_update_bio_flow() {
    let app = logged_in_app().await;
    let uri = format!("/manage/{}", HASH);

    let response = app.router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(post_json(&format!("{}/bio", uri), json!({"bio": "gm frens"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: ManagePage = body_json(response).await;
    assert_eq!(page.bio, "gm frens");
    assert!(!page.loading);
}

#[tokio::test]
async fn test_update_address_rejects_invalid_address() {
    let app = logged_in_app().await;
    let uri = format!("/manage/{}", HASH);
    app.router.clone().oneshot(get(&uri)).await.unwrap();

    let response = app
        .router
        .oneshot(post_json(
            &format!("{}/address", uri),
            json!({"address": "0xnothex"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.gateway.submissions().is_empty());
}

#[tokio::test]
async fn test_renew_zero_years_is_rejected() {
    let app = logged_in_app().await;
    let uri = format!("/manage/{}", HASH);
    app.router.clone().oneshot(get(&uri)).await.unwrap();

    let response = app
        .router
        .oneshot(post_json(&format!("{}/renew", uri), json!({"years": 0})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.error.r#type, "validation_error");
    assert!(app.gateway.submissions().is_empty());
}

#[tokio::test]
async fn test_renew_extends_expiry() {
    let app = logged_in_app().await;
    let uri = format!("/manage/{}", HASH);
    app.router.clone().oneshot(get(&uri)).await.unwrap();

    let response = app
        .router
        .oneshot(post_json(&format!("{}/renew", uri), json!({"years": 1})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: ManagePage = body_json(response).await;
    assert_eq!(page.expires_at, "2024-11-13");
}

#[tokio::test]
async fn test_quote_for_years() {
    let app = logged_in_app().await;
    app.gateway.set_price_per_year(1.5);
    let uri = format!("/manage/{}", HASH);
    app.router.clone().oneshot(get(&uri)).await.unwrap();

    let response = app
        .router
        .oneshot(get(&format!("{}/quote?years=2", uri)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let quote: QuoteState = body_json(response).await;
    match quote {
        QuoteState::Ready { quote } => {
            assert_eq!(quote.duration_secs, 63_072_000);
            assert!((quote.cost - 3.0).abs() < 1e-9);
        }
        other => panic!("unexpected quote: {:?}", other),
    }
    assert_eq!(
        app.gateway.rent_cost_calls().last(),
        Some(&("alice".to_string(), 63_072_000))
    );
}

#[tokio::test]
async fn test_concurrent_update_conflicts() {
    let app = logged_in_app().await;
    app.gateway.set_seal_delay(Duration::from_millis(150));
    let uri = format!("/manage/{}", HASH);
    app.router.clone().oneshot(get(&uri)).await.unwrap();

    let first = {
        let router = app.router.clone();
        let uri = format!("{}/bio", uri);
        tokio::spawn(async move { router.oneshot(post_json(&uri, json!({"bio": "one"}))).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(&format!("{}/bio", uri), json!({"bio": "two"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = body_json(response).await;
    assert_eq!(error.error.r#type, "mutation_in_progress");

    let response = first.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: ManagePage = body_json(response).await;
    assert_eq!(page.bio, "one");
}

#[tokio::test]
async fn test_reload_during_update_reports_loading() {
    let app = logged_in_app().await;
    app.gateway.set_seal_delay(Duration::from_millis(150));
    let uri = format!("/manage/{}", HASH);
    app.router.clone().oneshot(get(&uri)).await.unwrap();

    let update = {
        let router = app.router.clone();
        let uri = format!("{}/bio", uri);
        tokio::spawn(async move { router.oneshot(post_json(&uri, json!({"bio": "gm"}))).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let response = app.router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: ManagePage = body_json(response).await;
    assert!(page.loading);

    let response = update.await.unwrap().unwrap();
    let page: ManagePage = body_json(response).await;
    assert_eq!(page.bio, "gm");
    assert!(!page.loading);
}

#[tokio::test]
async fn test_failed_read_after_load_renders_error() {
    let app = logged_in_app().await;
    let uri = format!("/manage/{}", HASH);
    app.router.clone().oneshot(get(&uri)).await.unwrap();

    app.gateway.set_fail_reads(true);
    let response = app.router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let doc: serde_json::Value = body_json(response).await;
    assert!(doc["paths"]["/manage/{name_hash}/renew"].is_object());
}
