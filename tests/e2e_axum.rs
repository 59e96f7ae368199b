//! End-to-end tests for the axum extractor adapter.
//!
//! Run with: `cargo test --features axum_support --test e2e_axum`

#![cfg(feature = "axum_support")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use tower::ServiceExt;

use vigil::api::axum::{GuardContext, Guarded};
use vigil::{GuardConfig, InMemorySessionStore, IpSource, SessionGuard, StaticGeoResolver};

const COOKIE_NAME: &str = "session_id";

async fn account(_guard: Guarded) -> &'static str {
    "account page"
}

fn create_app(store: Arc<InMemorySessionStore>) -> Router {
    let config = GuardConfig {
        hash_fields: vec!["accept".to_owned(), "user-agent".to_owned()],
        ip_source: IpSource::parse("headers.x-forwarded-for").unwrap(),
        redirect_to: "/login".to_owned(),
    };
    let geo = StaticGeoResolver::new().with_entry("1.2.3.4", "US");
    let guard = Arc::new(SessionGuard::new(config, Arc::new(geo)));

    Router::new()
        .route("/account", get(account))
        .with_state(GuardContext::new(guard, store, COOKIE_NAME))
}

fn guarded_request(user_agent: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/account")
        .header("Accept", "text/html")
        .header("User-Agent", user_agent)
        .header("X-Forwarded-For", ip)
        .header(header::COOKIE, format!("{COOKIE_NAME}=token-1"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn consistent_client_is_served() {
    let store = Arc::new(InMemorySessionStore::new());
    let app = create_app(Arc::clone(&store));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(guarded_request("Mozilla/5.0", "1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn divergent_client_is_redirected_and_session_destroyed() {
    let store = Arc::new(InMemorySessionStore::new());
    let app = create_app(Arc::clone(&store));

    let response = app
        .clone()
        .oneshot(guarded_request("Mozilla/5.0", "1.2.3.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(guarded_request("curl/8.0", "1.2.3.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    assert!(store.is_empty());

    // Fresh binding after destruction.
    let response = app
        .oneshot(guarded_request("curl/8.0", "1.2.3.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn request_without_session_cookie_passes_through() {
    let store = Arc::new(InMemorySessionStore::new());
    let app = create_app(Arc::clone(&store));

    let request = Request::builder()
        .uri("/account")
        .header("User-Agent", "Mozilla/5.0")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.is_empty());
}
