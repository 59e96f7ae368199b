//! End-to-end tests for the fingerprint guard against an in-memory session
//! store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use vigil::{
    Decision, Fingerprint, GuardConfig, GuardError, InMemorySessionStore, IpSource,
    RequestAttributes, SessionGuard, SessionHandle, SessionStore, StaticGeoResolver,
};

fn login_guard() -> SessionGuard {
    let config = GuardConfig {
        hash_fields: vec!["accept".to_owned(), "user-agent".to_owned()],
        ip_source: IpSource::parse("headers.x-forwarded-for").unwrap(),
        redirect_to: "/login".to_owned(),
    };
    let geo = StaticGeoResolver::new()
        .with_entry("1.2.3.4", "US")
        .with_entry("5.6.7.8", "DE");

    SessionGuard::new(config, Arc::new(geo))
}

fn request(accept: &str, user_agent: &str, ip: &str) -> RequestAttributes {
    RequestAttributes::new()
        .with_header("accept", accept)
        .with_header("user-agent", user_agent)
        .with_header("x-forwarded-for", ip)
}

#[tokio::test]
async fn first_contact_binds_session_and_allows_request() {
    let guard = login_guard();
    let store = InMemorySessionStore::new();
    let session = store.open("token-1");

    let decision = guard
        .inspect(&request("text/html", "A", "1.2.3.4"), &session)
        .await
        .unwrap();

    assert_eq!(decision, Decision::Continue);
    assert!(session.has_fingerprint().await.unwrap());
}

#[tokio::test]
async fn stable_client_passes_repeatedly() {
    let guard = login_guard();
    let store = InMemorySessionStore::new();
    let session = store.open("token-1");

    guard
        .inspect(&request("text/html", "A", "1.2.3.4"), &session)
        .await
        .unwrap();
    let bound = session.fingerprint().await.unwrap();

    for _ in 0..5 {
        let decision = guard
            .inspect(&request("text/html", "A", "1.2.3.4"), &session)
            .await
            .unwrap();
        assert_eq!(decision, Decision::Continue);
    }

    assert_eq!(session.fingerprint().await.unwrap(), bound);
}

#[tokio::test]
async fn changed_user_agent_destroys_session_and_redirects() {
    let guard = login_guard();
    let store = InMemorySessionStore::new();
    let session = store.open("token-1");

    // Request 1: accept=text/html, user-agent=A, 1.2.3.4 resolves to US.
    guard
        .inspect(&request("text/html", "A", "1.2.3.4"), &session)
        .await
        .unwrap();

    // Request 2, same session, only the user agent differs.
    let decision = guard
        .inspect(&request("text/html", "B", "1.2.3.4"), &session)
        .await
        .unwrap();

    assert_eq!(
        decision,
        Decision::Reject {
            redirect_to: "/login".to_owned()
        }
    );
    assert!(store.is_empty());

    // The original token now behaves as a fresh, unbound session.
    let session = store.open("token-1");
    assert!(!session.has_fingerprint().await.unwrap());
    let decision = guard
        .inspect(&request("text/html", "B", "1.2.3.4"), &session)
        .await
        .unwrap();
    assert_eq!(decision, Decision::Continue);
}

#[tokio::test]
async fn changed_country_destroys_session() {
    let guard = login_guard();
    let store = InMemorySessionStore::new();
    let session = store.open("token-1");

    guard
        .inspect(&request("text/html", "A", "1.2.3.4"), &session)
        .await
        .unwrap();

    // Same headers, but the token is replayed from another country.
    let decision = guard
        .inspect(&request("text/html", "A", "5.6.7.8"), &session)
        .await
        .unwrap();

    assert_eq!(
        decision,
        Decision::Reject {
            redirect_to: "/login".to_owned()
        }
    );
}

#[tokio::test]
async fn missing_header_binds_like_empty_header() {
    let guard = login_guard();
    let store = InMemorySessionStore::new();
    let session = store.open("token-1");

    let without_accept = RequestAttributes::new()
        .with_header("user-agent", "A")
        .with_header("x-forwarded-for", "1.2.3.4");
    guard.inspect(&without_accept, &session).await.unwrap();

    let with_empty_accept = without_accept.clone().with_header("accept", "");
    let decision = guard.inspect(&with_empty_accept, &session).await.unwrap();

    assert_eq!(decision, Decision::Continue);
}

#[tokio::test]
async fn sessions_do_not_interfere() {
    let guard = login_guard();
    let store = InMemorySessionStore::new();

    let alice = store.open("alice");
    let bob = store.open("bob");

    guard
        .inspect(&request("text/html", "A", "1.2.3.4"), &alice)
        .await
        .unwrap();
    guard
        .inspect(&request("application/json", "B", "5.6.7.8"), &bob)
        .await
        .unwrap();

    // Alice diverging must not touch Bob's binding.
    guard
        .inspect(&request("text/html", "Z", "1.2.3.4"), &alice)
        .await
        .unwrap();

    assert!(bob.has_fingerprint().await.unwrap());
    assert_eq!(store.len(), 1);
}

/// Session handle whose store is down.
struct BrokenSession;

#[async_trait]
impl SessionHandle for BrokenSession {
    async fn fingerprint(&self) -> Result<Option<Fingerprint>, GuardError> {
        Err(GuardError::SessionStore("connection refused".to_owned()))
    }

    async fn set_fingerprint(&self, _fingerprint: &Fingerprint) -> Result<(), GuardError> {
        Err(GuardError::SessionStore("connection refused".to_owned()))
    }

    async fn destroy(&self) -> Result<(), GuardError> {
        Err(GuardError::SessionStore("connection refused".to_owned()))
    }
}

#[tokio::test]
async fn store_failure_propagates() {
    let guard = login_guard();

    let result = guard
        .inspect(&request("text/html", "A", "1.2.3.4"), &BrokenSession)
        .await;

    assert_eq!(
        result,
        Err(GuardError::SessionStore("connection refused".to_owned()))
    );
}
