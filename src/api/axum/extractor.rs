//! Session-guard extractor for axum.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::GuardError;
use crate::guard::SessionGuard;
use crate::request::RequestAttributes;
use crate::session::{Decision, SessionStore};

/// Application state for the [`Guarded`] extractor.
pub struct GuardContext<T> {
    guard: Arc<SessionGuard>,
    store: Arc<T>,
    cookie_name: String,
}

impl<T> GuardContext<T> {
    #[must_use]
    pub fn new(guard: Arc<SessionGuard>, store: Arc<T>, cookie_name: impl Into<String>) -> Self {
        Self {
            guard,
            store,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<T> Clone for GuardContext<T> {
    fn clone(&self) -> Self {
        Self {
            guard: Arc::clone(&self.guard),
            store: Arc::clone(&self.store),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

/// Extractor that enforces the session binding policy.
///
/// Add it to a handler's parameters to guard the route. Requests whose
/// fingerprint diverges from the one bound to their session are rejected
/// with a redirect after the session has been destroyed; requests without a
/// session cookie pass through.
///
/// # Example
///
/// ```rust,ignore
/// async fn account(_guard: Guarded) -> &'static str {
///     "only reachable with a consistent fingerprint"
/// }
///
/// let context = GuardContext::new(guard, store, "session_id");
/// let app = Router::new()
///     .route("/account", get(account))
///     .with_state(context);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Guarded;

/// Rejection type for [`Guarded`].
#[derive(Debug)]
pub enum GuardRejection {
    /// The fingerprint diverged; the session is gone and the client is sent
    /// to the configured redirect target.
    Hijacked { redirect_to: String },
    /// The session store failed.
    Store(GuardError),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            GuardRejection::Hijacked { redirect_to } => {
                (StatusCode::FOUND, [(header::LOCATION, redirect_to)]).into_response()
            }
            GuardRejection::Store(e) => {
                log::error!(
                    target: "vigil::axum",
                    "msg=\"session store failure\" error=\"{e}\""
                );
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl<T> FromRequestParts<GuardContext<T>> for Guarded
where
    T: SessionStore + 'static,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GuardContext<T>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers, &state.cookie_name) else {
            // No session to protect.
            return Ok(Guarded);
        };

        let session = state.store.open(&token);
        let attributes = attributes_from_parts(parts);

        match state.guard.inspect(&attributes, &session).await {
            Ok(Decision::Continue) => Ok(Guarded),
            Ok(Decision::Reject { redirect_to }) => Err(GuardRejection::Hijacked { redirect_to }),
            Err(e) => Err(GuardRejection::Store(e)),
        }
    }
}

/// Reads the session token from the `Cookie` header.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == cookie_name).then(|| value.to_owned())
    })
}

/// Builds the attribute view from request parts.
///
/// The peer address is exposed as `connection.remote-address` when the
/// router was served with connect info.
fn attributes_from_parts(parts: &Parts) -> RequestAttributes {
    let mut attributes = RequestAttributes::new();

    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            attributes = attributes.with_header(name.as_str(), value);
        }
    }

    if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        attributes =
            attributes.with_section_value("connection", "remote-address", &peer.ip().to_string());
    }

    attributes
}
