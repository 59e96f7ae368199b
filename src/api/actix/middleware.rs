//! Session-guard middleware for actix-web.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::{
    HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
};
use futures::future::{LocalBoxFuture, Ready, ok};

use crate::guard::SessionGuard;
use crate::request::RequestAttributes;
use crate::session::{Decision, SessionStore};

/// Session-hijack guard middleware for actix-web.
///
/// On each request carrying a session cookie, derives the client fingerprint
/// and enforces the binding policy. A mismatch destroys the session and
/// short-circuits with a redirect; the inner service never runs. Requests
/// without a session cookie pass through untouched.
///
/// # Example
///
/// ```rust,ignore
/// use vigil::{GuardConfig, SessionGuard, InMemorySessionStore, StaticGeoResolver};
/// use vigil::api::actix::Shield;
/// use std::sync::Arc;
///
/// let guard = Arc::new(SessionGuard::new(
///     GuardConfig::default(),
///     Arc::new(StaticGeoResolver::new()),
/// ));
/// let store = Arc::new(InMemorySessionStore::new());
///
/// App::new()
///     .wrap(Shield::new(guard, store, "session_id"))
///     .route("/account", web::get().to(handler))
/// ```
pub struct Shield<T> {
    guard: Arc<SessionGuard>,
    store: Arc<T>,
    cookie_name: String,
}

impl<T> Shield<T> {
    #[must_use]
    pub fn new(guard: Arc<SessionGuard>, store: Arc<T>, cookie_name: impl Into<String>) -> Self {
        Self {
            guard,
            store,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S, B, T> Transform<S, ServiceRequest> for Shield<T>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
    T: SessionStore + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = ShieldMiddleware<S, T>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ShieldMiddleware {
            service: Rc::new(service),
            guard: Arc::clone(&self.guard),
            store: Arc::clone(&self.store),
            cookie_name: self.cookie_name.clone(),
        })
    }
}

/// The actual middleware service.
pub struct ShieldMiddleware<S, T> {
    service: Rc<S>,
    guard: Arc<SessionGuard>,
    store: Arc<T>,
    cookie_name: String,
}

impl<S, B, T> Service<ServiceRequest> for ShieldMiddleware<S, T>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
    T: SessionStore + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(token) = req
            .request()
            .cookie(&self.cookie_name)
            .map(|cookie| cookie.value().to_owned())
        else {
            // No session to protect.
            let fut = self.service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            });
        };

        let session = self.store.open(&token);
        let attributes = attributes_from_request(req.request());
        let guard = Arc::clone(&self.guard);
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match guard.inspect(&attributes, &session).await {
                Ok(Decision::Continue) => {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Ok(Decision::Reject { redirect_to }) => {
                    let (request, _payload) = req.into_parts();
                    let response = HttpResponse::Found()
                        .insert_header((header::LOCATION, redirect_to))
                        .finish()
                        .map_into_right_body();

                    Ok(ServiceResponse::new(request, response))
                }
                Err(e) => {
                    log::error!(
                        target: "vigil::actix",
                        "msg=\"session store failure\" error=\"{e}\""
                    );

                    let (request, _payload) = req.into_parts();
                    let response = HttpResponse::InternalServerError()
                        .finish()
                        .map_into_right_body();

                    Ok(ServiceResponse::new(request, response))
                }
            }
        })
    }
}

/// Builds the attribute view from an actix request.
///
/// All headers land in the `headers` section; the peer address is exposed as
/// `connection.remote-address` for deployments without a forwarding proxy.
fn attributes_from_request(req: &HttpRequest) -> RequestAttributes {
    let mut attributes = RequestAttributes::new();

    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            attributes = attributes.with_header(name.as_str(), value);
        }
    }

    if let Some(peer) = req.peer_addr() {
        attributes =
            attributes.with_section_value("connection", "remote-address", &peer.ip().to_string());
    }

    attributes
}
