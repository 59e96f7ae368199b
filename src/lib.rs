//! Request-authentication guard that detects session hijacking.
//!
//! `vigil` binds a session to a stable fingerprint of the client's connection
//! characteristics: selected request headers plus a country code derived from
//! the client IP. The first request observed on a session stores the
//! fingerprint; every later request must reproduce it exactly, or the whole
//! session is destroyed and the client is redirected.
//!
//! The crate is framework-agnostic at its core ([`SessionGuard`]) and ships
//! adapters for actix-web (`actix` feature) and axum (`axum_support` feature).

pub mod config;
pub mod fingerprint;
pub mod geo;
pub mod guard;
pub mod request;
pub mod session;

#[cfg(any(feature = "actix", feature = "axum_support"))]
pub mod api;

pub use config::{GuardConfig, IpSource};
pub use fingerprint::{Fingerprint, FingerprintGenerator};
pub use geo::{GeoRecord, GeoResolver, StaticGeoResolver};
pub use guard::SessionGuard;
pub use request::RequestAttributes;
pub use session::{
    Decision, FINGERPRINT_KEY, InMemorySession, InMemorySessionStore, SessionBinder,
    SessionHandle, SessionStore,
};

#[cfg(feature = "maxmind")]
pub use geo::MaxMindGeoResolver;

use std::fmt;

/// Errors produced by the guard and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// Construction-time misconfiguration, e.g. a malformed `ip_source` path.
    Configuration(String),
    /// The session store failed; fatal for the request, never retried here.
    SessionStore(String),
    /// A GeoIP database could not be opened at construction time.
    GeoDatabase(String),
}

impl std::error::Error for GuardError {}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            GuardError::SessionStore(msg) => write!(f, "session store error: {}", msg),
            GuardError::GeoDatabase(msg) => write!(f, "geo database error: {}", msg),
        }
    }
}
