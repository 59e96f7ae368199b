//! Session binding: the stateful half of the guard.
//!
//! The binder never talks to a concrete store. It is handed a
//! [`SessionHandle`], the narrow interface a session backend must expose:
//! read the stored fingerprint, write it once, destroy the whole session.

mod memory;

pub use memory::{InMemorySession, InMemorySessionStore};

use async_trait::async_trait;

use crate::GuardError;
use crate::fingerprint::Fingerprint;

/// Well-known key under which the fingerprint lives in the session record.
pub const FINGERPRINT_KEY: &str = "unique-session";

/// Outcome of inspecting one request against its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed to the next stage of the pipeline.
    Continue,
    /// The session was destroyed; redirect the client and stop processing.
    Reject {
        redirect_to: String,
    },
}

/// The per-request session record, as seen by the binder.
///
/// Implementations wrap whatever backend holds session state. The backend is
/// expected to serialize access per session key (typical of cookie-backed
/// session middleware); the binder does not add its own locking.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Returns the fingerprint stored on this session, if any.
    async fn fingerprint(&self) -> Result<Option<Fingerprint>, GuardError>;

    /// Returns whether a fingerprint has been stored on this session.
    async fn has_fingerprint(&self) -> Result<bool, GuardError> {
        Ok(self.fingerprint().await?.is_some())
    }

    /// Stores the fingerprint under [`FINGERPRINT_KEY`].
    async fn set_fingerprint(&self, fingerprint: &Fingerprint) -> Result<(), GuardError>;

    /// Invalidates the entire session server-side.
    ///
    /// A subsequent request presenting the same session token must observe a
    /// fresh, unbound session.
    async fn destroy(&self) -> Result<(), GuardError>;
}

/// Opens session handles for the session identified by a request's token.
pub trait SessionStore: Send + Sync {
    type Handle: SessionHandle;

    fn open(&self, token: &str) -> Self::Handle;
}

/// The binding state machine.
///
/// Two states per session, one absorbing failure transition:
/// unbound sessions adopt the request's fingerprint; bound sessions must
/// reproduce it or cease to exist.
#[derive(Debug, Clone)]
pub struct SessionBinder {
    redirect_to: String,
}

impl SessionBinder {
    pub fn new(redirect_to: impl Into<String>) -> Self {
        Self {
            redirect_to: redirect_to.into(),
        }
    }

    /// Applies the binding policy for one request.
    ///
    /// Session mutation happens only here, after the fingerprint has already
    /// been computed; a request cancelled upstream mutates nothing.
    ///
    /// # Errors
    ///
    /// Propagates `GuardError::SessionStore` when the store fails. There is
    /// no retry; the surrounding pipeline's error handling takes over.
    pub async fn bind<S: SessionHandle>(
        &self,
        session: &S,
        fingerprint: &Fingerprint,
    ) -> Result<Decision, GuardError> {
        match session.fingerprint().await? {
            None => {
                session.set_fingerprint(fingerprint).await?;
                Ok(Decision::Continue)
            }
            Some(stored) if stored == *fingerprint => Ok(Decision::Continue),
            Some(_) => {
                log::warn!(
                    target: "vigil::session",
                    "msg=\"fingerprint mismatch, destroying session\" redirect_to=\"{}\"",
                    self.redirect_to
                );
                session.destroy().await?;

                Ok(Decision::Reject {
                    redirect_to: self.redirect_to.clone(),
                })
            }
        }
    }
}
