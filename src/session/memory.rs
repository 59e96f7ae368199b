//! In-memory session storage.
//!
//! Suitable for tests and single-instance deployments. Sessions are lost
//! when the process restarts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{FINGERPRINT_KEY, SessionHandle, SessionStore};
use crate::GuardError;
use crate::fingerprint::Fingerprint;

type SessionMap = HashMap<String, HashMap<String, String>>;

/// In-memory session store.
///
/// Session records are key-value maps held in a `HashMap` behind a
/// `RwLock`, keyed by session token.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<SessionMap>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live session records.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    type Handle = InMemorySession;

    fn open(&self, token: &str) -> InMemorySession {
        InMemorySession {
            sessions: Arc::clone(&self.sessions),
            token: token.to_owned(),
        }
    }
}

/// Handle to one session record inside an [`InMemorySessionStore`].
#[derive(Clone)]
pub struct InMemorySession {
    sessions: Arc<RwLock<SessionMap>>,
    token: String,
}

#[async_trait]
impl SessionHandle for InMemorySession {
    async fn fingerprint(&self) -> Result<Option<Fingerprint>, GuardError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| GuardError::SessionStore("lock poisoned".to_owned()))?;

        Ok(sessions
            .get(&self.token)
            .and_then(|record| record.get(FINGERPRINT_KEY))
            .map(Fingerprint::from_stored))
    }

    async fn set_fingerprint(&self, fingerprint: &Fingerprint) -> Result<(), GuardError> {
        self.sessions
            .write()
            .map_err(|_| GuardError::SessionStore("lock poisoned".to_owned()))?
            .entry(self.token.clone())
            .or_default()
            .insert(FINGERPRINT_KEY.to_owned(), fingerprint.as_str().to_owned());

        Ok(())
    }

    async fn destroy(&self) -> Result<(), GuardError> {
        self.sessions
            .write()
            .map_err(|_| GuardError::SessionStore("lock poisoned".to_owned()))?
            .remove(&self.token);

        Ok(())
    }
}
