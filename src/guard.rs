//! The per-request guard: fingerprint generation composed with binding.

use std::sync::Arc;

use crate::GuardError;
use crate::config::GuardConfig;
use crate::fingerprint::FingerprintGenerator;
use crate::geo::GeoResolver;
use crate::request::RequestAttributes;
use crate::session::{Decision, SessionBinder, SessionHandle};

/// Inspects each request against its session, invalidating the session when
/// the client's fingerprint diverges from the one bound at first contact.
///
/// Construct once per process (or per distinct configuration) and share
/// across requests; all per-request state lives in the session store.
pub struct SessionGuard {
    generator: FingerprintGenerator,
    binder: SessionBinder,
}

impl SessionGuard {
    pub fn new(config: GuardConfig, geo: Arc<dyn GeoResolver>) -> Self {
        let binder = SessionBinder::new(config.redirect_to.clone());

        Self {
            generator: FingerprintGenerator::new(config, geo),
            binder,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        self.generator.config()
    }

    /// Runs the guard for one request.
    ///
    /// Generates the fingerprint, then applies the binding policy. The
    /// session is mutated only after generation succeeds.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::SessionStore` when the session store fails;
    /// fingerprint generation itself cannot fail.
    pub async fn inspect<S: SessionHandle>(
        &self,
        request: &RequestAttributes,
        session: &S,
    ) -> Result<Decision, GuardError> {
        let fingerprint = self.generator.generate(request);

        log::debug!(
            target: "vigil::guard",
            "msg=\"inspecting request\" fingerprint=\"{}\"",
            fingerprint
        );

        self.binder.bind(session, &fingerprint).await
    }
}
