//! Fingerprint derivation.
//!
//! A fingerprint is the SHA-256 digest of the configured header values,
//! concatenated in declaration order, followed by the country code resolved
//! from the client IP. Missing headers and failed lookups contribute empty
//! segments, so generation is total: it never errors.
//!
//! Segments are concatenated without a delimiter. That makes adjacent empty
//! fields indistinguishable from certain re-splits of the same bytes
//! (`"AB" + ""` hashes like `"A" + "B"`); delimiting them would change every
//! fingerprint of every deployed session, so the behavior is kept as is.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::GuardConfig;
use crate::geo::GeoResolver;
use crate::request::RequestAttributes;

/// Opaque, fixed-length signature of a client profile.
///
/// Lowercase hex, 64 characters. Compared byte-for-byte; never reversed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digests a raw payload into a fingerprint.
    pub(crate) fn digest(payload: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Rehydrates a fingerprint previously persisted by a session store.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives fingerprints from request attributes.
///
/// Pure and stateless: safe to share across arbitrarily many concurrent
/// requests.
pub struct FingerprintGenerator {
    config: GuardConfig,
    geo: Arc<dyn GeoResolver>,
}

impl FingerprintGenerator {
    pub fn new(config: GuardConfig, geo: Arc<dyn GeoResolver>) -> Self {
        log::debug!(
            target: "vigil::fingerprint",
            "msg=\"generator configured\" hash_fields=\"{:?}\" ip_source=\"{}\" redirect_to=\"{}\"",
            config.hash_fields,
            config.ip_source,
            config.redirect_to
        );

        Self { config, geo }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Computes the fingerprint for a request.
    ///
    /// Deterministic for fixed configuration and fixed request attributes
    /// (including the geo result).
    pub fn generate(&self, request: &RequestAttributes) -> Fingerprint {
        let mut payload = String::new();

        for field in &self.config.hash_fields {
            // A missing header is an empty segment, not a skipped one.
            payload.push_str(request.header(field).unwrap_or(""));
        }

        let country = request
            .resolve_ip(&self.config.ip_source)
            .and_then(|ip| self.geo.lookup(ip));

        if let Some(record) = &country {
            payload.push_str(record.iso_code());
        }

        log::debug!(
            target: "vigil::fingerprint",
            "msg=\"payload assembled\" len={} country=\"{}\"",
            payload.len(),
            country.as_ref().map_or("", |c| c.iso_code())
        );

        Fingerprint::digest(&payload)
    }
}
