//! Guard configuration.
//!
//! Configuration is immutable once constructed; build it at startup and hand
//! it to a [`SessionGuard`](crate::SessionGuard) that is reused across
//! requests.

use std::fmt;
use std::str::FromStr;

use crate::GuardError;

/// Location of the client IP within the request attribute view.
///
/// The original dotted-path form (e.g. `headers.x-forwarded-for` or
/// `connection.remote-address`) is limited to a depth of two segments.
/// Parsing happens at construction time, so a malformed path is a
/// configuration error rather than a per-request lookup into nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSource {
    /// A top-level scalar attribute of the request view.
    Direct(String),
    /// A section plus a key within it, e.g. `headers` / `x-forwarded-for`.
    Nested(String, String),
}

impl IpSource {
    /// Parses a dotted path of at most two segments.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Configuration` for empty paths, empty segments,
    /// or paths deeper than two segments.
    pub fn parse(path: &str) -> Result<Self, GuardError> {
        let segments: Vec<&str> = path.split('.').collect();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(GuardError::Configuration(format!(
                "ip source path '{}' contains an empty segment",
                path
            )));
        }

        match segments.as_slice() {
            [single] => Ok(IpSource::Direct((*single).to_owned())),
            [section, key] => Ok(IpSource::Nested((*section).to_owned(), (*key).to_owned())),
            _ => Err(GuardError::Configuration(format!(
                "ip source path '{}' is deeper than two segments",
                path
            ))),
        }
    }
}

impl FromStr for IpSource {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IpSource::parse(s)
    }
}

impl fmt::Display for IpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpSource::Direct(name) => f.write_str(name),
            IpSource::Nested(section, key) => write!(f, "{}.{}", section, key),
        }
    }
}

impl Default for IpSource {
    fn default() -> Self {
        IpSource::Nested("headers".to_owned(), "x-forwarded-for".to_owned())
    }
}

/// Configuration for the session guard.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Header names whose values feed the fingerprint, in order.
    ///
    /// Missing headers participate as empty segments; position is
    /// significant, presence is not.
    pub hash_fields: Vec<String>,
    /// Where to read the client IP from.
    ///
    /// The default targets applications behind a common reverse proxy
    /// (nginx); use e.g. `connection.remote-address` for direct exposure.
    pub ip_source: IpSource,
    /// Redirect target after a mismatch destroys the session.
    pub redirect_to: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            hash_fields: vec![
                "accept".to_owned(),
                "accept-language".to_owned(),
                "user-agent".to_owned(),
            ],
            ip_source: IpSource::default(),
            redirect_to: "/".to_owned(),
        }
    }
}

impl GuardConfig {
    /// Creates a configuration with the default fields and a custom
    /// `ip_source` path.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Configuration` if the path is malformed.
    pub fn with_ip_source(ip_source: &str) -> Result<Self, GuardError> {
        Ok(Self {
            ip_source: IpSource::parse(ip_source)?,
            ..Default::default()
        })
    }
}
