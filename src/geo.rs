//! Country lookup for geo enrichment of the fingerprint.
//!
//! The resolver is an injected collaborator: it must never fail a request.
//! Malformed, private, or unknown IPs resolve to `None`, which the generator
//! folds into a consistent empty segment.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Country derived from a client IP.
///
/// Only the ISO 3166-1 alpha-2 code participates in the fingerprint; its
/// string form is what enters the hash payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    iso_code: String,
}

impl GeoRecord {
    pub fn new(iso_code: impl Into<String>) -> Self {
        Self {
            iso_code: iso_code.into(),
        }
    }

    pub fn iso_code(&self) -> &str {
        &self.iso_code
    }
}

/// Resolves an IP string to a country.
///
/// Implementations must be total: any input that cannot be resolved returns
/// `None` rather than an error.
pub trait GeoResolver: Send + Sync {
    fn lookup(&self, ip: &str) -> Option<GeoRecord>;
}

/// In-memory ip-to-country table.
///
/// Suitable for tests and for deployments that maintain their own mapping.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoResolver {
    table: HashMap<String, GeoRecord>,
}

impl StaticGeoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping from an IP to a country code.
    #[must_use]
    pub fn with_entry(mut self, ip: &str, iso_code: &str) -> Self {
        self.table.insert(ip.to_owned(), GeoRecord::new(iso_code));
        self
    }
}

impl GeoResolver for StaticGeoResolver {
    fn lookup(&self, ip: &str) -> Option<GeoRecord> {
        self.table.get(ip).cloned()
    }
}

#[cfg(feature = "maxmind")]
pub use maxmind::MaxMindGeoResolver;

#[cfg(feature = "maxmind")]
mod maxmind {
    use std::net::IpAddr;
    use std::path::Path;

    use maxminddb::{Reader, geoip2};

    use super::{GeoRecord, GeoResolver};
    use crate::GuardError;

    /// Country resolver backed by a MaxMind GeoLite2/GeoIP2 country database.
    pub struct MaxMindGeoResolver {
        reader: Reader<Vec<u8>>,
    }

    impl MaxMindGeoResolver {
        /// Opens the database file.
        ///
        /// # Errors
        ///
        /// Returns `GuardError::GeoDatabase` if the file cannot be opened or
        /// is not a valid MaxMind database.
        pub fn open(path: impl AsRef<Path>) -> Result<Self, GuardError> {
            let reader = Reader::open_readfile(path.as_ref()).map_err(|e| {
                GuardError::GeoDatabase(format!(
                    "failed to open '{}': {}",
                    path.as_ref().display(),
                    e
                ))
            })?;

            Ok(Self { reader })
        }
    }

    impl GeoResolver for MaxMindGeoResolver {
        fn lookup(&self, ip: &str) -> Option<GeoRecord> {
            let ip_addr: IpAddr = ip.trim().parse().ok()?;

            let country = self.reader.lookup::<geoip2::Country>(ip_addr).ok()?;
            let iso_code = country.country?.iso_code?;

            Some(GeoRecord::new(iso_code))
        }
    }
}
