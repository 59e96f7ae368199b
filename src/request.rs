//! Read-only view of an inbound request.
//!
//! Framework adapters assemble a [`RequestAttributes`] from the real request;
//! tests assemble one directly. Header names are matched case-insensitively.

use std::collections::HashMap;

use crate::config::IpSource;

/// The request attributes the fingerprint is derived from: a header mapping
/// plus an addressable attribute tree of depth at most two.
///
/// The header map doubles as the `headers` section of the tree, so the
/// default `headers.x-forwarded-for` ip source resolves without any extra
/// wiring.
#[derive(Debug, Clone, Default)]
pub struct RequestAttributes {
    headers: HashMap<String, String>,
    values: HashMap<String, String>,
    sections: HashMap<String, HashMap<String, String>>,
}

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header; the name is lowercased for lookup.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_owned());
        self
    }

    /// Adds a top-level scalar attribute, resolvable via `IpSource::Direct`.
    #[must_use]
    pub fn with_value(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Adds a value under a named section of the attribute tree, e.g.
    /// `connection` / `remote-address`.
    #[must_use]
    pub fn with_section_value(mut self, section: &str, key: &str, value: &str) -> Self {
        self.sections
            .entry(section.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        self
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Resolves the client IP per the configured source.
    ///
    /// Returns `None` when the addressed attribute does not exist; the
    /// caller treats that as an empty segment, never as an error.
    pub fn resolve_ip(&self, source: &IpSource) -> Option<&str> {
        match source {
            IpSource::Direct(name) => self.values.get(name).map(String::as_str),
            IpSource::Nested(section, key) if section == "headers" => self.header(key),
            IpSource::Nested(section, key) => self
                .sections
                .get(section)
                .and_then(|s| s.get(key))
                .map(String::as_str),
        }
    }
}
