//! Device discovery.
//!
//! Picks the serial port that most likely belongs to the keyboard by matching
//! port descriptors against a keyword table.

use crate::error::{Error, Result};
use crate::transport::Discovery;
use crate::types::SerialEndpoint;

/// Descriptor keywords that identify ZMK boards and common USB serial bridges.
pub const DEFAULT_KEYWORDS: &[&str] = &["usb serial", "cdc", "acm", "arduino", "nice"];

/// Descriptor given to endpoints named explicitly by the user.
pub const USER_SUPPLIED: &str = "user supplied";

/// Resolves which endpoint to monitor.
#[derive(Debug, Clone)]
pub struct Resolver {
    keywords: Vec<String>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl Resolver {
    /// Creates a resolver matching the given keywords.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the configured keywords.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns every endpoint whose descriptor contains a keyword, in
    /// enumeration order.
    #[must_use]
    pub fn candidates<'a>(&self, endpoints: &'a [SerialEndpoint]) -> Vec<&'a SerialEndpoint> {
        endpoints
            .iter()
            .filter(|endpoint| self.keywords.iter().any(|k| endpoint.matches(k)))
            .collect()
    }

    /// Resolves the endpoint to open.
    ///
    /// An explicit port id bypasses discovery entirely; whether it exists is
    /// only checked when it is opened.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        discovery: &impl Discovery,
    ) -> Result<SerialEndpoint> {
        if let Some(id) = explicit {
            return Ok(SerialEndpoint::new(id, USER_SUPPLIED));
        }

        let endpoints = discovery.endpoints()?;
        tracing::debug!("enumerated {} serial ports", endpoints.len());

        let candidates = self.candidates(&endpoints);
        if !candidates.is_empty() {
            let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
            tracing::debug!("candidate devices: {:?}", ids);
        }

        candidates
            .into_iter()
            .next()
            .cloned()
            .ok_or_else(|| Error::NotFound {
                keywords: self.keywords.clone(),
            })
    }
}
