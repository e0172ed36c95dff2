//! Server pool configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// A backend server eligible to receive the DNS record.
///
/// Immutable for the lifetime of the process. Lower `priority` values are
/// preferred; equal priorities are ordered by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerSpec {
    /// Unique server name (used for logging and tie-breaking)
    pub name: String,
    /// Address published in the DNS record and probed for health
    pub address: String,
    /// Port probed by health checks
    pub port: u16,
    /// Static preference, lower number = higher preference
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_priority() -> u32 {
    100
}

impl ServerSpec {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16, priority: u32) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            priority,
        }
    }

    /// Host part suitable for a URL authority (IPv6 literals are bracketed).
    pub fn url_host(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]", self.address)
        } else {
            self.address.clone()
        }
    }
}

impl fmt::Display for ServerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.address, self.port)
    }
}
