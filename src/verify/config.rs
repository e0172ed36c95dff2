//! Configuration for propagation checks.

use serde::{Deserialize, Serialize};

/// A DNS-over-HTTPS resolver speaking the JSON API (`application/dns-json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub name: String,
    pub url: String,
}

impl ResolverConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Configuration for `verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub resolvers: Vec<ResolverConfig>,
    /// Also ask the operating system's resolver
    pub include_system_resolver: bool,
    /// Timeout per resolver query
    pub timeout_seconds: u64,
    /// Seconds between rounds while waiting
    pub poll_interval_seconds: u64,
    /// Fraction of answering resolvers that must agree (0.0..=1.0)
    pub quorum: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            resolvers: vec![
                ResolverConfig::new("Google", "https://dns.google/resolve"),
                ResolverConfig::new("Cloudflare", "https://cloudflare-dns.com/dns-query"),
            ],
            include_system_resolver: true,
            timeout_seconds: 10,
            poll_interval_seconds: 15,
            quorum: 0.7,
        }
    }
}
