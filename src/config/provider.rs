//! DNS provider credentials

use serde::{Deserialize, Serialize};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare API credentials and the record being managed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_token: String,
    pub zone_id: String,
    /// Fully-qualified record name (e.g. "app.example.com")
    pub domain_name: String,
    pub api_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            zone_id: String::new(),
            domain_name: String::new(),
            api_base_url: CLOUDFLARE_API_BASE.to_string(),
        }
    }
}

// Keeps the token out of `?config` debug logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &"<redacted>")
            .field("zone_id", &self.zone_id)
            .field("domain_name", &self.domain_name)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Returns true for empty values and untouched `YOUR_...` template placeholders.
pub(crate) fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.starts_with("YOUR_")
}
