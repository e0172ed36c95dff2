//! Metrics exporter configuration

use serde::{Deserialize, Serialize};

/// Prometheus exporter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Socket address for the `/metrics` scrape listener
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "127.0.0.1:9464".to_string(),
        }
    }
}
