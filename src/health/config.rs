//! Configuration for health monitoring.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a server's reachability is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckMethod {
    /// Plain TCP connect to (address, port)
    #[default]
    Tcp,
    /// HTTP GET against `http_check_path`, 2xx/3xx is healthy
    Http,
}

impl fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckMethod::Tcp => write!(f, "tcp"),
            CheckMethod::Http => write!(f, "http"),
        }
    }
}

/// Configuration for server health monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Seconds between check cycles
    pub check_interval_seconds: u64,
    /// Timeout for each probe and provider request
    pub timeout_seconds: u64,
    /// Consecutive failures before a healthy server is marked unhealthy
    pub failure_threshold: u32,
    /// Consecutive successes before an unhealthy server is marked healthy
    pub recovery_threshold: u32,
    pub check_method: CheckMethod,
    /// Request path for HTTP checks
    pub http_check_path: String,
    /// Seconds between status summaries in the log (0 disables)
    pub status_interval_seconds: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 30,
            timeout_seconds: 10,
            failure_threshold: 3,
            recovery_threshold: 1,
            check_method: CheckMethod::Tcp,
            http_check_path: "/".to_string(),
            status_interval_seconds: 300,
        }
    }
}

impl MonitoringConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
