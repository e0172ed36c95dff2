//! Configuration module for dns-failover
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`DNS_FAILOVER_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use dns_failover::config::FailoverConfig;
//!
//! let toml = r#"
//! [provider]
//! domain_name = "app.example.com"
//!
//! [[servers]]
//! name = "primary"
//! address = "192.0.2.10"
//! port = 443
//! priority = 1
//! "#;
//! let config: FailoverConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.servers[0].name, "primary");
//! assert_eq!(config.monitoring.failure_threshold, 3);
//! ```

pub mod dns;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod server;

pub use dns::{same_address, DnsConfig, ReadPolicy, RecordType};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use metrics::MetricsConfig;
pub use provider::ProviderConfig;
pub use server::ServerSpec;

// Re-export section configs owned by their modules
pub use crate::health::{CheckMethod, MonitoringConfig};
pub use crate::verify::VerifyConfig;

use crate::provider::RecordKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Bundled example configuration, written by `config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../dns-failover.example.toml");

/// Unified configuration for the failover service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FailoverConfig {
    /// DNS provider credentials and record name
    pub provider: ProviderConfig,
    /// Server pool
    pub servers: Vec<ServerSpec>,
    /// Health check policy
    pub monitoring: MonitoringConfig,
    /// Record type, TTL and read policy
    pub dns: DnsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    /// Propagation check resolvers
    pub verify: VerifyConfig,
}

impl FailoverConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports DNS_FAILOVER_* environment variables for credentials and logging.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var("DNS_FAILOVER_API_TOKEN") {
            self.provider.api_token = token;
        }
        if let Ok(zone) = std::env::var("DNS_FAILOVER_ZONE_ID") {
            self.provider.zone_id = zone;
        }
        if let Ok(domain) = std::env::var("DNS_FAILOVER_DOMAIN") {
            self.provider.domain_name = domain;
        }

        if let Ok(level) = std::env::var("DNS_FAILOVER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DNS_FAILOVER_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// The record managed by this configuration.
    pub fn record_key(&self) -> RecordKey {
        RecordKey::new(
            self.provider.zone_id.clone(),
            self.provider.domain_name.clone(),
            self.dns.record_type,
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_provider()?;
        self.validate_servers()?;
        self.validate_monitoring()?;

        if self.dns.ttl == 0 {
            return Err(ConfigError::validation("dns.ttl", "TTL must be at least 1"));
        }

        Ok(())
    }

    fn validate_provider(&self) -> Result<(), ConfigError> {
        let fields = [
            ("provider.api_token", &self.provider.api_token),
            ("provider.zone_id", &self.provider.zone_id),
            ("provider.domain_name", &self.provider.domain_name),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field.to_string()));
            }
            if provider::is_placeholder(value) {
                return Err(ConfigError::validation(
                    field,
                    "replace the placeholder with a real value",
                ));
            }
        }
        Ok(())
    }

    fn validate_servers(&self) -> Result<(), ConfigError> {
        if self.servers.len() < 2 {
            return Err(ConfigError::validation(
                "servers",
                "at least two servers are required for failover",
            ));
        }

        let mut names = HashSet::new();
        for (i, server) in self.servers.iter().enumerate() {
            if server.name.trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("servers[{}].name", i),
                    "name cannot be empty",
                ));
            }
            if !names.insert(server.name.as_str()) {
                return Err(ConfigError::validation(
                    format!("servers[{}].name", i),
                    format!("duplicate server name '{}'", server.name),
                ));
            }
            if server.port == 0 {
                return Err(ConfigError::validation(
                    format!("servers[{}].port", i),
                    "port must be non-zero",
                ));
            }
            if !self.dns.record_type.accepts(&server.address) {
                return Err(ConfigError::validation(
                    format!("servers[{}].address", i),
                    format!(
                        "'{}' is not a valid address for a {} record",
                        server.address, self.dns.record_type
                    ),
                ));
            }
        }
        Ok(())
    }

    fn validate_monitoring(&self) -> Result<(), ConfigError> {
        let m = &self.monitoring;
        if m.failure_threshold == 0 {
            return Err(ConfigError::validation(
                "monitoring.failure_threshold",
                "must be at least 1",
            ));
        }
        if m.recovery_threshold == 0 {
            return Err(ConfigError::validation(
                "monitoring.recovery_threshold",
                "must be at least 1",
            ));
        }
        if m.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "monitoring.timeout_seconds",
                "must be at least 1",
            ));
        }
        if m.timeout_seconds >= m.check_interval_seconds {
            return Err(ConfigError::validation(
                "monitoring.timeout_seconds",
                format!(
                    "must be less than check_interval_seconds ({})",
                    m.check_interval_seconds
                ),
            ));
        }
        if m.check_method == CheckMethod::Http && !m.http_check_path.starts_with('/') {
            return Err(ConfigError::validation(
                "monitoring.http_check_path",
                "must start with '/'",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn valid_config() -> FailoverConfig {
        let mut config: FailoverConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        config.provider.api_token = "token".to_string();
        config.provider.zone_id = "zone".to_string();
        config
    }

    #[test]
    fn test_config_defaults() {
        let config = FailoverConfig::default();
        assert!(config.servers.is_empty());
        assert_eq!(config.monitoring.check_interval_seconds, 30);
        assert_eq!(config.dns.ttl, 300);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_config_parse_example() {
        let config: FailoverConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.provider.domain_name, "app.example.com");
    }

    #[test]
    fn test_example_with_credentials_validates() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn test_example_placeholders_rejected() {
        let config: FailoverConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "provider.api_token"));
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = valid_config();
        config.provider.zone_id = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(ref f)) if f == "provider.zone_id"
        ));
    }

    #[test]
    fn test_requires_two_servers() {
        let mut config = valid_config();
        config.servers.truncate(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_server_names() {
        let mut config = valid_config();
        config.servers[1].name = config.servers[0].name.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate server name"));
    }

    #[test]
    fn test_address_must_match_record_type() {
        let mut config = valid_config();
        config.dns.record_type = RecordType::AAAA;
        assert!(config.validate().is_err());

        config.servers[0].address = "2001:db8::1".to_string();
        config.servers[1].address = "2001:db8::2".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_timeout_must_be_below_interval() {
        let mut config = valid_config();
        config.monitoring.check_interval_seconds = 10;
        config.monitoring.timeout_seconds = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("monitoring.timeout_seconds"));
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        let mut config = valid_config();
        config.monitoring.failure_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.monitoring.recovery_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_path_must_be_absolute() {
        let mut config = valid_config();
        config.monitoring.check_method = CheckMethod::Http;
        config.monitoring.http_check_path = "health".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_record_key() {
        let key = valid_config().record_key();
        assert_eq!(key.zone_id, "zone");
        assert_eq!(key.name, "app.example.com");
        assert_eq!(key.record_type, RecordType::A);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[dns]\nttl = 120").unwrap();

        let config = FailoverConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.dns.ttl, 120);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = FailoverConfig::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[dns\nttl = ").unwrap();
        let result = FailoverConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_env_override_credentials() {
        std::env::set_var("DNS_FAILOVER_ZONE_ID", "zone-from-env");
        let config = FailoverConfig::default().with_env_overrides();
        std::env::remove_var("DNS_FAILOVER_ZONE_ID");

        assert_eq!(config.provider.zone_id, "zone-from-env");
    }

    #[test]
    fn test_config_env_override_log_format() {
        std::env::set_var("DNS_FAILOVER_LOG_FORMAT", "json");
        let config = FailoverConfig::default().with_env_overrides();
        std::env::remove_var("DNS_FAILOVER_LOG_FORMAT");

        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
