//! DNS record policy configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address record type managed by the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RecordType {
    #[default]
    A,
    AAAA,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
        }
    }

    /// Whether `value` is a valid address for this record type.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            RecordType::A => value.parse::<Ipv4Addr>().is_ok(),
            RecordType::AAAA => value.parse::<Ipv6Addr>().is_ok(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::AAAA),
            _ => Err(format!("Unsupported record type: {}", s)),
        }
    }
}

/// Whether two record values name the same address.
///
/// Providers return IPv6 in canonical form (`2001:db8::1`) whatever form was
/// written, so values are compared as parsed addresses when both parse.
pub fn same_address(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// How the synchronizer learns the record's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Read the live record on every reconciliation
    #[default]
    Always,
    /// Trust the last applied value; read only when nothing is cached
    Cached,
}

/// DNS record configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub record_type: RecordType,
    /// TTL in seconds written with every update
    pub ttl: u32,
    pub read_policy: ReadPolicy,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            record_type: RecordType::A,
            ttl: 300,
            read_policy: ReadPolicy::Always,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_config_defaults() {
        let config = DnsConfig::default();
        assert_eq!(config.record_type, RecordType::A);
        assert_eq!(config.ttl, 300);
        assert_eq!(config.read_policy, ReadPolicy::Always);
    }

    #[test]
    fn test_dns_config_toml() {
        let toml = r#"
            record_type = "AAAA"
            ttl = 60
            read_policy = "cached"
        "#;
        let config: DnsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.record_type, RecordType::AAAA);
        assert_eq!(config.ttl, 60);
        assert_eq!(config.read_policy, ReadPolicy::Cached);
    }

    #[test]
    fn test_record_type_accepts() {
        assert!(RecordType::A.accepts("203.0.113.7"));
        assert!(!RecordType::A.accepts("2001:db8::7"));
        assert!(RecordType::AAAA.accepts("2001:db8::7"));
        assert!(!RecordType::AAAA.accepts("example.com"));
    }

    #[test]
    fn test_same_address_ignores_ipv6_spelling() {
        assert!(same_address("2001:DB8:0:0::1", "2001:db8::1"));
        assert!(same_address("192.0.2.1", "192.0.2.1"));
        assert!(!same_address("2001:db8::1", "2001:db8::2"));
        assert!(!same_address("192.0.2.1", "192.0.2.10"));
        assert!(!same_address("host.example.com", "192.0.2.1"));
    }

    #[test]
    fn test_record_type_from_str() {
        assert_eq!("a".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::AAAA);
        assert!("CNAME".parse::<RecordType>().is_err());
    }
}
