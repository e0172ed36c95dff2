//! DNS provider abstraction.
//!
//! The failover engine only needs two operations from a provider: read the
//! current value of one address record and create-or-replace it. Providers
//! are used as `Arc<dyn DnsProvider>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod cloudflare;
pub mod dry_run;
pub mod error;
pub mod memory;

pub use cloudflare::CloudflareProvider;
pub use dry_run::DryRunProvider;
pub use error::ProviderError;
pub use memory::InMemoryProvider;

use crate::config::RecordType;

/// Identifies the single record managed by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub zone_id: String,
    /// Fully-qualified record name
    pub name: String,
    pub record_type: RecordType,
}

impl RecordKey {
    pub fn new(zone_id: impl Into<String>, name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            zone_id: zone_id.into(),
            name: name.into(),
            record_type,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.record_type, self.name)
    }
}

/// The provider's view of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier, if the provider has one
    pub id: Option<String>,
    pub record_type: RecordType,
    pub name: String,
    /// Record content (the address)
    pub value: String,
    pub ttl: u32,
}

/// Read/write access to one DNS zone's address records.
///
/// # Cancellation Safety
///
/// Dropping a returned future aborts any in-flight HTTP request. A write
/// that was already accepted by the provider stays applied.
#[async_trait]
pub trait DnsProvider: Send + Sync + 'static {
    /// Human-readable provider name for logging.
    fn name(&self) -> &str;

    /// Fetch the current record, `Ok(None)` if it doesn't exist.
    async fn get_record(&self, key: &RecordKey) -> Result<Option<DnsRecord>, ProviderError>;

    /// Create the record or replace its value and TTL.
    async fn upsert_record(
        &self,
        key: &RecordKey,
        value: &str,
        ttl: u32,
    ) -> Result<DnsRecord, ProviderError>;
}
