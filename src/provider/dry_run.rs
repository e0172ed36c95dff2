//! Read-through provider wrapper that never writes.

use super::{DnsProvider, DnsRecord, ProviderError, RecordKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Delegates reads to the wrapped provider and only logs writes.
///
/// A suppressed write is remembered and served by later reads of the same
/// record, so a dry run reports one would-be update per change instead of one
/// per tick.
pub struct DryRunProvider {
    inner: Arc<dyn DnsProvider>,
    pending: Mutex<HashMap<RecordKey, DnsRecord>>,
}

impl DryRunProvider {
    pub fn new(inner: Arc<dyn DnsProvider>) -> Self {
        Self {
            inner,
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<RecordKey, DnsRecord>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DnsProvider for DryRunProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_record(&self, key: &RecordKey) -> Result<Option<DnsRecord>, ProviderError> {
        let pending = self.pending().get(key).cloned();
        if let Some(record) = pending {
            return Ok(Some(record));
        }
        self.inner.get_record(key).await
    }

    async fn upsert_record(
        &self,
        key: &RecordKey,
        value: &str,
        ttl: u32,
    ) -> Result<DnsRecord, ProviderError> {
        tracing::warn!(
            provider = self.inner.name(),
            record = %key,
            value = value,
            ttl = ttl,
            "Dry run: DNS update not sent"
        );

        let record = DnsRecord {
            id: None,
            record_type: key.record_type,
            name: key.name.clone(),
            value: value.to_string(),
            ttl,
        };
        self.pending().insert(key.clone(), record.clone());
        Ok(record)
    }
}
