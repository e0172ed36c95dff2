//! In-process DNS provider.
//!
//! Holds records in memory and counts calls. Reads and writes can be made to
//! fail on demand, which lets the synchronizer and engine be exercised
//! without network access.

use super::{DnsProvider, DnsRecord, ProviderError, RecordKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryProvider {
    records: Mutex<HashMap<RecordKey, DnsRecord>>,
    reads: AtomicU64,
    writes: AtomicU64,
    read_failure: Mutex<Option<ProviderError>>,
    write_failure: Mutex<Option<ProviderError>>,
    next_id: AtomicU64,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as if it had been created out-of-band.
    pub fn with_record(self, key: &RecordKey, value: &str, ttl: u32) -> Self {
        self.set_record(key, value, ttl);
        self
    }

    /// Replace a record's value without counting a write.
    pub fn set_record(&self, key: &RecordKey, value: &str, ttl: u32) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = DnsRecord {
            id: Some(format!("mem-{}", id)),
            record_type: key.record_type,
            name: key.name.clone(),
            value: value.to_string(),
            ttl,
        };
        lock(&self.records).insert(key.clone(), record);
    }

    /// Current record, without counting a read.
    pub fn record(&self, key: &RecordKey) -> Option<DnsRecord> {
        lock(&self.records).get(key).cloned()
    }

    /// Current value, without counting a read.
    pub fn value(&self, key: &RecordKey) -> Option<String> {
        self.record(key).map(|r| r.value)
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `upsert_record` calls, including failed ones.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent read fail with `error` (`None` to clear).
    pub fn fail_reads(&self, error: Option<ProviderError>) {
        *lock(&self.read_failure) = error;
    }

    /// Make every subsequent write fail with `error` (`None` to clear).
    pub fn fail_writes(&self, error: Option<ProviderError>) {
        *lock(&self.write_failure) = error;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DnsProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_record(&self, key: &RecordKey) -> Result<Option<DnsRecord>, ProviderError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.read_failure).clone() {
            return Err(error);
        }
        Ok(self.record(key))
    }

    async fn upsert_record(
        &self,
        key: &RecordKey,
        value: &str,
        ttl: u32,
    ) -> Result<DnsRecord, ProviderError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.write_failure).clone() {
            return Err(error);
        }
        self.set_record(key, value, ttl);
        self.record(key)
            .ok_or_else(|| ProviderError::Write("record vanished after write".to_string()))
    }
}
