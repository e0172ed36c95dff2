//! DNS record reconciliation.
//!
//! Turns a [`SelectionResult`] into at most one provider write. The
//! synchronizer writes only when the record's value differs from the chosen
//! server's address, never writes when nothing is selected, and keeps
//! retrying on later ticks until a write sticks.

use crate::config::{same_address, DnsConfig, ReadPolicy};
use crate::provider::{DnsProvider, ProviderError, RecordKey};
use crate::selection::SelectionResult;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Why reconciliation left the record alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoChangeReason {
    /// No healthy server; the last value is kept in place
    NoTarget,
    /// The record already holds the chosen address
    AlreadyCurrent,
}

/// What one reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    NoChange { reason: NoChangeReason },
    Updated { from: Option<String>, to: String },
    Failed { error: ProviderError },
}

impl ReconcileAction {
    pub fn is_update(&self) -> bool {
        matches!(self, ReconcileAction::Updated { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ReconcileAction::Failed { .. })
    }
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileAction::NoChange {
                reason: NoChangeReason::NoTarget,
            } => write!(f, "no change (no healthy target)"),
            ReconcileAction::NoChange {
                reason: NoChangeReason::AlreadyCurrent,
            } => write!(f, "no change (record current)"),
            ReconcileAction::Updated { from: Some(from), to } => {
                write!(f, "updated {} -> {}", from, to)
            }
            ReconcileAction::Updated { from: None, to } => write!(f, "created {}", to),
            ReconcileAction::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// Keeps one DNS record in line with the selected server.
pub struct DnsSynchronizer {
    provider: Arc<dyn DnsProvider>,
    key: RecordKey,
    ttl: u32,
    read_policy: ReadPolicy,
    /// Last value observed at or written to the provider. Advisory only.
    applied: Option<String>,
}

impl DnsSynchronizer {
    pub fn new(provider: Arc<dyn DnsProvider>, key: RecordKey, config: &DnsConfig) -> Self {
        Self {
            provider,
            key,
            ttl: config.ttl,
            read_policy: config.read_policy,
            applied: None,
        }
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn provider(&self) -> &Arc<dyn DnsProvider> {
        &self.provider
    }

    /// Cached value from the last read or successful write.
    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    /// Read the live record once and seed the cache.
    ///
    /// Returns the current value (or `None` when the record doesn't exist).
    pub async fn prime(&mut self) -> Result<Option<String>, ProviderError> {
        let current = self.read_current().await?;
        self.applied = current.clone();
        Ok(current)
    }

    /// Bring the record in line with `selection`.
    pub async fn reconcile(&mut self, selection: &SelectionResult) -> ReconcileAction {
        let Some(target) = selection.target_address() else {
            tracing::warn!(
                record = %self.key,
                reason = %selection.reason,
                current = ?self.applied,
                "No healthy target; leaving DNS record unchanged"
            );
            return ReconcileAction::NoChange {
                reason: NoChangeReason::NoTarget,
            };
        };

        let current = match self.current_value().await {
            Ok(current) => current,
            Err(error) => return self.fail(error),
        };

        if current.as_deref().is_some_and(|value| same_address(value, target)) {
            self.applied = current;
            tracing::debug!(record = %self.key, value = target, "DNS record already current");
            return ReconcileAction::NoChange {
                reason: NoChangeReason::AlreadyCurrent,
            };
        }

        match self.provider.upsert_record(&self.key, target, self.ttl).await {
            Ok(record) => {
                tracing::info!(
                    record = %self.key,
                    from = ?current,
                    to = %record.value,
                    server = ?selection.chosen_name(),
                    "DNS record updated"
                );
                self.applied = Some(target.to_string());
                ReconcileAction::Updated {
                    from: current,
                    to: target.to_string(),
                }
            }
            Err(error) => self.fail(error),
        }
    }

    async fn current_value(&self) -> Result<Option<String>, ProviderError> {
        match (self.read_policy, &self.applied) {
            (ReadPolicy::Cached, Some(applied)) => Ok(Some(applied.clone())),
            _ => self.read_current().await,
        }
    }

    async fn read_current(&self) -> Result<Option<String>, ProviderError> {
        Ok(self
            .provider
            .get_record(&self.key)
            .await?
            .map(|record| record.value))
    }

    /// The cache is dropped so the next tick starts from a fresh read.
    fn fail(&mut self, error: ProviderError) -> ReconcileAction {
        if error.is_auth() {
            tracing::error!(
                record = %self.key,
                provider = self.provider.name(),
                error = %error,
                "DNS provider rejected credentials; updates will fail until fixed"
            );
        } else {
            tracing::error!(
                record = %self.key,
                provider = self.provider.name(),
                error = %error,
                "DNS reconciliation failed; will retry next tick"
            );
        }
        self.applied = None;
        ReconcileAction::Failed { error }
    }
}
