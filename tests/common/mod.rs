//! Shared test utilities for dns-failover integration tests.
//!
//! Provides a scriptable probe, server and config builders, and engine
//! wiring over the in-memory provider.

#![allow(dead_code)]

use async_trait::async_trait;
use dns_failover::config::{DnsConfig, RecordType, ServerSpec};
use dns_failover::engine::FailoverEngine;
use dns_failover::health::{MonitoringConfig, Probe, ProbeError, ProbeOutcome};
use dns_failover::provider::{InMemoryProvider, RecordKey};
use dns_failover::sync::DnsSynchronizer;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Well-Known Test Constants
// =============================================================================

pub const ZONE: &str = "zone-1";
pub const DOMAIN: &str = "app.example.com";
pub const PRIMARY_ADDR: &str = "192.0.2.1";
pub const SECONDARY_ADDR: &str = "192.0.2.2";

pub fn record_key() -> RecordKey {
    RecordKey::new(ZONE, DOMAIN, RecordType::A)
}

// =============================================================================
// Scripted Probe
// =============================================================================

/// Probe whose answers are set by the test. Unknown servers fail;
/// servers marked as hanging never answer.
#[derive(Default)]
pub struct ScriptedProbe {
    healthy: Mutex<HashMap<String, bool>>,
    hanging: Mutex<HashSet<String>>,
    calls: AtomicU64,
}

impl ScriptedProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, server: &str, healthy: bool) {
        self.healthy
            .lock()
            .unwrap()
            .insert(server.to_string(), healthy);
    }

    pub fn hang(&self, server: &str) {
        self.hanging.lock().unwrap().insert(server.to_string());
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn check(&self, server: &ServerSpec) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let hangs = self.hanging.lock().unwrap().contains(&server.name);
        if hangs {
            std::future::pending::<()>().await;
        }

        let healthy = self
            .healthy
            .lock()
            .unwrap()
            .get(&server.name)
            .copied()
            .unwrap_or(false);

        if healthy {
            ProbeOutcome::success(Duration::from_millis(5))
        } else {
            ProbeOutcome::failure(
                ProbeError::ConnectionFailed("connection refused".to_string()),
                Duration::from_millis(5),
            )
        }
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn two_servers() -> Vec<ServerSpec> {
    vec![
        ServerSpec::new("primary", PRIMARY_ADDR, 443, 1),
        ServerSpec::new("secondary", SECONDARY_ADDR, 443, 2),
    ]
}

pub fn monitoring(failure_threshold: u32, recovery_threshold: u32) -> MonitoringConfig {
    MonitoringConfig {
        check_interval_seconds: 1,
        timeout_seconds: 1,
        failure_threshold,
        recovery_threshold,
        status_interval_seconds: 0,
        ..Default::default()
    }
}

/// Engine over an in-memory provider, returning handles to both fakes.
pub fn build_engine(
    servers: Vec<ServerSpec>,
    config: MonitoringConfig,
    dns: DnsConfig,
    provider: Arc<InMemoryProvider>,
) -> (FailoverEngine, Arc<ScriptedProbe>) {
    let probe = ScriptedProbe::new();
    let synchronizer = DnsSynchronizer::new(provider, record_key(), &dns);
    let engine = FailoverEngine::new(servers, config, probe.clone(), synchronizer);
    (engine, probe)
}
