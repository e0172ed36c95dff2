//! Per-tick reports and status views.

use crate::config::{same_address, ServerSpec};
use crate::health::{HealthState, HealthTracker, ProbeOutcome};
use crate::selection::SelectionResult;
use crate::sync::ReconcileAction;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A health state change observed during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthTransition {
    pub server: String,
    pub from: HealthState,
    pub to: HealthState,
}

/// Everything one tick observed and did.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Probe outcome per server name, in configuration order
    pub outcomes: Vec<(String, ProbeOutcome)>,
    pub transitions: Vec<HealthTransition>,
    pub selection: SelectionResult,
    pub action: ReconcileAction,
}

impl TickReport {
    pub fn healthy_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn outcome(&self, server: &str) -> Option<&ProbeOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == server)
            .map(|(_, outcome)| outcome)
    }
}

/// View model for one server's health, used by the CLI and status logs.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub priority: u32,
    pub state: HealthState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub last_check: Option<DateTime<Utc>>,
    pub last_latency_ms: Option<u64>,
    pub last_error: Option<String>,
    /// Whether the DNS record currently points at this server
    pub active: bool,
}

impl ServerStatus {
    pub fn new(server: &ServerSpec, tracker: &HealthTracker, active_value: Option<&str>) -> Self {
        Self {
            name: server.name.clone(),
            address: server.address.clone(),
            port: server.port,
            priority: server.priority,
            state: tracker.state(),
            consecutive_failures: tracker.consecutive_failures(),
            consecutive_successes: tracker.consecutive_successes(),
            last_check: tracker.last_check(),
            last_latency_ms: tracker.last_latency().map(|d| d.as_millis() as u64),
            last_error: tracker.last_error().map(|e| e.to_string()),
            active: active_value.is_some_and(|value| same_address(value, &server.address)),
        }
    }
}
