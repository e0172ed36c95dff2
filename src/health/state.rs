//! Per-server health state tracking.

use super::config::MonitoringConfig;
use super::error::ProbeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Binary health classification of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Eligible for selection
    Healthy,
    /// Not eligible (failed checks, or never checked)
    Unhealthy,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Healthy => write!(f, "healthy"),
            HealthState::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Server answered within the timeout
    Success { latency: Duration },
    /// Server did not answer acceptably
    Failure {
        error: ProbeError,
        latency: Duration,
    },
}

impl ProbeOutcome {
    pub fn success(latency: Duration) -> Self {
        ProbeOutcome::Success { latency }
    }

    pub fn failure(error: ProbeError, latency: Duration) -> Self {
        ProbeOutcome::Failure { error, latency }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn latency(&self) -> Duration {
        match self {
            ProbeOutcome::Success { latency } | ProbeOutcome::Failure { latency, .. } => *latency,
        }
    }

    pub fn error(&self) -> Option<&ProbeError> {
        match self {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Tracks health for a single server.
///
/// Starts `Unhealthy` with both counters at zero. The state only changes
/// when a counter crosses its threshold: `failure_threshold` consecutive
/// failures take a healthy server down, `recovery_threshold` consecutive
/// successes bring an unhealthy one back.
#[derive(Debug, Clone)]
pub struct HealthTracker {
    state: HealthState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_check: Option<DateTime<Utc>>,
    last_latency: Option<Duration>,
    last_error: Option<ProbeError>,
    failure_threshold: u32,
    recovery_threshold: u32,
}

impl HealthTracker {
    /// Thresholds below 1 are treated as 1.
    pub fn new(failure_threshold: u32, recovery_threshold: u32) -> Self {
        Self {
            state: HealthState::Unhealthy,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_check: None,
            last_latency: None,
            last_error: None,
            failure_threshold: failure_threshold.max(1),
            recovery_threshold: recovery_threshold.max(1),
        }
    }

    pub fn from_config(config: &MonitoringConfig) -> Self {
        Self::new(config.failure_threshold, config.recovery_threshold)
    }

    /// Apply a probe outcome and return the resulting state.
    pub fn observe(&mut self, outcome: &ProbeOutcome) -> HealthState {
        self.last_check = Some(Utc::now());
        self.last_latency = Some(outcome.latency());

        match outcome {
            ProbeOutcome::Success { .. } => {
                self.consecutive_failures = 0;
                self.consecutive_successes = self.consecutive_successes.saturating_add(1);
                self.last_error = None;

                if self.state == HealthState::Unhealthy
                    && self.consecutive_successes >= self.recovery_threshold
                {
                    self.state = HealthState::Healthy;
                }
            }
            ProbeOutcome::Failure { error, .. } => {
                self.consecutive_successes = 0;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_error = Some(error.clone());

                if self.state == HealthState::Healthy
                    && self.consecutive_failures >= self.failure_threshold
                {
                    self.state = HealthState::Unhealthy;
                }
            }
        }

        self.state
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    /// When the last probe outcome was applied
    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    pub fn last_latency(&self) -> Option<Duration> {
        self.last_latency
    }

    pub fn last_error(&self) -> Option<&ProbeError> {
        self.last_error.as_ref()
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn recovery_threshold(&self) -> u32 {
        self.recovery_threshold
    }
}
