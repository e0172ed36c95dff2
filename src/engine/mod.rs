//! Failover orchestration.
//!
//! One tick is: probe every server concurrently, feed each outcome to that
//! server's tracker, select a target from the resulting snapshot, reconcile
//! the DNS record. Ticks run strictly one after another on a fixed interval.

mod report;

pub use report::{HealthTransition, ServerStatus, TickReport};

use crate::config::{same_address, ServerSpec};
use crate::health::{HealthState, HealthTracker, MonitoringConfig, Probe, ProbeError, ProbeOutcome};
use crate::metrics as names;
use crate::selection::{self, SelectionResult};
use crate::sync::{DnsSynchronizer, ReconcileAction};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Drives probing, selection and DNS reconciliation for one record.
pub struct FailoverEngine {
    /// Configured servers, index-aligned with `trackers`
    servers: Vec<ServerSpec>,
    trackers: Vec<HealthTracker>,
    prober: Arc<dyn Probe>,
    synchronizer: DnsSynchronizer,
    config: MonitoringConfig,
    /// Selection from the previous tick (for change logging)
    last_selection: Option<SelectionResult>,
}

impl FailoverEngine {
    pub fn new(
        servers: Vec<ServerSpec>,
        config: MonitoringConfig,
        prober: Arc<dyn Probe>,
        synchronizer: DnsSynchronizer,
    ) -> Self {
        let trackers = servers
            .iter()
            .map(|_| HealthTracker::from_config(&config))
            .collect();

        Self {
            servers,
            trackers,
            prober,
            synchronizer,
            config,
            last_selection: None,
        }
    }

    pub fn servers(&self) -> &[ServerSpec] {
        &self.servers
    }

    pub fn synchronizer(&self) -> &DnsSynchronizer {
        &self.synchronizer
    }

    /// Health tracker of the named server.
    pub fn tracker(&self, name: &str) -> Option<&HealthTracker> {
        self.servers
            .iter()
            .position(|s| s.name == name)
            .map(|i| &self.trackers[i])
    }

    /// Read the live record before the first tick and report which server it
    /// points at. Failures are logged; the first tick retries anyway.
    pub async fn prime(&mut self) {
        let key = self.synchronizer.key().clone();
        match self.synchronizer.prime().await {
            Ok(Some(value)) => match self
                .servers
                .iter()
                .find(|s| same_address(&s.address, &value))
            {
                Some(server) => {
                    tracing::info!(record = %key, server = %server.name, value = %value, "Current DNS target")
                }
                None => tracing::warn!(
                    record = %key,
                    value = %value,
                    "DNS record points at an address outside the configured pool"
                ),
            },
            Ok(None) => {
                tracing::warn!(record = %key, "DNS record does not exist yet; it will be created")
            }
            Err(error) => {
                tracing::warn!(record = %key, error = %error, "Could not read current DNS record")
            }
        }
    }

    /// Probe every server concurrently. Each probe is bounded by the
    /// configured timeout, so a hung server cannot hold up the others.
    pub async fn probe_all(&self) -> Vec<ProbeOutcome> {
        let timeout = self.config.timeout();
        let probes = self.servers.iter().map(|server| {
            let prober = Arc::clone(&self.prober);
            async move {
                let start = Instant::now();
                match tokio::time::timeout(timeout, prober.check(server)).await {
                    Ok(outcome) => outcome,
                    Err(_) => ProbeOutcome::failure(
                        ProbeError::Timeout(timeout.as_millis() as u64),
                        start.elapsed(),
                    ),
                }
            }
        });

        join_all(probes).await
    }

    /// Apply one outcome per server (index-aligned) and collect transitions.
    pub fn observe_all(&mut self, outcomes: &[ProbeOutcome]) -> Vec<HealthTransition> {
        let mut transitions = Vec::new();

        for ((server, tracker), outcome) in self
            .servers
            .iter()
            .zip(self.trackers.iter_mut())
            .zip(outcomes)
        {
            let before = tracker.state();
            let after = tracker.observe(outcome);

            metrics::histogram!(names::PROBE_LATENCY,
                "server" => server.name.clone()
            )
            .record(outcome.latency().as_secs_f64());
            metrics::counter!(names::PROBES_TOTAL,
                "server" => server.name.clone(),
                "result" => if outcome.is_success() { "success" } else { "failure" }
            )
            .increment(1);

            if before != after {
                tracing::info!(
                    server = %server.name,
                    address = %server.address,
                    from = %before,
                    to = %after,
                    consecutive_failures = tracker.consecutive_failures(),
                    error = ?outcome.error().map(|e| e.to_string()),
                    "Server health changed"
                );
                metrics::counter!(names::HEALTH_TRANSITIONS_TOTAL,
                    "server" => server.name.clone(),
                    "to" => after.to_string()
                )
                .increment(1);
                transitions.push(HealthTransition {
                    server: server.name.clone(),
                    from: before,
                    to: after,
                });
            } else if let Some(error) = outcome.error() {
                tracing::warn!(
                    server = %server.name,
                    address = %server.address,
                    consecutive_failures = tracker.consecutive_failures(),
                    failure_threshold = tracker.failure_threshold(),
                    error = %error,
                    "Health check failed"
                );
            }
        }

        let healthy = self.trackers.iter().filter(|t| t.is_healthy()).count();
        metrics::gauge!(names::SERVERS_HEALTHY).set(healthy as f64);

        transitions
    }

    /// Select from the current health snapshot.
    pub fn select(&self) -> SelectionResult {
        let snapshot: Vec<(&ServerSpec, HealthState)> = self
            .servers
            .iter()
            .zip(&self.trackers)
            .map(|(server, tracker)| (server, tracker.state()))
            .collect();

        selection::select(&snapshot)
    }

    /// Run one full tick.
    pub async fn tick(&mut self) -> TickReport {
        let outcomes = self.probe_all().await;
        self.complete_tick(outcomes).await
    }

    /// Everything after probing: observe, select, reconcile.
    async fn complete_tick(&mut self, outcomes: Vec<ProbeOutcome>) -> TickReport {
        let transitions = self.observe_all(&outcomes);
        let selection = self.select();

        let changed = self
            .last_selection
            .as_ref()
            .map(|last| last.chosen_name() != selection.chosen_name())
            .unwrap_or(true);
        if changed {
            tracing::info!(
                server = ?selection.chosen_name(),
                reason = %selection.reason,
                "Selection changed"
            );
        }

        let action = self.synchronizer.reconcile(&selection).await;
        match &action {
            ReconcileAction::NoChange { .. } => {
                metrics::counter!(names::DNS_UPDATES_TOTAL, "result" => "unchanged").increment(1)
            }
            ReconcileAction::Updated { .. } => {
                metrics::counter!(names::DNS_UPDATES_TOTAL, "result" => "updated").increment(1)
            }
            ReconcileAction::Failed { error } => metrics::counter!(
                names::DNS_UPDATES_TOTAL,
                "result" => "failed",
                "error" => error.kind()
            )
            .increment(1),
        }

        self.last_selection = Some(selection.clone());

        TickReport {
            outcomes: self
                .servers
                .iter()
                .map(|s| s.name.clone())
                .zip(outcomes)
                .collect(),
            transitions,
            selection,
            action,
        }
    }

    /// Point-in-time view of every server, in configuration order.
    pub fn snapshot(&self) -> Vec<ServerStatus> {
        let active = self.synchronizer.applied();
        self.servers
            .iter()
            .zip(&self.trackers)
            .map(|(server, tracker)| ServerStatus::new(server, tracker, active))
            .collect()
    }

    /// Log a one-line summary per server.
    pub fn log_status(&self) {
        let current = self.synchronizer.applied().unwrap_or("unknown");
        tracing::info!(record = %self.synchronizer.key(), value = %current, "Failover status");
        for status in self.snapshot() {
            tracing::info!(
                server = %status.name,
                address = %status.address,
                priority = status.priority,
                state = %status.state,
                active = status.active,
                consecutive_failures = status.consecutive_failures,
                latency_ms = ?status.last_latency_ms,
                "Server status"
            );
        }
    }

    /// Start the failover loop as a background task.
    /// Returns a JoinHandle that resolves when the loop stops.
    pub fn start(mut self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel_token.cancelled() => return,
                _ = self.prime() => {}
            }

            let mut interval = tokio::time::interval(self.config.check_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut status_interval = status_interval(self.config.status_interval_seconds);

            tracing::info!(
                interval_seconds = self.config.check_interval_seconds,
                servers = self.servers.len(),
                method = %self.config.check_method,
                "Failover monitor started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Failover monitor shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let outcomes = tokio::select! {
                            _ = cancel_token.cancelled() => {
                                tracing::info!("Failover monitor shutting down; abandoning in-flight probes");
                                break;
                            }
                            outcomes = self.probe_all() => outcomes,
                        };
                        let report = self.complete_tick(outcomes).await;
                        tracing::debug!(
                            servers_checked = report.outcomes.len(),
                            healthy = report.healthy_count(),
                            action = %report.action,
                            "Failover tick completed"
                        );
                    }
                    _ = next_status(&mut status_interval) => {
                        self.log_status();
                    }
                }
            }
        })
    }
}

fn status_interval(seconds: u64) -> Option<tokio::time::Interval> {
    if seconds == 0 {
        return None;
    }
    let period = Duration::from_secs(seconds);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(interval)
}

async fn next_status(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
