//! # Metrics
//!
//! Prometheus export of failover activity. When `[metrics] enabled = true`
//! the exporter serves the text format on `listen`.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `dns_failover_probes_total{server, result}` - Health probes by outcome
//! - `dns_failover_health_transitions_total{server, to}` - Health state changes
//! - `dns_failover_dns_updates_total{result}` - Reconciliations by result
//!
//! **Histograms:**
//! - `dns_failover_probe_latency_seconds{server}` - Probe latency
//!
//! **Gauges:**
//! - `dns_failover_servers_healthy` - Servers currently healthy

use crate::config::MetricsConfig;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;

pub const PROBE_LATENCY: &str = "dns_failover_probe_latency_seconds";
pub const PROBES_TOTAL: &str = "dns_failover_probes_total";
pub const HEALTH_TRANSITIONS_TOTAL: &str = "dns_failover_health_transitions_total";
pub const DNS_UPDATES_TOTAL: &str = "dns_failover_dns_updates_total";
pub const SERVERS_HEALTHY: &str = "dns_failover_servers_healthy";

/// Probe latency buckets in seconds.
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Register help text for every metric the engine emits.
pub fn describe_metrics() {
    metrics::describe_histogram!(
        PROBE_LATENCY,
        metrics::Unit::Seconds,
        "Health probe latency per server"
    );
    metrics::describe_counter!(PROBES_TOTAL, "Health probes by server and result");
    metrics::describe_counter!(
        HEALTH_TRANSITIONS_TOTAL,
        "Server health state transitions"
    );
    metrics::describe_counter!(DNS_UPDATES_TOTAL, "DNS reconciliations by result");
    metrics::describe_gauge!(SERVERS_HEALTHY, "Servers currently considered healthy");
}

/// Install the Prometheus exporter if enabled.
///
/// Must be called from within a Tokio runtime; the HTTP listener is spawned
/// onto it.
pub fn setup_metrics(config: &MetricsConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.enabled {
        tracing::debug!("Metrics exporter disabled");
        return Ok(());
    }

    let addr: SocketAddr = config
        .listen
        .parse()
        .map_err(|e| format!("invalid metrics listen address '{}': {}", config.listen, e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(PROBE_LATENCY.to_string()), LATENCY_BUCKETS)?
        .install()?;

    describe_metrics();
    tracing::info!(addr = %addr, "Prometheus metrics listening");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_noop() {
        setup_metrics(&MetricsConfig::default()).unwrap();
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = MetricsConfig {
            enabled: true,
            listen: "not-an-address".to_string(),
        };
        let err = setup_metrics(&config).unwrap_err();
        assert!(err.to_string().contains("invalid metrics listen address"));
    }

    #[test]
    fn test_described_metrics_render() {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(PROBE_LATENCY.to_string()), LATENCY_BUCKETS)
            .unwrap()
            .build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_metrics();
            metrics::counter!(PROBES_TOTAL, "server" => "primary", "result" => "success")
                .increment(2);
            metrics::gauge!(SERVERS_HEALTHY).set(1.0);
        });

        let output = handle.render();
        assert!(output.contains("# HELP dns_failover_probes_total"));
        let line = output
            .lines()
            .find(|l| l.starts_with("dns_failover_probes_total{"))
            .unwrap();
        assert!(line.contains("server=\"primary\""));
        assert!(line.ends_with(" 2"));
        assert!(output.contains("dns_failover_servers_healthy 1"));
    }
}
