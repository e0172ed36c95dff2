//! End-to-end failover scenarios over the in-memory provider.

mod common;

use common::*;
use dns_failover::config::{DnsConfig, ReadPolicy, RecordType, ServerSpec};
use dns_failover::engine::FailoverEngine;
use dns_failover::health::HealthState;
use dns_failover::provider::{InMemoryProvider, ProviderError, RecordKey};
use dns_failover::selection::SelectionReason;
use dns_failover::sync::{DnsSynchronizer, NoChangeReason, ReconcileAction};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_record_moves_to_higher_priority_server() {
    let provider =
        Arc::new(InMemoryProvider::new().with_record(&record_key(), SECONDARY_ADDR, 300));
    let (mut engine, probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("primary", true);
    probe.set("secondary", true);

    let report = engine.tick().await;
    assert_eq!(
        report.action,
        ReconcileAction::Updated {
            from: Some(SECONDARY_ADDR.to_string()),
            to: PRIMARY_ADDR.to_string()
        }
    );
    assert_eq!(provider.writes(), 1);
}

#[tokio::test]
async fn test_failover_and_failback() {
    let provider = Arc::new(InMemoryProvider::new().with_record(&record_key(), PRIMARY_ADDR, 300));
    let (mut engine, probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("primary", true);
    probe.set("secondary", true);

    let report = engine.tick().await;
    assert_eq!(report.selection.chosen_name(), Some("primary"));
    assert_eq!(
        report.action,
        ReconcileAction::NoChange {
            reason: NoChangeReason::AlreadyCurrent
        }
    );
    assert_eq!(provider.writes(), 0);

    // Two failures stay below the threshold
    probe.set("primary", false);
    for _ in 0..2 {
        let report = engine.tick().await;
        assert_eq!(report.selection.chosen_name(), Some("primary"));
    }
    assert_eq!(provider.value(&record_key()).as_deref(), Some(PRIMARY_ADDR));

    // Third failure trips it
    let report = engine.tick().await;
    assert_eq!(report.transitions.len(), 1);
    assert_eq!(report.transitions[0].to, HealthState::Unhealthy);
    assert_eq!(report.selection.chosen_name(), Some("secondary"));
    assert_eq!(
        report.action,
        ReconcileAction::Updated {
            from: Some(PRIMARY_ADDR.to_string()),
            to: SECONDARY_ADDR.to_string()
        }
    );
    assert_eq!(provider.value(&record_key()).as_deref(), Some(SECONDARY_ADDR));

    // One success brings the primary back
    probe.set("primary", true);
    let report = engine.tick().await;
    assert_eq!(report.selection.chosen_name(), Some("primary"));
    assert_eq!(provider.value(&record_key()).as_deref(), Some(PRIMARY_ADDR));
    assert_eq!(provider.writes(), 2);
}

#[tokio::test]
async fn test_recovery_threshold_delays_failback() {
    let provider = Arc::new(InMemoryProvider::new());
    let (mut engine, probe) =
        build_engine(two_servers(), monitoring(1, 3), DnsConfig::default(), provider.clone());
    probe.set("secondary", true);

    for _ in 0..3 {
        engine.tick().await;
    }
    assert_eq!(provider.value(&record_key()).as_deref(), Some(SECONDARY_ADDR));

    probe.set("primary", true);
    for _ in 0..2 {
        let report = engine.tick().await;
        assert_eq!(report.selection.chosen_name(), Some("secondary"));
    }
    let report = engine.tick().await;
    assert_eq!(report.selection.chosen_name(), Some("primary"));
    assert_eq!(provider.value(&record_key()).as_deref(), Some(PRIMARY_ADDR));
}

#[tokio::test]
async fn test_all_unhealthy_leaves_record_untouched() {
    let provider = Arc::new(InMemoryProvider::new().with_record(&record_key(), SECONDARY_ADDR, 300));
    let (mut engine, _probe) =
        build_engine(two_servers(), monitoring(1, 1), DnsConfig::default(), provider.clone());

    let reads_before = provider.reads();
    let report = engine.tick().await;

    assert_eq!(report.selection.reason, SelectionReason::AllUnhealthy);
    assert_eq!(
        report.action,
        ReconcileAction::NoChange {
            reason: NoChangeReason::NoTarget
        }
    );
    assert_eq!(provider.reads(), reads_before);
    assert_eq!(provider.writes(), 0);
    assert_eq!(provider.value(&record_key()).as_deref(), Some(SECONDARY_ADDR));
}

#[tokio::test]
async fn test_no_writes_until_a_server_recovers() {
    let mut servers = two_servers();
    servers.push(ServerSpec::new("tertiary", "192.0.2.3", 443, 3));
    let provider = Arc::new(InMemoryProvider::new().with_record(&record_key(), PRIMARY_ADDR, 300));
    let (mut engine, probe) =
        build_engine(servers, monitoring(3, 1), DnsConfig::default(), provider.clone());

    for _ in 0..5 {
        let report = engine.tick().await;
        assert!(report.selection.chosen.is_none());
    }
    assert_eq!(provider.writes(), 0);

    probe.set("tertiary", true);
    let report = engine.tick().await;
    assert_eq!(report.selection.chosen_name(), Some("tertiary"));
    assert_eq!(provider.writes(), 1);
    assert_eq!(provider.value(&record_key()).as_deref(), Some("192.0.2.3"));
}

#[tokio::test]
async fn test_equal_priority_breaks_tie_by_name() {
    let servers = vec![
        ServerSpec::new("bravo", SECONDARY_ADDR, 443, 1),
        ServerSpec::new("alpha", PRIMARY_ADDR, 443, 1),
    ];
    let provider = Arc::new(InMemoryProvider::new());
    let (mut engine, probe) =
        build_engine(servers, monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("alpha", true);
    probe.set("bravo", true);

    for _ in 0..3 {
        let report = engine.tick().await;
        assert_eq!(report.selection.chosen_name(), Some("alpha"));
        assert_eq!(report.selection.reason, SelectionReason::NameTieBreak);
    }
    assert_eq!(provider.writes(), 1);
}

#[tokio::test]
async fn test_steady_state_writes_once() {
    let provider = Arc::new(InMemoryProvider::new());
    let (mut engine, probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("primary", true);
    probe.set("secondary", true);

    let first = engine.tick().await;
    assert_eq!(
        first.action,
        ReconcileAction::Updated {
            from: None,
            to: PRIMARY_ADDR.to_string()
        }
    );
    for _ in 0..5 {
        assert!(!engine.tick().await.action.is_update());
    }
    assert_eq!(provider.writes(), 1);
}

#[tokio::test]
async fn test_failed_write_is_retried_next_tick() {
    let provider = Arc::new(InMemoryProvider::new());
    let (mut engine, probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("primary", true);

    provider.fail_writes(Some(ProviderError::Write("HTTP 502".to_string())));
    assert!(engine.tick().await.action.is_failure());
    assert_eq!(provider.value(&record_key()), None);

    provider.fail_writes(None);
    assert!(engine.tick().await.action.is_update());
    assert_eq!(provider.value(&record_key()).as_deref(), Some(PRIMARY_ADDR));
}

#[tokio::test]
async fn test_auth_failure_keeps_monitoring() {
    let provider = Arc::new(InMemoryProvider::new());
    let (mut engine, probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("primary", true);
    provider.fail_writes(Some(ProviderError::Auth {
        status: 403,
        message: "[9109] Invalid access token".to_string(),
    }));

    for _ in 0..3 {
        match engine.tick().await.action {
            ReconcileAction::Failed { error } => assert!(error.is_auth()),
            other => panic!("expected auth failure, got {:?}", other),
        }
    }
    assert_eq!(provider.writes(), 3);
    assert_eq!(probe.calls(), 6);
}

#[tokio::test]
async fn test_out_of_band_change_is_corrected() {
    let provider = Arc::new(InMemoryProvider::new());
    let (mut engine, probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("primary", true);

    engine.tick().await;
    provider.set_record(&record_key(), "203.0.113.99", 300);

    let report = engine.tick().await;
    assert_eq!(
        report.action,
        ReconcileAction::Updated {
            from: Some("203.0.113.99".to_string()),
            to: PRIMARY_ADDR.to_string()
        }
    );
}

#[tokio::test]
async fn test_cached_policy_reads_once() {
    let provider = Arc::new(InMemoryProvider::new());
    let dns = DnsConfig {
        read_policy: ReadPolicy::Cached,
        ..Default::default()
    };
    let (mut engine, probe) = build_engine(two_servers(), monitoring(3, 1), dns, provider.clone());
    probe.set("primary", true);

    for _ in 0..4 {
        engine.tick().await;
    }
    assert_eq!(provider.reads(), 1);
    assert_eq!(provider.writes(), 1);
}

#[tokio::test]
async fn test_start_runs_until_cancelled() {
    let provider = Arc::new(InMemoryProvider::new());
    let (engine, probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());
    probe.set("secondary", true);

    let cancel_token = CancellationToken::new();
    let handle = engine.start(cancel_token.clone());

    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel_token.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop should stop after cancel")
        .unwrap();

    assert_eq!(provider.value(&record_key()).as_deref(), Some(SECONDARY_ADDR));
}

#[tokio::test]
async fn test_cancel_abandons_hung_probes() {
    let provider = Arc::new(InMemoryProvider::new());
    let mut config = monitoring(3, 1);
    config.check_interval_seconds = 30;
    config.timeout_seconds = 10;
    let (engine, probe) = build_engine(two_servers(), config, DnsConfig::default(), provider.clone());
    probe.hang("primary");
    probe.set("secondary", true);

    let cancel_token = CancellationToken::new();
    let handle = engine.start(cancel_token.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel_token.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("hung probe should not block shutdown")
        .unwrap();

    assert_eq!(provider.writes(), 0);
}

#[tokio::test]
async fn test_prime_reports_live_record() {
    let provider = Arc::new(InMemoryProvider::new().with_record(&record_key(), SECONDARY_ADDR, 300));
    let (mut engine, _probe) =
        build_engine(two_servers(), monitoring(3, 1), DnsConfig::default(), provider.clone());

    engine.prime().await;
    assert_eq!(engine.synchronizer().applied(), Some(SECONDARY_ADDR));

    let snapshot = engine.snapshot();
    assert!(!snapshot[0].active);
    assert!(snapshot[1].active);
}

#[tokio::test]
async fn test_ipv6_record_in_canonical_form_is_current() {
    let key = RecordKey::new(ZONE, DOMAIN, RecordType::AAAA);
    let provider = Arc::new(InMemoryProvider::new().with_record(&key, "2001:db8::1", 300));
    let dns = DnsConfig {
        record_type: RecordType::AAAA,
        ..Default::default()
    };
    let servers = vec![
        ServerSpec::new("primary", "2001:DB8:0:0::1", 443, 1),
        ServerSpec::new("secondary", "2001:DB8:0:0::2", 443, 2),
    ];
    let probe = ScriptedProbe::new();
    let synchronizer = DnsSynchronizer::new(provider.clone(), key, &dns);
    let mut engine = FailoverEngine::new(servers, monitoring(3, 1), probe.clone(), synchronizer);
    probe.set("primary", true);
    probe.set("secondary", true);

    engine.prime().await;
    assert!(engine.snapshot()[0].active);

    for _ in 0..5 {
        let report = engine.tick().await;
        assert_eq!(
            report.action,
            ReconcileAction::NoChange {
                reason: NoChangeReason::AlreadyCurrent
            }
        );
    }
    assert_eq!(provider.writes(), 0);
}
