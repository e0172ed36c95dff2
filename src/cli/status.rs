//! Status command: health and live record, no writes

use crate::cli::output::{format_selection, format_servers_table, format_status_json};
use crate::cli::run::{build_provider, init_cli_tracing, load_config};
use crate::cli::StatusArgs;
use crate::config::same_address;
use crate::engine::FailoverEngine;
use crate::health::NetworkProber;
use crate::provider::DnsProvider;
use crate::sync::DnsSynchronizer;
use colored::Colorize;
use std::sync::Arc;

/// Handle `dns-failover status` command
pub async fn handle_status(args: &StatusArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    config.validate()?;
    init_cli_tracing();

    // One probe decides health here; this is a point-in-time view.
    let mut monitoring = config.monitoring.clone();
    monitoring.failure_threshold = 1;
    monitoring.recovery_threshold = 1;

    let key = config.record_key();
    let provider = build_provider(&config, true)?;
    let prober = NetworkProber::new(&monitoring)?;
    let synchronizer = DnsSynchronizer::new(Arc::clone(&provider), key.clone(), &config.dns);
    let mut engine = FailoverEngine::new(
        config.servers.clone(),
        monitoring,
        Arc::new(prober),
        synchronizer,
    );

    let outcomes = engine.probe_all().await;
    engine.observe_all(&outcomes);
    let selection = engine.select();

    let (value, read_error) = match provider.get_record(&key).await {
        Ok(record) => (record.map(|r| r.value), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let mut servers = engine.snapshot();
    for server in &mut servers {
        server.active = value
            .as_deref()
            .is_some_and(|v| same_address(v, &server.address));
    }

    if args.json {
        return Ok(format_status_json(
            &key.to_string(),
            value.as_deref(),
            &servers,
            &selection,
            None,
        )?);
    }

    let live = match (&value, &read_error) {
        (Some(v), _) => v.clone(),
        (None, Some(e)) => format!("unknown ({})", e).red().to_string(),
        (None, None) => "(does not exist)".yellow().to_string(),
    };

    let mut output = format_servers_table(&servers);
    output.push('\n');
    output.push_str(&format!("{} {} -> {}\n", "Record:".bold(), key, live));
    output.push_str(&format_selection(&selection));

    if let Some(target) = selection.target_address() {
        let current = value.as_deref().is_some_and(|v| same_address(v, target));
        if read_error.is_none() && !current {
            output.push_str(&format!(
                "\n{} record would change to {}",
                "Pending:".yellow().bold(),
                target
            ));
        }
    }

    Ok(output)
}
