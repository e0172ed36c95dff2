//! Check command: one full cycle, then exit

use crate::cli::output::{format_selection, format_servers_table, format_status_json};
use crate::cli::run::{build_engine, build_provider, init_cli_tracing, load_config};
use crate::cli::CheckArgs;
use crate::sync::ReconcileAction;
use colored::Colorize;

/// Handle `dns-failover check` command
///
/// Probes every server once, selects, reconciles the record and prints the
/// result. Fails when the DNS update failed.
pub async fn handle_check(args: &CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    config.validate()?;
    init_cli_tracing();

    let provider = build_provider(&config, args.dry_run)?;
    let mut engine = build_engine(&config, provider)?;

    engine.prime().await;
    let report = engine.tick().await;

    let servers = engine.snapshot();
    let record = engine.synchronizer().key().to_string();
    let value = engine.synchronizer().applied();

    if args.json {
        println!(
            "{}",
            format_status_json(
                &record,
                value,
                &servers,
                &report.selection,
                Some(report.action.to_string())
            )?
        );
    } else {
        println!("{}", format_servers_table(&servers));
        println!("{}", format_selection(&report.selection));
        let suffix = if args.dry_run { " (dry run)" } else { "" };
        println!("{} {} {}{}", "DNS:".bold(), record, report.action, suffix);
    }

    match report.action {
        ReconcileAction::Failed { error } => {
            Err(format!("DNS update failed: {}", error).into())
        }
        _ => Ok(()),
    }
}
