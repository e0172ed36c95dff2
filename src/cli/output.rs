//! Output formatting helpers for CLI commands

use crate::engine::ServerStatus;
use crate::health::HealthState;
use crate::selection::SelectionResult;
use crate::verify::PropagationReport;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// Format server health as a table
pub fn format_servers_table(servers: &[ServerStatus]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "", "Name", "Address", "Port", "Priority", "Health", "Failures", "Latency", "Last Error",
    ]);

    for s in servers {
        let health = match s.state {
            HealthState::Healthy => "Healthy".green().to_string(),
            HealthState::Unhealthy => "Unhealthy".red().to_string(),
        };
        let latency = s
            .last_latency_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(if s.active { "▶" } else { "" }),
            Cell::new(&s.name),
            Cell::new(&s.address),
            Cell::new(s.port),
            Cell::new(s.priority),
            Cell::new(health),
            Cell::new(s.consecutive_failures),
            Cell::new(latency),
            Cell::new(s.last_error.as_deref().unwrap_or("")),
        ]);
    }

    table.to_string()
}

/// One-line description of a selection
pub fn format_selection(selection: &SelectionResult) -> String {
    match &selection.chosen {
        Some(server) => format!(
            "{} {} ({})",
            "Selected:".bold(),
            server,
            selection.reason
        ),
        None => format!(
            "{} {} ({})",
            "Selected:".bold(),
            "none".yellow(),
            selection.reason
        ),
    }
}

/// Format a propagation round as a table plus a verdict line
pub fn format_propagation_table(report: &PropagationReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Resolver", "Answer", "Match"]);

    for answer in &report.answers {
        let (value, matched) = match &answer.error {
            Some(error) => (error.red().to_string(), "-".to_string()),
            None if answer.addresses.is_empty() => (
                "(no record)".dimmed().to_string(),
                status_icon(false).to_string(),
            ),
            None => (
                answer.addresses.join(", "),
                status_icon(answer.contains(&report.expected)).to_string(),
            ),
        };
        table.add_row(vec![
            Cell::new(&answer.resolver),
            Cell::new(value),
            Cell::new(matched),
        ]);
    }

    let verdict = if report.propagated {
        "propagated".green().to_string()
    } else {
        "not propagated".yellow().to_string()
    };

    format!(
        "{}\nExpected {}: {} ({}/{} answering resolvers agree)",
        table, report.expected, verdict, report.matching, report.answering
    )
}

/// Format server health plus selection as JSON
pub fn format_status_json(
    record: &str,
    live_value: Option<&str>,
    servers: &[ServerStatus],
    selection: &SelectionResult,
    action: Option<String>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "record": record,
        "value": live_value,
        "servers": servers,
        "selection": selection,
        "action": action,
    }))
}

/// Format a propagation round as JSON
pub fn format_propagation_json(report: &PropagationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Icon for a yes/no check
pub fn status_icon(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}
