//! Target selection among healthy servers
//!
//! Picks the single server the DNS record should point at: the healthy
//! server with the lowest priority number, ties broken by name. Selection is
//! a pure function of health and static configuration, so it is stable
//! across ticks and independent of input order.

use crate::config::ServerSpec;
use crate::health::HealthState;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Why the selector produced its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// The chosen server is the only healthy one with the best priority
    HighestPriority,
    /// Several healthy servers share the best priority; lowest name won
    NameTieBreak,
    /// No server is healthy; the DNS record must be left alone
    AllUnhealthy,
    /// No servers were offered
    NoServers,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionReason::HighestPriority => write!(f, "highest priority healthy server"),
            SelectionReason::NameTieBreak => write!(f, "priority tie broken by name"),
            SelectionReason::AllUnhealthy => write!(f, "all unhealthy"),
            SelectionReason::NoServers => write!(f, "no servers configured"),
        }
    }
}

/// Outcome of one selection pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    pub chosen: Option<ServerSpec>,
    pub reason: SelectionReason,
}

impl SelectionResult {
    pub fn none(reason: SelectionReason) -> Self {
        Self {
            chosen: None,
            reason,
        }
    }

    /// Name of the chosen server, if any
    pub fn chosen_name(&self) -> Option<&str> {
        self.chosen.as_ref().map(|s| s.name.as_str())
    }

    /// Address the record should hold, if any
    pub fn target_address(&self) -> Option<&str> {
        self.chosen.as_ref().map(|s| s.address.as_str())
    }
}

fn preference(a: &ServerSpec, b: &ServerSpec) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.name.cmp(&b.name))
}

/// Select the active target from a snapshot of server health.
pub fn select(candidates: &[(&ServerSpec, HealthState)]) -> SelectionResult {
    if candidates.is_empty() {
        return SelectionResult::none(SelectionReason::NoServers);
    }

    let healthy: Vec<&ServerSpec> = candidates
        .iter()
        .filter(|(_, state)| *state == HealthState::Healthy)
        .map(|(spec, _)| *spec)
        .collect();

    let Some(best) = healthy.iter().copied().min_by(|a, b| preference(a, b)) else {
        return SelectionResult::none(SelectionReason::AllUnhealthy);
    };

    let tied = healthy
        .iter()
        .filter(|s| s.priority == best.priority)
        .count();

    SelectionResult {
        chosen: Some(best.clone()),
        reason: if tied > 1 {
            SelectionReason::NameTieBreak
        } else {
            SelectionReason::HighestPriority
        },
    }
}
