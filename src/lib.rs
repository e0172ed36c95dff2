//! dns-failover - Health-checked DNS failover
//!
//! This library probes a pool of servers, tracks their health with
//! consecutive-result thresholds, selects the best healthy server by
//! priority, and keeps a single DNS record pointed at it.

pub mod cli;
pub mod config;
pub mod engine;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod selection;
pub mod sync;
pub mod verify;
