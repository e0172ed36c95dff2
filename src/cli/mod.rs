//! CLI module for dns-failover
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `run` - Start the failover monitor
//! - `check` - Run a single probe/select/reconcile cycle
//! - `status` - Show server health and the live record without writing
//! - `verify` - Check what public resolvers return for the record
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start monitoring with the default config
//! dns-failover run
//!
//! # One cycle without touching DNS
//! dns-failover check --dry-run
//!
//! # Wait up to five minutes for resolvers to pick up the change
//! dns-failover verify --wait 300
//! ```

pub mod check;
pub mod completions;
pub mod config;
pub mod output;
pub mod run;
pub mod status;
pub mod verify;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "dns-failover.toml";

/// dns-failover - Health-checked DNS failover
#[derive(Parser, Debug)]
#[command(
    name = "dns-failover",
    version,
    about = "Keeps a DNS record pointed at the best healthy server"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the failover monitor
    Run(RunArgs),
    /// Run one probe, select and reconcile cycle, then exit
    Check(CheckArgs),
    /// Show server health and the live DNS record (no writes)
    Status(StatusArgs),
    /// Check DNS propagation across public resolvers
    Verify(VerifyArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DNS_FAILOVER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log intended DNS updates instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log intended DNS updates instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Address resolvers should return (defaults to the live record value)
    #[arg(short, long)]
    pub expect: Option<String>,

    /// Keep polling for up to this many seconds until propagated
    #[arg(short, long, value_name = "SECONDS")]
    pub wait: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
