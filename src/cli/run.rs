//! Run command implementation and shared wiring for the other commands

use crate::cli::RunArgs;
use crate::config::{FailoverConfig, LogFormat, LoggingConfig};
use crate::engine::FailoverEngine;
use crate::health::NetworkProber;
use crate::provider::{CloudflareProvider, DnsProvider, DryRunProvider};
use crate::sync::DnsSynchronizer;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load a configuration file and apply environment overrides.
pub fn load_config(path: &Path) -> Result<FailoverConfig, Box<dyn std::error::Error>> {
    let config = FailoverConfig::load(Some(path))?.with_env_overrides();
    Ok(config)
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &RunArgs,
) -> Result<FailoverConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Tracing for one-shot commands: warnings and errors on stderr so stdout
/// stays clean for tables and JSON. `RUST_LOG` still takes precedence.
pub fn init_cli_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Build the Cloudflare provider, optionally wrapped so writes are only logged.
pub fn build_provider(
    config: &FailoverConfig,
    dry_run: bool,
) -> Result<Arc<dyn DnsProvider>, Box<dyn std::error::Error>> {
    let cloudflare: Arc<dyn DnsProvider> = Arc::new(CloudflareProvider::new(
        &config.provider,
        config.monitoring.timeout(),
    )?);

    if dry_run {
        Ok(Arc::new(DryRunProvider::new(cloudflare)))
    } else {
        Ok(cloudflare)
    }
}

/// Wire prober, synchronizer and engine from configuration.
pub fn build_engine(
    config: &FailoverConfig,
    provider: Arc<dyn DnsProvider>,
) -> Result<FailoverEngine, Box<dyn std::error::Error>> {
    let prober = NetworkProber::new(&config.monitoring)?;
    let synchronizer = DnsSynchronizer::new(provider, config.record_key(), &config.dns);

    Ok(FailoverEngine::new(
        config.servers.clone(),
        config.monitoring.clone(),
        Arc::new(prober),
        synchronizer,
    ))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main run command handler
pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load, merge and validate configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing and metrics
    init_tracing(&config.logging)?;
    crate::metrics::setup_metrics(&config.metrics)?;

    tracing::info!(
        record = %config.record_key(),
        servers = config.servers.len(),
        dry_run = args.dry_run,
        "Starting dns-failover"
    );
    tracing::debug!(?config, "Loaded configuration");

    // 3. Build the engine
    let provider = build_provider(&config, args.dry_run)?;
    let engine = build_engine(&config, provider)?;

    // 4. Run until a signal arrives
    let cancel_token = CancellationToken::new();
    let mut handle = engine.start(cancel_token.clone());

    let stopped_early = tokio::select! {
        _ = shutdown_signal(cancel_token.clone()) => false,
        _ = &mut handle => true,
    };
    if stopped_early {
        return Err("failover monitor stopped unexpectedly".into());
    }

    tracing::info!("Waiting for failover monitor to stop");
    handle.await?;

    tracing::info!("dns-failover stopped");
    Ok(())
}
