//! Health checking for the server pool.
//!
//! A [`Probe`] performs one reachability check against one server and reports
//! a [`ProbeOutcome`]. A [`HealthTracker`] per server folds those outcomes into
//! a debounced [`HealthState`] using consecutive-failure/success thresholds.
//! Probes never retry; the next tick is the retry.

mod config;
mod error;
mod state;


pub use config::*;
pub use error::*;
pub use state::*;

use crate::config::ServerSpec;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// A single reachability check against one server.
///
/// Implementations must bound their own duration and report every failure
/// as a [`ProbeOutcome::Failure`] rather than an error or panic.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn check(&self, server: &ServerSpec) -> ProbeOutcome;
}

/// Probe over the network using TCP connect or HTTP GET.
pub struct NetworkProber {
    /// HTTP client (redirects disabled, so 3xx is observed as-is)
    client: reqwest::Client,
    method: CheckMethod,
    http_check_path: String,
    timeout: Duration,
}

impl NetworkProber {
    /// Create a prober with its own HTTP client.
    pub fn new(config: &MonitoringConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self::with_client(config, client))
    }

    /// Create a prober with a custom HTTP client (for testing).
    pub fn with_client(config: &MonitoringConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            method: config.check_method,
            http_check_path: config.http_check_path.clone(),
            timeout: config.timeout(),
        }
    }

    async fn check_tcp(&self, server: &ServerSpec) -> ProbeOutcome {
        let start = Instant::now();

        let attempt = async {
            let addrs: Vec<_> = tokio::net::lookup_host((server.address.as_str(), server.port))
                .await
                .map_err(|e| ProbeError::DnsError(e.to_string()))?
                .collect();

            if addrs.is_empty() {
                return Err(ProbeError::DnsError(format!(
                    "no addresses found for {}",
                    server.address
                )));
            }

            TcpStream::connect(&addrs[..])
                .await
                .map_err(|e| ProbeError::ConnectionFailed(e.to_string()))?;
            Ok(())
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(())) => ProbeOutcome::success(start.elapsed()),
            Ok(Err(error)) => ProbeOutcome::failure(error, start.elapsed()),
            Err(_) => ProbeOutcome::failure(
                ProbeError::Timeout(self.timeout.as_millis() as u64),
                start.elapsed(),
            ),
        }
    }

    async fn check_http(&self, server: &ServerSpec) -> ProbeOutcome {
        let start = Instant::now();
        let url = format!(
            "http://{}:{}{}",
            server.url_host(),
            server.port,
            self.http_check_path
        );

        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if (200..400).contains(&status) {
                    ProbeOutcome::success(start.elapsed())
                } else {
                    ProbeOutcome::failure(ProbeError::UnexpectedStatus(status), start.elapsed())
                }
            }
            Err(e) => ProbeOutcome::failure(self.classify_error(e), start.elapsed()),
        }
    }

    /// Classify reqwest error into ProbeError.
    fn classify_error(&self, e: reqwest::Error) -> ProbeError {
        if e.is_timeout() {
            ProbeError::Timeout(self.timeout.as_millis() as u64)
        } else {
            // Resolution failures surface as connect errors in reqwest
            ProbeError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl Probe for NetworkProber {
    async fn check(&self, server: &ServerSpec) -> ProbeOutcome {
        let outcome = match self.method {
            CheckMethod::Tcp => self.check_tcp(server).await,
            CheckMethod::Http => self.check_http(server).await,
        };

        if let Some(error) = outcome.error() {
            tracing::debug!(
                server = %server.name,
                method = %self.method,
                error = %error,
                "Probe failed"
            );
        }

        outcome
    }
}
