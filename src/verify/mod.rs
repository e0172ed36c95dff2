//! DNS propagation checks.
//!
//! After a record changes, caches around the internet keep serving the old
//! value until its TTL runs out. [`PropagationChecker`] asks a set of public
//! DNS-over-HTTPS resolvers (and optionally the system resolver) what they
//! currently return, and can poll until enough of them agree on an address.

mod config;

pub use config::{ResolverConfig, VerifyConfig};

use crate::config::{same_address, RecordType};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const SYSTEM_RESOLVER: &str = "System";

/// Errors from a single resolver query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("resolver request failed: {0}")]
    Request(String),

    #[error("resolver returned HTTP {0}")]
    HttpStatus(u16),

    #[error("resolver returned DNS status {0}")]
    DnsStatus(u32),

    #[error("invalid resolver response: {0}")]
    InvalidResponse(String),
}

/// What one resolver returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverAnswer {
    pub resolver: String,
    pub addresses: Vec<String>,
    pub error: Option<String>,
}

impl ResolverAnswer {
    pub fn answered(&self) -> bool {
        self.error.is_none() && !self.addresses.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| same_address(a, address))
    }
}

/// Summary of one round of queries against an expected address.
#[derive(Debug, Clone, Serialize)]
pub struct PropagationReport {
    pub expected: String,
    pub answers: Vec<ResolverAnswer>,
    pub matching: usize,
    pub answering: usize,
    pub propagated: bool,
    pub elapsed_seconds: u64,
}

#[derive(Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

fn rr_type(record_type: RecordType) -> u16 {
    match record_type {
        RecordType::A => 1,
        RecordType::AAAA => 28,
    }
}

/// Queries DoH JSON resolvers for a record's current value.
pub struct PropagationChecker {
    client: reqwest::Client,
    config: VerifyConfig,
}

impl PropagationChecker {
    pub fn new(config: VerifyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a checker with a custom HTTP client (for testing).
    pub fn with_client(config: VerifyConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    /// Ask one DoH resolver for the record's addresses.
    pub async fn query(
        &self,
        resolver: &ResolverConfig,
        domain: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, VerifyError> {
        let response = self
            .client
            .get(&resolver.url)
            .header("accept", "application/dns-json")
            .query(&[("name", domain), ("type", record_type.as_str())])
            .send()
            .await
            .map_err(|e| VerifyError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VerifyError::HttpStatus(response.status().as_u16()));
        }

        let body: DohResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;

        // NXDOMAIN (3) means "no such record", which is an answer, not an error
        if body.status != 0 && body.status != 3 {
            return Err(VerifyError::DnsStatus(body.status));
        }

        let wanted = rr_type(record_type);
        Ok(body
            .answer
            .into_iter()
            .filter(|a| a.record_type == wanted)
            .map(|a| a.data)
            .collect())
    }

    async fn query_system(&self, domain: &str, record_type: RecordType) -> Result<Vec<String>, VerifyError> {
        let lookup = tokio::net::lookup_host((domain, 0));
        let addrs = tokio::time::timeout(Duration::from_secs(self.config.timeout_seconds), lookup)
            .await
            .map_err(|_| VerifyError::Request("system resolver timed out".to_string()))?
            .map_err(|e| VerifyError::Request(e.to_string()))?;

        let mut addresses: Vec<String> = addrs
            .map(|a| a.ip())
            .filter(|ip| match record_type {
                RecordType::A => matches!(ip, IpAddr::V4(_)),
                RecordType::AAAA => matches!(ip, IpAddr::V6(_)),
            })
            .map(|ip| ip.to_string())
            .collect();
        addresses.sort();
        addresses.dedup();
        Ok(addresses)
    }

    /// Query every configured resolver concurrently.
    pub async fn check(&self, domain: &str, record_type: RecordType) -> Vec<ResolverAnswer> {
        let doh = self.config.resolvers.iter().map(|resolver| async move {
            to_answer(&resolver.name, self.query(resolver, domain, record_type).await)
        });

        let mut answers = join_all(doh).await;

        if self.config.include_system_resolver {
            let system = self.query_system(domain, record_type).await;
            answers.insert(0, to_answer(SYSTEM_RESOLVER, system));
        }

        answers
    }

    /// Run one round and judge it against `expected`.
    pub async fn check_expected(
        &self,
        domain: &str,
        record_type: RecordType,
        expected: &str,
    ) -> PropagationReport {
        let answers = self.check(domain, record_type).await;
        self.judge(expected, answers, Duration::ZERO)
    }

    /// Poll until a quorum of answering resolvers returns `expected` or
    /// `max_wait` elapses. Returns the last round either way.
    pub async fn wait_for(
        &self,
        domain: &str,
        record_type: RecordType,
        expected: &str,
        max_wait: Duration,
    ) -> PropagationReport {
        let start = Instant::now();
        let poll = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        loop {
            let answers = self.check(domain, record_type).await;
            let report = self.judge(expected, answers, start.elapsed());

            tracing::info!(
                domain = domain,
                expected = expected,
                matching = report.matching,
                answering = report.answering,
                "Propagation check"
            );

            if report.propagated || start.elapsed() + poll > max_wait {
                return report;
            }
            tokio::time::sleep(poll).await;
        }
    }

    fn judge(&self, expected: &str, answers: Vec<ResolverAnswer>, elapsed: Duration) -> PropagationReport {
        let answering = answers.iter().filter(|a| a.answered()).count();
        let matching = answers.iter().filter(|a| a.contains(expected)).count();
        let propagated =
            answering > 0 && (matching as f64 / answering as f64) >= self.config.quorum;

        PropagationReport {
            expected: expected.to_string(),
            answers,
            matching,
            answering,
            propagated,
            elapsed_seconds: elapsed.as_secs(),
        }
    }
}

fn to_answer(resolver: &str, result: Result<Vec<String>, VerifyError>) -> ResolverAnswer {
    match result {
        Ok(addresses) => ResolverAnswer {
            resolver: resolver.to_string(),
            addresses,
            error: None,
        },
        Err(e) => ResolverAnswer {
            resolver: resolver.to_string(),
            addresses: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}
