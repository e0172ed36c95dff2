//! Cloudflare DNS provider.

use super::{DnsProvider, DnsRecord, ProviderError, RecordKey};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare error codes that mean the token is invalid or lacks access.
const AUTH_ERROR_CODES: &[u32] = &[9103, 9106, 9109, 10000];

/// Cloudflare v4 API provider.
///
/// Handles record management with bearer-token authentication:
/// - Lookup via GET /zones/{zone}/dns_records?name=&type=
/// - Update via PUT /zones/{zone}/dns_records/{id}
/// - Create via POST /zones/{zone}/dns_records when no record exists
pub struct CloudflareProvider {
    /// Base URL (e.g., "https://api.cloudflare.com/client/v4")
    base_url: String,
    api_token: String,
    /// Shared HTTP client for connection pooling
    client: Client,
}

#[derive(Clone, Copy)]
enum Operation {
    Read,
    Write,
}

impl Operation {
    fn error(self, message: String) -> ProviderError {
        match self {
            Operation::Read => ProviderError::Read(message),
            Operation::Write => ProviderError::Write(message),
        }
    }
}

/// Standard Cloudflare response envelope
#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Deserialize)]
struct ApiMessage {
    code: u32,
    message: String,
}

#[derive(Deserialize)]
struct CloudflareRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    ttl: u32,
}

#[derive(Serialize)]
struct RecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
}

impl CloudflareRecord {
    fn into_record(self, key: &RecordKey) -> DnsRecord {
        DnsRecord {
            id: Some(self.id),
            record_type: self.record_type.parse().unwrap_or(key.record_type),
            name: self.name,
            value: self.content,
            ttl: self.ttl,
        }
    }
}

impl CloudflareProvider {
    /// Create a provider whose requests time out after `timeout`.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(
            config.api_base_url.clone(),
            config.api_token.clone(),
            client,
        ))
    }

    /// Create a provider with a custom HTTP client (for testing).
    pub fn with_client(base_url: String, api_token: String, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client,
        }
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    async fn find_record(
        &self,
        key: &RecordKey,
        op: Operation,
    ) -> Result<Option<CloudflareRecord>, ProviderError> {
        let response = self
            .client
            .get(self.records_url(&key.zone_id))
            .bearer_auth(&self.api_token)
            .query(&[("name", key.name.as_str()), ("type", key.record_type.as_str())])
            .send()
            .await
            .map_err(|e| classify_error(e, op))?;

        let records: Vec<CloudflareRecord> = decode(response, op).await?;
        Ok(records.into_iter().next())
    }
}

/// Classify reqwest error into ProviderError.
fn classify_error(e: reqwest::Error, op: Operation) -> ProviderError {
    if e.is_timeout() {
        op.error(format!("request timed out: {}", e))
    } else {
        op.error(e.to_string())
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    op: Operation,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| op.error(format!("failed to read response body: {}", e)))?;

    let envelope = serde_json::from_str::<Envelope<T>>(&body);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let message = match &envelope {
            Ok(env) if !env.errors.is_empty() => join_messages(&env.errors),
            _ => status.to_string(),
        };
        return Err(ProviderError::Auth {
            status: status.as_u16(),
            message,
        });
    }

    let envelope = match envelope {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(op.error(format!("HTTP {}", status.as_u16())));
        }
        Err(e) => {
            return Err(ProviderError::InvalidResponse(format!(
                "failed to parse Cloudflare response: {}",
                e
            )));
        }
    };

    if !status.is_success() || !envelope.success {
        if envelope
            .errors
            .iter()
            .any(|e| AUTH_ERROR_CODES.contains(&e.code))
        {
            return Err(ProviderError::Auth {
                status: status.as_u16(),
                message: join_messages(&envelope.errors),
            });
        }
        return Err(op.error(format!(
            "HTTP {}: {}",
            status.as_u16(),
            join_messages(&envelope.errors)
        )));
    }

    envelope
        .result
        .ok_or_else(|| ProviderError::InvalidResponse("response has no result".to_string()))
}

fn join_messages(messages: &[ApiMessage]) -> String {
    if messages.is_empty() {
        return "no error details".to_string();
    }
    messages
        .iter()
        .map(|m| format!("[{}] {}", m.code, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn name(&self) -> &str {
        "cloudflare"
    }

    async fn get_record(&self, key: &RecordKey) -> Result<Option<DnsRecord>, ProviderError> {
        let record = self.find_record(key, Operation::Read).await?;
        if record.is_none() {
            tracing::warn!(record = %key, "DNS record not found");
        }
        Ok(record.map(|r| r.into_record(key)))
    }

    async fn upsert_record(
        &self,
        key: &RecordKey,
        value: &str,
        ttl: u32,
    ) -> Result<DnsRecord, ProviderError> {
        // The record id is needed for PUT; a failed lookup fails the write.
        let existing = self.find_record(key, Operation::Write).await?;

        let body = RecordBody {
            record_type: key.record_type.as_str(),
            name: &key.name,
            content: value,
            ttl,
        };

        let request = match &existing {
            Some(record) => self
                .client
                .put(format!("{}/{}", self.records_url(&key.zone_id), record.id)),
            None => self.client.post(self.records_url(&key.zone_id)),
        };

        let response = request
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_error(e, Operation::Write))?;

        let record: CloudflareRecord = decode(response, Operation::Write).await?;

        tracing::info!(
            record = %key,
            value = %record.content,
            ttl = record.ttl,
            created = existing.is_none(),
            "DNS record written"
        );

        Ok(record.into_record(key))
    }
}
