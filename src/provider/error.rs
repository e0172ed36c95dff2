//! Error types for DNS provider operations.

use thiserror::Error;

/// Errors returned by a [`DnsProvider`](super::DnsProvider).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Reading the current record failed (network, timeout, 5xx, API error).
    #[error("Failed to read DNS record: {0}")]
    Read(String),

    /// Writing the record failed.
    #[error("Failed to write DNS record: {0}")]
    Write(String),

    /// Credentials rejected; persists until the configuration is fixed.
    #[error("Provider rejected credentials ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Response body doesn't match the expected API format.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ProviderError::Auth { .. })
    }

    /// Short label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Read(_) => "read",
            ProviderError::Write(_) => "write",
            ProviderError::Auth { .. } => "auth",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }
}
