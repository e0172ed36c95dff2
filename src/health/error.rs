//! Error types for health probing.

use thiserror::Error;

/// Why a single probe failed.
///
/// Probe errors are data: they are carried inside a failed
/// [`ProbeOutcome`](super::ProbeOutcome) and fed to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// No answer within the configured timeout
    #[error("probe timeout after {0}ms")]
    Timeout(u64),

    /// Connection refused, reset, or unreachable
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Host name of the server could not be resolved
    #[error("DNS resolution failed: {0}")]
    DnsError(String),

    /// HTTP response outside 200..=399
    #[error("unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),
}
