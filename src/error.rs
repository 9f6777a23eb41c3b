//! Error types for the acquisition client

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while talking to the extraction service.
///
/// Operations never hand these to callers directly; they are folded into
/// the `error` / `error_kind` fields of the result values.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// No API key configured
    #[error("Missing API key: set FIRECRAWL_API_KEY")]
    MissingCredential,

    /// Request exceeded its time budget and was cancelled
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// No response was received (reset, refused, DNS, ...)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Service answered 5xx
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Service answered 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Service answered any other non-success status
    #[error("Request rejected (status {status}): {message}")]
    Client { status: u16, message: String },

    /// Caller handed us something unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Service answered 2xx but reported `success: false`
    #[error("Service reported failure: {0}")]
    Remote(String),

    /// Remote extraction job ended in a failed state
    #[error("Extraction job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    /// Local polling deadline passed while the job was still running
    #[error("Extraction job {job_id} still pending after {waited:?}")]
    PollingTimeout { job_id: String, waited: Duration },
}

/// Machine-readable tag attached to failed results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    TransientNetwork,
    Server,
    RateLimit,
    Client,
    InvalidInput,
    InvalidResponse,
    JobFailed,
    PollingTimeout,
}

impl AcquireError {
    /// Classify a non-success HTTP status. The body is kept (trimmed) for
    /// the error description.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = summarize_body(body);
        match status {
            429 => AcquireError::RateLimited(message),
            500..=599 => AcquireError::Server { status, message },
            _ => AcquireError::Client { status, message },
        }
    }

    /// Map a transport failure where no response was received.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            AcquireError::Timeout(timeout)
        } else if err.is_builder() {
            AcquireError::InvalidInput(err.to_string())
        } else {
            AcquireError::Connection(err.to_string())
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquireError::MissingCredential => ErrorKind::Configuration,
            AcquireError::Timeout(_) | AcquireError::Connection(_) => ErrorKind::TransientNetwork,
            AcquireError::Server { .. } => ErrorKind::Server,
            AcquireError::RateLimited(_) => ErrorKind::RateLimit,
            AcquireError::Client { .. } | AcquireError::Remote(_) => ErrorKind::Client,
            AcquireError::InvalidInput(_) => ErrorKind::InvalidInput,
            AcquireError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            AcquireError::JobFailed { .. } => ErrorKind::JobFailed,
            AcquireError::PollingTimeout { .. } => ErrorKind::PollingTimeout,
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransientNetwork | ErrorKind::Server | ErrorKind::RateLimit
        )
    }
}

fn summarize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    // Prefer the service's own `error` field when the body is JSON.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    trimmed.chars().take(300).collect()
}
