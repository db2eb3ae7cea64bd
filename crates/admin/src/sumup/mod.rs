//! SumUp payments API client.
//!
//! Read-only access to transaction history and checkouts. Upstream payloads
//! are passed through untouched as `serde_json::Value`; the admin only wraps
//! them in its own response envelope.
//!
//! # Authentication
//!
//! Every call carries `Authorization: Bearer <SUMUP_BEARER_TOKEN>`. When the
//! token is not configured the client refuses locally with
//! [`SumUpError::NotConfigured`] and never contacts SumUp.

pub mod client;

pub use client::SumUpClient;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling SumUp.
#[derive(Debug, Error)]
pub enum SumUpError {
    /// No bearer token is configured.
    #[error("SumUp bearer token is not configured")]
    NotConfigured,

    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SumUp answered with a non-success status.
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        /// Upstream body as JSON, or as a string when it was not JSON.
        details: Value,
    },

    /// A success response was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pick a readable message out of a SumUp error body.
///
/// SumUp uses `message`, `error_message` or `error_code` depending on the
/// endpoint; some errors come back as an array of such objects.
pub(crate) fn upstream_message(status: u16, details: &Value) -> String {
    let object = match details {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    ["message", "error_message", "error_code"]
        .iter()
        .find_map(|key| object?.get(key)?.as_str())
        .map_or_else(|| format!("SumUp API error: {status}"), str::to_string)
}
