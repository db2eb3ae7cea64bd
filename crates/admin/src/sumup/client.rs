//! SumUp REST client.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{SumUpError, upstream_message};
use crate::config::SumUpConfig;

/// Fixed timeout for every SumUp call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// SumUp API client.
#[derive(Clone)]
pub struct SumUpClient {
    inner: Arc<SumUpClientInner>,
}

struct SumUpClientInner {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    merchant_code: Option<String>,
}

impl SumUpClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SumUpConfig) -> Result<Self, SumUpError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(SumUpClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                token: config.bearer_token.clone(),
                merchant_code: config.merchant_code.clone(),
            }),
        })
    }

    /// Whether a bearer token is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.token.is_some()
    }

    fn transactions_path(&self) -> String {
        match &self.inner.merchant_code {
            Some(code) => format!("/v2.1/merchants/{}/transactions", urlencoding::encode(code)),
            None => "/v0.1/me/transactions".to_string(),
        }
    }

    /// Transaction history. `query` is forwarded verbatim (`limit`,
    /// `oldest_time`, `statuses[]`, ...).
    ///
    /// # Errors
    ///
    /// See [`SumUpError`].
    #[instrument(skip(self))]
    pub async fn transactions(&self, query: Option<&str>) -> Result<Value, SumUpError> {
        let path = format!("{}/history", self.transactions_path());
        self.get(&path, query).await
    }

    /// A single transaction by id.
    ///
    /// # Errors
    ///
    /// See [`SumUpError`].
    #[instrument(skip(self))]
    pub async fn transaction(&self, id: &str) -> Result<Value, SumUpError> {
        let query = format!("id={}", urlencoding::encode(id));
        self.get(&self.transactions_path(), Some(&query)).await
    }

    /// Checkouts, with `query` forwarded verbatim (`checkout_reference`, ...).
    ///
    /// # Errors
    ///
    /// See [`SumUpError`].
    #[instrument(skip(self))]
    pub async fn checkouts(&self, query: Option<&str>) -> Result<Value, SumUpError> {
        self.get("/v0.1/checkouts", query).await
    }

    /// A single checkout by id.
    ///
    /// # Errors
    ///
    /// See [`SumUpError`].
    #[instrument(skip(self))]
    pub async fn checkout(&self, id: &str) -> Result<Value, SumUpError> {
        let path = format!("/v0.1/checkouts/{}", urlencoding::encode(id));
        self.get(&path, None).await
    }

    async fn get(&self, path: &str, query: Option<&str>) -> Result<Value, SumUpError> {
        let token = self.inner.token.as_ref().ok_or(SumUpError::NotConfigured)?;

        let mut url = format!("{}{path}", self.inner.base_url);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        debug!(%path, "calling SumUp");

        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let details = if body.trim().is_empty() {
                Value::Null
            } else {
                match serde_json::from_str::<Value>(&body) {
                    Ok(json) => json,
                    Err(_) => Value::String(body),
                }
            };
            let message = upstream_message(status.as_u16(), &details);
            warn!(status = status.as_u16(), %message, "SumUp request failed");
            return Err(SumUpError::Upstream {
                status: status.as_u16(),
                message,
                details,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}
