//! Identity Toolkit client for email/password accounts.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use vapeshop_core::{Email, UserId};

use crate::IdentityConfig;
use crate::error::IdentityError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens returned by a successful sign-up or sign-in.
#[derive(Clone)]
pub struct AuthSession {
    pub local_id: UserId,
    pub email: String,
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    /// Seconds until `id_token` expires.
    pub expires_in: u64,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("local_id", &self.local_id)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Sent as a decimal string.
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Firebase Authentication REST client.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<Inner>,
}

struct Inner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmailExists`] for a taken address,
    /// [`IdentityError::WeakPassword`] when the provider rejects the password,
    /// or a transport/API error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthSession, IdentityError> {
        self.password_call("signUp", email, password).await
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] for an unknown email or
    /// wrong password, or a transport/API error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthSession, IdentityError> {
        self.password_call("signInWithPassword", email, password).await
    }

    async fn password_call(
        &self,
        method: &str,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let url = format!("{}/v1/accounts:{method}", self.inner.base_url);
        let body = PasswordRequest {
            email: email.as_str(),
            password,
            return_secure_token: true,
        };

        let response = self
            .inner
            .client
            .post(&url)
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => IdentityError::from_code(status.as_u16(), &envelope.error.message),
                Err(_) => {
                    warn!(status = status.as_u16(), "unrecognized identity error body");
                    IdentityError::Api {
                        status: status.as_u16(),
                        code: text,
                    }
                }
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))?;
        let local_id = UserId::parse(&token.local_id)
            .map_err(|e| IdentityError::Parse(format!("localId: {e}")))?;

        Ok(AuthSession {
            local_id,
            email: token.email.unwrap_or_else(|| email.as_str().to_owned()),
            id_token: SecretString::from(token.id_token),
            refresh_token: SecretString::from(token.refresh_token),
            expires_in: token
                .expires_in
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::{Value, json};

    use super::*;

    async fn spawn(router: Router) -> IdentityClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        IdentityClient::new(&IdentityConfig {
            api_key: SecretString::from("test-key"),
            base_url: format!("http://{addr}/"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_returns_session() {
        let router = Router::new().route(
            "/v1/accounts:signInWithPassword",
            post(|axum::Json(body): axum::Json<Value>| async move {
                assert_eq!(body["returnSecureToken"], true);
                axum::Json(json!({
                    "localId": "uid123",
                    "email": body["email"],
                    "idToken": "id-token",
                    "refreshToken": "refresh",
                    "expiresIn": "1800"
                }))
            }),
        );
        let client = spawn(router).await;
        let email = Email::parse("Ana@Example.com").unwrap();
        let session = client.sign_in(&email, "hunter22").await.unwrap();

        assert_eq!(session.local_id.as_str(), "uid123");
        assert_eq!(session.email, "ana@example.com");
        assert_eq!(session.id_token.expose_secret(), "id-token");
        assert_eq!(session.expires_in, 1800);
        assert!(!format!("{session:?}").contains("id-token"));
    }

    #[tokio::test]
    async fn test_sign_up_maps_provider_errors() {
        let router = Router::new().route(
            "/v1/accounts:signUp",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({
                        "error": { "code": 400, "message": "EMAIL_EXISTS", "errors": [] }
                    })),
                )
            }),
        );
        let client = spawn(router).await;
        let email = Email::parse("ana@example.com").unwrap();
        let err = client.sign_up(&email, "hunter22").await.unwrap_err();
        assert!(matches!(err, IdentityError::EmailExists));
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let router = Router::new().route(
            "/v1/accounts:signInWithPassword",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream down") }),
        );
        let client = spawn(router).await;
        let email = Email::parse("ana@example.com").unwrap();
        let err = client.sign_in(&email, "x").await.unwrap_err();
        assert!(matches!(err, IdentityError::Api { status: 503, .. }));
    }
}
