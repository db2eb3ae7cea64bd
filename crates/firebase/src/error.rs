//! Error types for the Firebase clients.

use thiserror::Error;
use vapeshop_core::KeyError;

/// Errors from Realtime Database calls.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The database answered with a non-success status.
    #[error("database error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A path segment is not a valid database key.
    #[error("invalid path segment: {0}")]
    InvalidPath(#[from] KeyError),

    /// The configured database URL cannot be used.
    #[error("invalid database URL: {0}")]
    InvalidUrl(String),
}

impl FirebaseError {
    /// Whether the database rejected the call for lack of permission.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

/// Errors from Identity Toolkit sign-up and sign-in.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Sign-up with an address that already has an account.
    #[error("an account with this email already exists")]
    EmailExists,

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password rejected by the provider's policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// The provider is throttling this client.
    #[error("too many attempts, try again later")]
    TooManyAttempts,

    /// The account was disabled by an administrator.
    #[error("account disabled")]
    UserDisabled,

    /// Any other provider error code.
    #[error("identity provider error {status}: {code}")]
    Api { status: u16, code: String },

    /// Unexpected response body.
    #[error("identity response parse error: {0}")]
    Parse(String),
}

impl IdentityError {
    /// Map an Identity Toolkit error message such as `EMAIL_EXISTS` or
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    #[must_use]
    pub fn from_code(status: u16, message: &str) -> Self {
        let (code, detail) = message
            .split_once(" : ")
            .map_or((message.trim(), ""), |(c, d)| (c.trim(), d.trim()));
        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_EMAIL" => Self::InvalidCredentials,
            "WEAK_PASSWORD" => Self::WeakPassword(if detail.is_empty() {
                "password is too weak".to_string()
            } else {
                detail.to_string()
            }),
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "USER_DISABLED" => Self::UserDisabled,
            other => Self::Api {
                status,
                code: other.to_string(),
            },
        }
    }
}
