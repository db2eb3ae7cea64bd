//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use vapeshop_firebase::{FirebaseError, IdentityError};

use crate::catalog::CatalogUnavailable;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Realtime Database call failed.
    #[error("Database error: {0}")]
    Database(#[from] FirebaseError),

    /// Identity provider call failed.
    #[error("Auth error: {0}")]
    Auth(#[from] IdentityError),

    /// Neither the database nor the bundled file produced a catalog.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogUnavailable),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) | Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::EmailExists => StatusCode::CONFLICT,
                IdentityError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                IdentityError::UserDisabled => StatusCode::FORBIDDEN,
                IdentityError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Database(_) | Self::Catalog(_) => "External service error".to_string(),
            Self::Auth(err) => match err {
                IdentityError::InvalidCredentials => "Invalid credentials".to_string(),
                IdentityError::EmailExists => {
                    "An account with this email already exists".to_string()
                }
                IdentityError::WeakPassword(msg) => msg.clone(),
                IdentityError::UserDisabled => "This account has been disabled".to_string(),
                IdentityError::TooManyAttempts => {
                    "Too many attempts, please try again later".to_string()
                }
                _ => "Authentication service error".to_string(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

impl AppError {
    /// Failures on our side or upstream, as opposed to bad user input.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Catalog(_)
                | Self::Session(_)
                | Self::Internal(_)
                | Self::Auth(
                    IdentityError::Http(_) | IdentityError::Api { .. } | IdentityError::Parse(_)
                )
        )
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
