//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use vapeshop_core::CatalogError;
use vapeshop_firebase::{FirebaseError, IdentityError};

use crate::cloudinary::CloudinaryError;
use crate::db::RepositoryError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Realtime Database call failed outside a repository.
    #[error("Database error: {0}")]
    Database(#[from] FirebaseError),

    /// Identity provider call failed.
    #[error("Auth error: {0}")]
    Auth(#[from] IdentityError),

    /// Image upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] CloudinaryError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        Self::Repository(RepositoryError::Catalog(err))
    }
}

impl AppError {
    /// Failures on our side or upstream, as opposed to bad admin input.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Repository(err) => {
                matches!(err, RepositoryError::Database(_))
            }
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                IdentityError::Http(_) | IdentityError::Api { .. } | IdentityError::Parse(_)
            ),
            Self::Upload(err) => err.is_upstream(),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Repository(err) => match err {
                RepositoryError::Database(_) => StatusCode::BAD_GATEWAY,
                RepositoryError::Catalog(CatalogError::Duplicate { .. }) => StatusCode::CONFLICT,
                RepositoryError::Catalog(CatalogError::NotFound { .. })
                | RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
                RepositoryError::Catalog(CatalogError::EmptyName(_))
                | RepositoryError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            },
            Self::Database(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::UserDisabled => StatusCode::FORBIDDEN,
                IdentityError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Upload(err) => err.status(),
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Repository(RepositoryError::Database(_)) | Self::Database(_) => {
                "External service error".to_string()
            }
            Self::Repository(err) => err.to_string(),
            Self::Auth(IdentityError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(_) => "Authentication service error".to_string(),
            Self::Upload(err) if err.is_upstream() => "Image upload failed".to_string(),
            Self::Upload(err) => err.to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an admin identity.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use vapeshop_core::EntityKind;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order -N1".to_string());
        assert_eq!(err.to_string(), "Not found: order -N1");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_catalog_errors_map_to_client_statuses() {
        assert_eq!(
            get_status(AppError::from(CatalogError::Duplicate {
                kind: EntityKind::Brand,
                name: "Nasty".to_string(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::from(CatalogError::NotFound {
                kind: EntityKind::Line,
                name: "Ice".to_string(),
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::from(CatalogError::EmptyName(EntityKind::Product))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Upload(CloudinaryError::TooLarge(6 * 1024 * 1024))),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_details_are_hidden() {
        let err = AppError::Database(FirebaseError::Api {
            status: 500,
            message: "secret internals".to_string(),
        });
        assert_eq!(err.public_message(), "External service error");
    }
}
