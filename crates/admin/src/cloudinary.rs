//! Cloudinary image upload.
//!
//! Uploads go through the unsigned preset configured in Cloudinary, so no API
//! secret is held here. Type and size are checked before anything is sent.

use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::CloudinaryConfig;

/// Largest accepted upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted MIME types.
pub const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from image validation and upload.
#[derive(Debug, Error)]
pub enum CloudinaryError {
    /// Uploads are disabled because Cloudinary is not configured.
    #[error("image uploads are not configured")]
    NotConfigured,

    #[error("unsupported image type '{0}' (allowed: jpeg, png, webp, gif)")]
    UnsupportedType(String),

    #[error("image is {0} bytes; the limit is 5 MiB")]
    TooLarge(usize),

    #[error("no file was uploaded")]
    Empty,

    /// HTTP request failed (connection, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloudinary rejected the upload.
    #[error("Cloudinary error {status}: {message}")]
    Api { status: u16, message: String },
}

impl CloudinaryError {
    /// Whether the failure happened at Cloudinary rather than in the request.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }

    /// HTTP status to answer the admin with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Empty => StatusCode::BAD_REQUEST,
            Self::Http(_) | Self::Api { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Check an upload before sending it.
///
/// # Errors
///
/// Returns `Empty`, `TooLarge` or `UnsupportedType`.
pub fn validate_image(content_type: &str, len: usize) -> Result<(), CloudinaryError> {
    if len == 0 {
        return Err(CloudinaryError::Empty);
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(CloudinaryError::TooLarge(len));
    }
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_TYPES.contains(&essence.as_str()) {
        return Err(CloudinaryError::UnsupportedType(content_type.to_string()));
    }
    Ok(())
}

/// A hosted image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Client for unsigned uploads.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: String,
}

impl CloudinaryClient {
    /// Create a client for the configured cloud.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CloudinaryConfig) -> Result<Self, CloudinaryError> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1_1/{}/image/upload",
                config.base_url.trim_end_matches('/'),
                urlencoding::encode(&config.cloud_name)
            ),
            upload_preset: config.upload_preset.clone(),
        })
    }

    /// Upload one image and return its HTTPS URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or `Http`/`Api` when Cloudinary fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, CloudinaryError> {
        validate_image(content_type, bytes.len())?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|_| CloudinaryError::UnsupportedType(content_type.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message =
                serde_json::from_str::<ErrorResponse>(&body).map_or(body, |e| e.error.message);
            return Err(CloudinaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        info!(public_id = %uploaded.public_id, "image uploaded");
        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}
