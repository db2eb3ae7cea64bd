//! Image upload endpoint used by the product and brand forms.

use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, State},
};
use tracing::instrument;

use crate::cloudinary::{CloudinaryError, MAX_UPLOAD_BYTES, UploadedImage, validate_image};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Body limit for `/uploads`: the image cap plus room for multipart framing.
#[must_use]
pub fn body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)
}

/// Accept one image in the `file` field and return its hosted URL.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    mut multipart: Multipart,
) -> Result<Json<UploadedImage>> {
    let client = state
        .cloudinary()
        .ok_or(AppError::Upload(CloudinaryError::NotConfigured))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;

        // Reject before buffering a second copy for the outgoing request
        validate_image(&content_type, bytes.len())?;
        let uploaded = client
            .upload(&file_name, &content_type, bytes.to_vec())
            .await?;
        return Ok(Json(uploaded));
    }

    Err(CloudinaryError::Empty.into())
}
