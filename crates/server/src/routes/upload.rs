//! Multipart image uploads.

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartRejection;

use crate::error::AppError;

/// Form field carrying the image.
const IMAGE_FIELD: &str = "image";

/// An uploaded image, not yet validated.
#[derive(Debug)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Pull the `image` field out of a multipart form.
///
/// # Errors
///
/// Returns `BadRequest` if the body is not multipart or has no `image` field,
/// and `PayloadTooLarge` if it exceeds the body limit.
pub async fn read_image(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ImageUpload, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        return Ok(ImageUpload {
            content_type,
            bytes,
        });
    }

    Err(AppError::BadRequest(format!(
        "multipart field \"{IMAGE_FIELD}\" is required"
    )))
}
