//! Image upload route handlers.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireArtist;
use crate::services::media::{
    ImageUpload, MAX_FILES_PER_REQUEST, MAX_IMAGE_BYTES, UploadedImage, validate_image,
};
use crate::state::AppState;

/// Request body limit for the upload route: every file at full size plus
/// room for multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILES_PER_REQUEST * MAX_IMAGE_BYTES + 64 * 1024;

/// Uploaded image URLs, in request order.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub images: Vec<UploadedImage>,
}

fn multipart_error(e: &MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Read and validate every file part of the form.
async fn read_images(mut multipart: Multipart) -> Result<Vec<ImageUpload>> {
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(&e))? {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if images.len() == MAX_FILES_PER_REQUEST {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_FILES_PER_REQUEST} images per upload"
            )));
        }

        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        validate_image(&content_type, bytes.len())?;

        images.push(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    if images.is_empty() {
        return Err(AppError::BadRequest("no images in request".to_string()));
    }
    Ok(images)
}

/// Upload product images.
///
/// # Route
///
/// `POST /api/uploads/images` (multipart, up to five `image/*` files)
#[instrument(skip(state, multipart), fields(artist_id = %artist.artist_id))]
pub async fn upload_images(
    State(state): State<AppState>,
    RequireArtist(artist): RequireArtist,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let store = state
        .media()
        .ok_or_else(|| AppError::ServiceUnavailable("Image uploads are not configured".to_string()))?;

    let images = read_images(multipart).await?;

    let mut uploaded = Vec::with_capacity(images.len());
    for image in images {
        uploaded.push(store.upload_image(image).await?);
    }

    add_breadcrumb("uploads", "Images uploaded", None);
    tracing::info!(count = uploaded.len(), "Images uploaded");

    Ok((StatusCode::CREATED, Json(UploadResponse { images: uploaded })))
}
