//! Product image uploads.
//!
//! [`MediaStore`] hides the hosting provider; [`CloudinaryStore`] uploads
//! through Cloudinary's signed upload API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::CloudinaryConfig;

/// Most images accepted in one upload request.
pub const MAX_FILES_PER_REQUEST: usize = 5;

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Errors from image validation or upload.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} is not an image")]
    NotAnImage(String),

    #[error("image exceeds {MAX_IMAGE_BYTES} bytes")]
    TooLarge,

    #[error("image is empty")]
    Empty,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// An image received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

/// Check an image's declared type and size.
///
/// # Errors
///
/// Returns `MediaError::NotAnImage` for non `image/*` types,
/// `MediaError::Empty` for empty files and `MediaError::TooLarge` above
/// [`MAX_IMAGE_BYTES`].
pub fn validate_image(content_type: &str, len: usize) -> Result<(), MediaError> {
    if !content_type.starts_with("image/") {
        return Err(MediaError::NotAnImage(content_type.to_owned()));
    }
    if len == 0 {
        return Err(MediaError::Empty);
    }
    if len > MAX_IMAGE_BYTES {
        return Err(MediaError::TooLarge);
    }
    Ok(())
}

/// Somewhere to put product images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an already validated image and return its public URL.
    async fn upload_image(&self, image: ImageUpload) -> Result<UploadedImage, MediaError>;
}

// =============================================================================
// Cloudinary
// =============================================================================

#[derive(Deserialize)]
struct CloudinaryResponse {
    secure_url: String,
    public_id: String,
}

/// Cloudinary signed uploads.
#[derive(Clone)]
pub struct CloudinaryStore {
    inner: Arc<CloudinaryInner>,
}

struct CloudinaryInner {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl CloudinaryStore {
    /// Create a store for the configured cloud.
    #[must_use]
    pub fn new(config: &CloudinaryConfig, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(CloudinaryInner {
                client,
                upload_url: format!(
                    "https://api.cloudinary.com/v1_1/{}/image/upload",
                    config.cloud_name
                ),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.expose_secret().to_string(),
                folder: config.folder.clone(),
            }),
        }
    }
}

/// Sign upload parameters.
///
/// Parameters are sorted by name, joined as `k=v` with `&`, suffixed with the
/// API secret and hashed with SHA-256.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_unstable_by_key(|(k, _)| *k);
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload_image(&self, image: ImageUpload) -> Result<UploadedImage, MediaError> {
        let inner = &self.inner;
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", inner.folder.as_str()), ("timestamp", timestamp.as_str())],
            &inner.api_secret,
        );

        let file = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", inner.api_key.clone())
            .text("folder", inner.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = inner
            .client
            .post(&inner.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected { status, body });
        }

        let uploaded: CloudinaryResponse = response.json().await?;
        tracing::info!(public_id = %uploaded.public_id, "image uploaded");

        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_params() {
        let a = sign(&[("timestamp", "1700000000"), ("folder", "crafts")], "secret");
        let b = sign(&[("folder", "crafts"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_signature_matches_manual_digest() {
        let expected = hex::encode(Sha256::digest(b"folder=crafts&timestamp=1700000000secret"));
        assert_eq!(
            sign(&[("timestamp", "1700000000"), ("folder", "crafts")], "secret"),
            expected
        );
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image("image/png", 1024).is_ok());
        assert!(matches!(
            validate_image("application/pdf", 10),
            Err(MediaError::NotAnImage(_))
        ));
        assert!(matches!(validate_image("image/jpeg", 0), Err(MediaError::Empty)));
        assert!(matches!(
            validate_image("image/jpeg", MAX_IMAGE_BYTES + 1),
            Err(MediaError::TooLarge)
        ));
    }
}
