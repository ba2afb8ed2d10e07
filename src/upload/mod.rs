//! Event image handling: one optional file per form, strict type and size
//! checks before anything touches the database, and staged files removed
//! whenever the rest of the request fails.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{error, warn};

/// Fixed multipart field name for the event image.
pub const IMAGE_FIELD: &str = "eventimage";

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Declared MIME type and file extension must both sit on this list.
const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
];

/// Public path prefix stored in event rows and served as static files.
const PUBLIC_PREFIX: &str = "/uploads/events";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only image files (jpeg, jpg, png, gif) are allowed.")]
    UnsupportedType,

    #[error("Images must be 5 MB or smaller.")]
    TooLarge,

    #[error("Unable to store the uploaded image. Please try again.")]
    Store(#[from] std::io::Error),
}

/// A file written to the uploads directory whose row has not been saved
/// yet. Callers either keep the public path or discard the file.
#[derive(Debug)]
pub struct StagedImage {
    pub public_path: String,
    disk_path: PathBuf,
}

impl StagedImage {
    /// Remove the staged file after a downstream failure. Best effort; a
    /// missing file is fine, anything else is logged.
    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.disk_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.disk_path.display(), error = %e, "failed to remove staged upload");
            }
        }
    }
}

/// Check the declared content type and the file extension against the
/// allow-list. Both must match, and must agree on the type.
pub fn validate_image(content_type: Option<&str>, file_name: &str) -> Result<(), UploadError> {
    let declared = content_type.ok_or(UploadError::UnsupportedType)?;
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or(UploadError::UnsupportedType)?;

    ALLOWED_TYPES
        .iter()
        .find(|(mime, exts)| *mime == declared && exts.contains(&ext.as_str()))
        .map(|_| ())
        .ok_or(UploadError::UnsupportedType)
}

/// Derive the stored filename: sanitized original stem plus a
/// timestamp-and-random suffix so concurrent uploads of the same name
/// cannot collide.
pub fn storage_name(original: &str, timestamp_ms: i64, discriminator: u32) -> String {
    let path = Path::new(original);
    let stem: String = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "image".to_string() } else { stem };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    format!("{stem}-{timestamp_ms}-{discriminator}.{ext}")
}

/// Validate and write an uploaded image into the uploads directory,
/// returning the staged file and its public path.
pub async fn stage_image(
    uploads_dir: &Path,
    original_name: &str,
    content_type: Option<&str>,
    bytes: Bytes,
) -> Result<StagedImage, UploadError> {
    validate_image(content_type, original_name)?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge);
    }

    let name = storage_name(
        original_name,
        Utc::now().timestamp_millis(),
        rand::thread_rng().gen(),
    );
    let disk_path = uploads_dir.join(&name);
    tokio::fs::write(&disk_path, &bytes).await?;

    Ok(StagedImage {
        public_path: format!("{PUBLIC_PREFIX}/{name}"),
        disk_path,
    })
}

/// Remove a previously stored image by its public path (on event delete,
/// or after an edit replaced it). Best effort.
pub async fn remove_public_file(public_dir: &Path, public_path: &str) {
    let relative = public_path.trim_start_matches('/');
    // The only paths we ever store are under the uploads prefix; refuse
    // anything else rather than follow a doctored row.
    if !relative.starts_with("uploads/") || relative.contains("..") {
        warn!(path = %public_path, "refusing to remove file outside the uploads directory");
        return;
    }
    let disk_path = public_dir.join(relative);
    if let Err(e) = tokio::fs::remove_file(&disk_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            error!(path = %disk_path.display(), error = %e, "failed to remove stored image");
        }
    }
}

/// Create the uploads directory on startup if it is absent.
pub async fn ensure_uploads_dir(uploads_dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(uploads_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_mime_and_extension() {
        assert!(validate_image(Some("image/jpeg"), "poster.jpg").is_ok());
        assert!(validate_image(Some("image/jpeg"), "poster.JPEG").is_ok());
        assert!(validate_image(Some("image/png"), "logo.png").is_ok());
        assert!(validate_image(Some("image/gif"), "loop.gif").is_ok());
    }

    #[test]
    fn rejects_mismatched_or_unknown_types() {
        // Declared type and extension must agree.
        assert!(validate_image(Some("image/png"), "poster.jpg").is_err());
        assert!(validate_image(Some("image/webp"), "poster.webp").is_err());
        assert!(validate_image(Some("application/pdf"), "poster.pdf").is_err());
        assert!(validate_image(Some("image/jpeg"), "noextension").is_err());
        assert!(validate_image(None, "poster.jpg").is_err());
    }

    #[test]
    fn storage_name_keeps_stem_and_extension() {
        let name = storage_name("spring fling.png", 1730000000000, 42);
        assert_eq!(name, "spring_fling-1730000000000-42.png");
    }

    #[test]
    fn storage_name_survives_hostile_names() {
        let name = storage_name("../../etc/passwd", 1, 2);
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
    }

    #[test]
    fn storage_names_differ_by_discriminator() {
        let a = storage_name("poster.jpg", 1730000000000, 1);
        let b = storage_name("poster.jpg", 1730000000000, 2);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_before_write() {
        let dir = std::env::temp_dir();
        let bytes = Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]);
        let result = stage_image(&dir, "big.png", Some("image/png"), bytes).await;
        assert!(matches!(result, Err(UploadError::TooLarge)));
    }

    #[tokio::test]
    async fn staged_image_can_be_discarded() {
        let dir = std::env::temp_dir();
        let bytes = Bytes::from_static(b"not really a png");
        let staged = stage_image(&dir, "tiny.png", Some("image/png"), bytes)
            .await
            .unwrap();
        let public = staged.public_path.clone();
        assert!(public.starts_with("/uploads/events/"));
        staged.discard().await;
    }
}
