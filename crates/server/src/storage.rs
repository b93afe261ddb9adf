//! Local image storage.
//!
//! Uploaded shop and product images are written under the configured upload
//! directory as `<owner_id>/<shops|products>/<uuid>.<ext>`. That relative key
//! is what the database stores as `image_path`, and `/images/<key>` serves it.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use mobile_order_core::OwnerId;

use crate::config::UploadConfig;

/// Errors from storing or removing images.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The upload is not one of the accepted image types.
    #[error("unsupported image type: {0}")]
    UnsupportedContentType(String),

    /// The upload has no content.
    #[error("image is empty")]
    Empty,

    /// The upload exceeds the configured limit.
    #[error("image is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    /// A stored key would resolve outside the upload directory.
    #[error("invalid image key: {0}")]
    InvalidKey(String),

    /// Filesystem error.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What an image belongs to; decides the key's folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Shop,
    Product,
}

impl ImageKind {
    const fn folder(self) -> &'static str {
        match self {
            Self::Shop => "shops",
            Self::Product => "products",
        }
    }
}

/// Accepted content types, their file extension and leading magic bytes.
const FORMATS: &[(&str, &str, &[u8])] = &[
    ("image/jpeg", "jpg", b"\xFF\xD8\xFF"),
    ("image/png", "png", b"\x89PNG\r\n\x1A\n"),
    ("image/gif", "gif", b"GIF8"),
    ("image/webp", "webp", b"RIFF"),
];

/// Filesystem-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Create a store from the upload configuration.
    #[must_use]
    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.dir.clone(), config.max_bytes)
    }

    /// Directory served under `/images`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Largest accepted image in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate and write an image, returning its key.
    ///
    /// # Errors
    ///
    /// Returns `Empty`, `TooLarge` or `UnsupportedContentType` for bad
    /// uploads (including content that does not match the declared type), and
    /// `Io` if the file cannot be written.
    pub async fn save(
        &self,
        owner_id: OwnerId,
        kind: ImageKind,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }
        let extension = extension_for(content_type, bytes)?;

        let key = format!("{owner_id}/{}/{}.{extension}", kind.folder(), Uuid::new_v4());
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(owner_id = %owner_id, key = %key, size = bytes.len(), "Image stored");
        Ok(key)
    }

    /// Delete a stored image. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for keys that escape the store and `Io` for other
    /// filesystem failures.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a replaced or orphaned image, logging instead of failing.
    pub async fn discard(&self, key: &str) {
        if let Err(e) = self.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove image");
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Map a declared content type to a file extension, checking the bytes agree.
fn extension_for(content_type: &str, bytes: &[u8]) -> Result<&'static str, StorageError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let (_, extension, magic) = FORMATS
        .iter()
        .find(|(mime, _, _)| *mime == essence)
        .ok_or_else(|| StorageError::UnsupportedContentType(content_type.to_string()))?;

    let webp_ok = essence != "image/webp" || bytes.get(8..12) == Some(b"WEBP".as_slice());
    if !bytes.starts_with(magic) || !webp_ok {
        return Err(StorageError::UnsupportedContentType(format!(
            "{essence} (content does not match)"
        )));
    }
    Ok(extension)
}

/// A key must be a relative path of plain components.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let path = Path::new(key);
    let plain = !key.is_empty()
        && !key.contains('\\')
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1A\n\0\0\0\rIHDR";
    const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for("image/png", PNG).unwrap(), "png");
        assert_eq!(extension_for("IMAGE/PNG; charset=binary", PNG).unwrap(), "png");
        assert_eq!(extension_for("image/webp", WEBP).unwrap(), "webp");
        assert_eq!(
            extension_for("image/jpeg", b"\xFF\xD8\xFF\xE0rest").unwrap(),
            "jpg"
        );
    }

    #[test]
    fn test_extension_for_rejects_mismatch_and_unknown() {
        assert!(matches!(
            extension_for("image/jpeg", PNG),
            Err(StorageError::UnsupportedContentType(_))
        ));
        assert!(matches!(
            extension_for("image/webp", b"RIFF\0\0\0\0WAVEfmt "),
            Err(StorageError::UnsupportedContentType(_))
        ));
        assert!(matches!(
            extension_for("application/pdf", b"%PDF-1.7"),
            Err(StorageError::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("1/products/abc.png").is_ok());
        for key in ["", "../etc/passwd", "/etc/passwd", "1/../../x", "1\\x.png", "./1/x.png"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "{key:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), 1024);

        let key = store
            .save(OwnerId::new(7), ImageKind::Product, "image/png", PNG)
            .await
            .unwrap();
        assert!(key.starts_with("7/products/"));
        assert!(key.ends_with(".png"));
        assert_eq!(std::fs::read(dir.path().join(&key)).unwrap(), PNG);

        store.delete(&key).await.unwrap();
        assert!(!dir.path().join(&key).exists());
        // second delete is a no-op
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), 8);

        assert!(matches!(
            store.save(OwnerId::new(1), ImageKind::Shop, "image/png", b"").await,
            Err(StorageError::Empty)
        ));
        assert!(matches!(
            store.save(OwnerId::new(1), ImageKind::Shop, "image/png", PNG).await,
            Err(StorageError::TooLarge { max: 8, .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_refuses_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), 1024);
        assert!(matches!(
            store.delete("../outside.png").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
