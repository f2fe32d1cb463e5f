//! File storage for document exports and signature images
//!
//! Files live under `<root>/exports` and `<root>/signatures` and are
//! served back under `/uploads`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

const EXPORTS_DIR: &str = "exports";
const SIGNATURES_DIR: &str = "signatures";

/// Public URL prefix the storage root is mounted at
pub const PUBLIC_PREFIX: &str = "uploads";

/// A file written to storage
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    /// Path relative to the server root, e.g. `uploads/exports/x.pdf`
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(EXPORTS_DIR)).await?;
        tokio::fs::create_dir_all(root.join(SIGNATURES_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an export named after `stem`.
    ///
    /// Names carry a timestamp and a random suffix, so concurrent exports
    /// of the same document never overwrite each other.
    pub async fn write_export(
        &self,
        stem: &str,
        extension: &str,
        bytes: &[u8],
    ) -> io::Result<StoredFile> {
        let filename = format!(
            "{}_{}_{}.{}",
            sanitize_filename(stem),
            Utc::now().format("%Y-%m-%d_%H-%M-%S"),
            unique_suffix(),
            extension
        );
        self.write(EXPORTS_DIR, filename, bytes).await
    }

    pub async fn write_signature(
        &self,
        document_id: i64,
        extension: &str,
        bytes: &[u8],
    ) -> io::Result<StoredFile> {
        let filename = format!(
            "signature_{}_{}_{}.{}",
            document_id,
            Utc::now().timestamp_millis(),
            unique_suffix(),
            extension
        );
        self.write(SIGNATURES_DIR, filename, bytes).await
    }

    async fn write(&self, dir: &str, filename: String, bytes: &[u8]) -> io::Result<StoredFile> {
        let path = self.root.join(dir).join(&filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        Ok(StoredFile {
            url: format!("{}/{}/{}", PUBLIC_PREFIX, dir, filename),
            filename,
        })
    }
}

/// Replace everything outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Office Order #12"), "Office_Order__12");
        assert_eq!(sanitize_filename("../../etc/passwd"), "______etc_passwd");
        assert_eq!(sanitize_filename("Año-2024_v1"), "A_o-2024_v1");
    }

    #[tokio::test]
    async fn test_exports_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();

        let first = storage.write_export("Leave", "pdf", b"one").await.unwrap();
        let second = storage.write_export("Leave", "pdf", b"two").await.unwrap();

        assert_ne!(first.filename, second.filename);
        assert!(first.url.starts_with("uploads/exports/Leave_"));
        let written = std::fs::read(dir.path().join("exports").join(&second.filename)).unwrap();
        assert_eq!(written, b"two");
    }

    #[tokio::test]
    async fn test_signature_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();

        let stored = storage.write_signature(42, "png", b"\x89PNG").await.unwrap();
        assert!(stored.filename.starts_with("signature_42_"));
        assert!(stored.filename.ends_with(".png"));
        assert!(dir.path().join("signatures").join(&stored.filename).exists());
    }

    proptest! {
        #[test]
        fn sanitized_names_are_safe(name in "\\PC{0,40}") {
            let clean = sanitize_filename(&name);
            prop_assert_eq!(clean.chars().count(), name.chars().count());
            prop_assert!(clean
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        }
    }
}
