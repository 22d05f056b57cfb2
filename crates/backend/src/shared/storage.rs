//! Per-order document storage.
//!
//! Every repair order owns one folder named after its sanitized RO number.

use crate::shared::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

const UNNAMED_FOLDER: &str = "_unnamed";

/// Hex digits of the RO number hash appended to altered folder names
const FOLDER_HASH_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub file_name: String,
    pub size_bytes: u64,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Create the order's folder if missing; returns the folder name
    async fn ensure_folder(&self, ro_number: &str) -> AppResult<String>;

    async fn put(&self, ro_number: &str, file_name: &str, bytes: &[u8]) -> AppResult<StoredDocument>;

    async fn list(&self, ro_number: &str) -> AppResult<Vec<StoredDocument>>;
}

fn sanitize(raw: &str, keep_dot: bool) -> String {
    let replaced: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || (keep_dot && c == '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_matches('_');
    // "." and ".." would escape the folder
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        UNNAMED_FOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// RO number -> folder name limited to `[A-Za-z0-9_-]`.
///
/// When characters had to be replaced, a short hash of the RO number is
/// appended so "RO/100" and "RO 100" do not share a folder.
pub fn sanitize_folder_name(ro_number: &str) -> String {
    use sha2::{Digest, Sha256};

    let trimmed = ro_number.trim();
    let folder = sanitize(trimmed, false);
    if folder == trimmed || trimmed.is_empty() {
        return folder;
    }
    let digest = format!("{:x}", Sha256::digest(trimmed.as_bytes()));
    format!("{}_{}", folder, &digest[..FOLDER_HASH_LEN])
}

/// Same as folder names but keeps `.` for extensions
pub fn sanitize_file_name(file_name: &str) -> String {
    sanitize(file_name, true)
}

pub fn check_upload_size(len: u64, max_upload_bytes: u64) -> AppResult<()> {
    if len > max_upload_bytes {
        return Err(AppError::Validation(format!(
            "File is too large: {} bytes (limit {} bytes)",
            len, max_upload_bytes
        )));
    }
    Ok(())
}

/// Filesystem adapter rooted at a configured directory
pub struct LocalFileStorage {
    root: PathBuf,
    max_upload_bytes: u64,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    fn folder_path(&self, ro_number: &str) -> PathBuf {
        self.root.join(sanitize_folder_name(ro_number))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn ensure_folder(&self, ro_number: &str) -> AppResult<String> {
        let folder = sanitize_folder_name(ro_number);
        tokio::fs::create_dir_all(self.root.join(&folder))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create folder {}: {}", folder, e)))?;
        Ok(folder)
    }

    async fn put(&self, ro_number: &str, file_name: &str, bytes: &[u8]) -> AppResult<StoredDocument> {
        check_upload_size(bytes.len() as u64, self.max_upload_bytes)?;

        let folder = self.ensure_folder(ro_number).await?;
        let file_name = sanitize_file_name(file_name);
        let path = self.root.join(&folder).join(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write {}: {}", path.display(), e)))?;

        tracing::info!("Stored document {}/{} ({} bytes)", folder, file_name, bytes.len());

        Ok(StoredDocument {
            file_name,
            size_bytes: bytes.len() as u64,
        })
    }

    async fn list(&self, ro_number: &str) -> AppResult<Vec<StoredDocument>> {
        let dir = self.folder_path(ro_number);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        let mut documents = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Internal(e.into()))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            if meta.is_file() {
                documents.push(StoredDocument {
                    file_name: entry.file_name().to_string_lossy().into_owned(),
                    size_bytes: meta.len(),
                });
            }
        }
        documents.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_name_sanitization() {
        assert_eq!(sanitize_folder_name("RO-1001"), "RO-1001");
        assert_eq!(sanitize_folder_name(" RO-1001 "), "RO-1001");
        assert_eq!(sanitize_folder_name(" RO 1001/A "), "RO_1001_A_15713576");
        assert_eq!(sanitize_folder_name("../etc"), "etc_f7f9121f");
        assert_eq!(sanitize_folder_name("   "), "_unnamed");
        assert_eq!(sanitize_folder_name("///"), "_unnamed_732c4e97");
    }

    #[test]
    fn test_similar_ro_numbers_get_distinct_folders() {
        let folders = [
            sanitize_folder_name("RO/100"),
            sanitize_folder_name("RO 100"),
            sanitize_folder_name("RO_100"),
        ];
        assert_eq!(folders[0], "RO_100_6b6c83a6");
        assert_eq!(folders[1], "RO_100_ae43ad82");
        assert_eq!(folders[2], "RO_100");
    }

    #[test]
    fn test_file_name_keeps_extension() {
        assert_eq!(sanitize_file_name("quote #2.pdf"), "quote__2.pdf");
        assert_eq!(sanitize_file_name(".."), "_unnamed");
    }

    #[test]
    fn test_upload_limit() {
        assert!(check_upload_size(10, 10).is_ok());
        assert!(matches!(check_upload_size(11, 10), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_put_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), 1024);

        storage.put("RO 77", "teardown.pdf", b"%PDF-1.4").await.unwrap();
        storage.put("RO 77", "photo.jpg", b"jpeg").await.unwrap();

        let docs = storage.list("RO 77").await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["photo.jpg", "teardown.pdf"]);
        assert!(dir.path().join("RO_77_5118b0ac").is_dir());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), 4);

        let result = storage.put("RO-1", "big.bin", b"12345").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(storage.list("RO-1").await.unwrap().is_empty());
    }
}
