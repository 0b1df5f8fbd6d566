//! On-disk storage for uploaded PDFs
//!
//! Files live at `{dir}/user_{id}/{uuid}_{name}` so uploads with the same name
//! never collide.

use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Keep ASCII letters, digits, dots, dashes and underscores from a client
/// supplied file name
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` for `user_id`, returning the stored path
    pub async fn save(
        &self,
        user_id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> std::io::Result<PathBuf> {
        let dir = self.root.join(format!("user_{}", user_id));
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}_{}", Uuid::new_v4(), sanitize_file_name(file_name)));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Remove a stored file; a missing file is not an error
    pub async fn remove(&self, path: &str) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove stored file {}: {}", path, e),
        }
    }
}
