use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Public URL prefix the upload directory is served under
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Disk-backed object store for compressed images
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

    /// Write a JPEG under the owner's folder and return its public path
    pub async fn store_jpeg(&self, owner_id: &str, bytes: &[u8]) -> Result<String> {
        let folder = sanitize_segment(owner_id);
        let file_name = format!("{}.jpg", Uuid::new_v4());
        let dir = self.root.join(&folder);

        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;

        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(format!("{}/{}/{}", UPLOADS_URL_PREFIX, folder, file_name))
    }
}

/// Keep only characters that are safe in a single path segment
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
