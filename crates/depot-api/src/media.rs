//! Cell payload storage on disk.
//!
//! Payloads live under `user_<uid>/storage_<sid>/<address>_<name>`
//! below the media root. The relative path is recorded in the metadata
//! store and doubles as the opaque locator handed to downloading
//! clients, so reads validate it before touching the filesystem.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("invalid cell path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: &Path) -> Result<Self, MediaError> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persists one cell payload, returning its relative locator path.
    pub async fn write_cell(
        &self,
        user_id: i64,
        storage_id: i64,
        address: u64,
        filename: &str,
        payload: &[u8],
    ) -> Result<String, MediaError> {
        let relative = format!(
            "user_{user_id}/storage_{storage_id}/{address}_{}",
            sanitize_filename(filename)
        );
        let full = self.root.join(&relative);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, payload).await?;
        Ok(relative)
    }

    /// Reads a cell payload by its relative locator.
    pub async fn read_cell(&self, relative: &str) -> Result<Bytes, MediaError> {
        let rel = Path::new(relative);
        let traverses = rel.components().any(|c| !matches!(c, Component::Normal(_)));
        if rel.is_absolute() || traverses {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }
        let data = tokio::fs::read(self.root.join(rel)).await?;
        Ok(Bytes::from(data))
    }
}

/// Sanitize a filename: strip path components, reject traversal attempts.
pub fn sanitize_filename(raw: &str) -> String {
    // Take only the final path component (handles both / and \ separators)
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    // Remove leading dots (no hidden files / no ".." tricks)
    let trimmed = base.trim_start_matches('.');

    // Replace any remaining problematic characters
    let clean: String = trimmed
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if clean.is_empty() {
        "cell".to_string()
    } else {
        clean
    }
}
