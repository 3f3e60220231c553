//! Filesystem-backed storage for uploaded item images.
//!
//! Files are addressed by a generated key: a random 12-character
//! alphanumeric prefix joined to the original filename. Uniqueness relies
//! on the randomness of the prefix; there is no locking.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

const PREFIX_LEN: usize = 12;
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid media key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Whether an upload with this filename is acceptable. Only the
    /// substring after the last dot is examined, compared lower-cased.
    pub fn accepts(filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                ALLOWED_EXTENSIONS.contains(&ext.as_str())
            }
            None => false,
        }
    }

    /// Store uploaded bytes under a fresh generated key and return it.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let key = format!("{}_{}", random_prefix(), sanitize(original_name));
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&key), bytes).await?;
        Ok(key)
    }

    /// Delete a stored file. A missing file is an error here; cascade
    /// steps that tolerate missing files use [`remove_quiet`].
    ///
    /// [`remove_quiet`]: MediaStore::remove_quiet
    pub async fn remove(&self, key: &str) -> Result<(), MediaError> {
        tokio::fs::remove_file(self.path_for(key)?).await?;
        Ok(())
    }

    /// Delete a stored file, treating a missing file as already removed.
    pub async fn remove_quiet(&self, key: &str) {
        match self.path_for(key) {
            Ok(path) => {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove media file {}: {}", key, e);
                    }
                }
            }
            Err(e) => warn!("Skipping removal of malformed media key: {}", e),
        }
    }

    /// Read a stored file back (used by the media-serving endpoint).
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, MediaError> {
        Ok(tokio::fs::read(self.path_for(key)?).await?)
    }

    /// Resolve a key to its path, rejecting anything that could escape
    /// the media root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, MediaError> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(MediaError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn random_prefix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PREFIX_LEN)
        .map(char::from)
        .collect()
}

/// Strip any path components a browser might have left in the filename.
fn sanitize(original: &str) -> String {
    original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .replace("..", "")
}
