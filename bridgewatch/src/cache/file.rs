//! Filesystem-backed completion cache.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{completion_key, CompletionCache, COMPLETED_VALUE};
use crate::errors::BridgeError;

/// Completion cache storing one file per key under a directory.
///
/// Writes go to a uniquely named temp file that is then renamed over the
/// key, so readers never observe a half-written value.
#[derive(Debug, Clone)]
pub struct FileCompletionCache {
    dir: PathBuf,
}

impl FileCompletionCache {
    /// Creates a cache rooted at `dir`. The directory is created lazily.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, token_address: &str) -> Result<PathBuf, BridgeError> {
        if token_address.is_empty()
            || token_address.contains(&['/', '\\'][..])
            || token_address.contains("..")
        {
            return Err(BridgeError::Config(format!(
                "token address '{token_address}' cannot be used as a cache key"
            )));
        }
        Ok(self.dir.join(completion_key(token_address)))
    }
}

#[async_trait]
impl CompletionCache for FileCompletionCache {
    async fn has(&self, token_address: &str) -> Result<bool, BridgeError> {
        let path = self.key_path(token_address)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(value.trim() == COMPLETED_VALUE),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BridgeError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn mark_complete(&self, token_address: &str) -> Result<(), BridgeError> {
        let path = self.key_path(token_address)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self
            .dir
            .join(format!(".{}.{}", completion_key(token_address), uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, COMPLETED_VALUE).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(BridgeError::Storage(format!(
                "failed to store {}: {e}",
                path.display()
            )));
        }

        debug!(path = %path.display(), "Stored completion flag");
        Ok(())
    }
}
