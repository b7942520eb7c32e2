//! Deletion of delivered report artifacts
//!
//! Hosts sometimes hold a file open for a moment after an upload, which shows
//! up as a permission error. Those are retried; everything else is not.

use crate::config::CleanupSettings;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Removes one file
#[async_trait]
pub trait FileRemover: Send + Sync {
    async fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes files with `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

#[async_trait]
impl FileRemover for FsRemover {
    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}

/// Deletes files with bounded retry on transient permission errors
#[derive(Clone)]
pub struct RetryingFileCleaner {
    remover: Arc<dyn FileRemover>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RetryingFileCleaner {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            remover: Arc::new(FsRemover),
            max_attempts,
            retry_delay,
        }
    }

    pub fn from_settings(settings: &CleanupSettings) -> Self {
        Self::new(settings.max_attempts, settings.retry_delay())
    }

    /// Use a different remover (tests, remote storage)
    pub fn with_remover(mut self, remover: Arc<dyn FileRemover>) -> Self {
        self.remover = remover;
        self
    }

    /// Delete `path`. Returns true only if this call removed the file.
    ///
    /// A missing file returns false straight away. Never fails.
    pub async fn delete(&self, path: &Path) -> bool {
        let mut attempt = 0;
        while attempt < self.max_attempts {
            attempt += 1;
            match self.remover.remove(path).await {
                Ok(()) => {
                    debug!("Deleted {} on attempt {}", path.display(), attempt);
                    return true;
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    warn!(
                        "PermissionError when trying to delete file {}. Retrying... Attempt {}/{}",
                        path.display(),
                        attempt,
                        self.max_attempts
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(
                        "File {} not found. It may have already been deleted.",
                        path.display()
                    );
                    return false;
                }
                Err(e) => {
                    error!(
                        "Failed to delete file {} on attempt {}: {}",
                        path.display(),
                        attempt,
                        e
                    );
                    break;
                }
            }
        }

        error!(
            "Could not delete file {} after {} attempts.",
            path.display(),
            attempt
        );
        false
    }
}

impl Default for RetryingFileCleaner {
    fn default() -> Self {
        Self::from_settings(&CleanupSettings::default())
    }
}
