//! Ephemeral, request-scoped working directory for render inputs/outputs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use uuid::Uuid;

const CLEANUP_ATTEMPTS: u32 = 5;
const CLEANUP_BACKOFF: Duration = Duration::from_millis(200);

/// Uniquely named directory owned by exactly one render request from
/// creation to deletion.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub async fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("render-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&path)
            .await
            .with_context(|| format!("failed to create working directory {}", path.display()))?;
        debug!("Created working directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort removal with bounded retries.
    ///
    /// A child process can briefly hold a file handle after exit, which makes
    /// the first removal fail with "directory not empty". The final outcome
    /// is logged but never escalated into the request's response.
    pub async fn cleanup(self) {
        for attempt in 1..=CLEANUP_ATTEMPTS {
            match tokio::fs::remove_dir_all(&self.path).await {
                Ok(()) => {
                    debug!("Removed working directory {}", self.path.display());
                    return;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
                Err(e) => {
                    if attempt == CLEANUP_ATTEMPTS {
                        warn!(
                            "Giving up on cleanup of {} after {} attempts: {e}",
                            self.path.display(),
                            CLEANUP_ATTEMPTS
                        );
                        return;
                    }
                    tokio::time::sleep(CLEANUP_BACKOFF).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_cleanup() {
        let dir = WorkDir::create().await.unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());

        tokio::fs::write(path.join("resume.tex"), "x").await.unwrap();
        dir.cleanup().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_of_already_removed_dir_is_silent() {
        let dir = WorkDir::create().await.unwrap();
        tokio::fs::remove_dir_all(dir.path()).await.unwrap();
        dir.cleanup().await; // must not panic or loop
    }

    #[tokio::test]
    async fn test_two_workdirs_never_collide() {
        let a = WorkDir::create().await.unwrap();
        let b = WorkDir::create().await.unwrap();
        assert_ne!(a.path(), b.path());
        a.cleanup().await;
        b.cleanup().await;
    }
}
