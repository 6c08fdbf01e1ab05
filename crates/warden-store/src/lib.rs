//! # warden-store
//!
//! Gateway to the credential directory. The external client owns the files
//! inside; this crate only creates, counts, and purges the directory —
//! never parses or writes its contents.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use warden_core::error::WardenError;
use warden_core::session::{Session, SessionSummary};

/// Aggregate view of the credential directory.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreSummary {
    pub file_count: u64,
    pub total_bytes: u64,
}

/// Path-addressed handle to the credential directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory if missing. Idempotent.
    pub fn ensure(&self) -> Result<(), WardenError> {
        std::fs::create_dir_all(&self.path)
            .map_err(|e| WardenError::Store(format!("create {}: {e}", self.path.display())))?;
        Ok(())
    }

    /// Count files and bytes under the directory. Fails soft: any
    /// unreadable entry (or a missing directory) yields an empty summary.
    pub fn inspect(&self) -> StoreSummary {
        let mut summary = StoreSummary::default();
        if walk(&self.path, &mut summary).is_err() {
            debug!("session store unreadable at {}", self.path.display());
            return StoreSummary::default();
        }
        summary
    }

    /// Remove the directory and everything in it.
    ///
    /// The browser process can hold locks slightly past its own shutdown
    /// signal, so a busy file is retried up to `retries` times with a fixed
    /// delay before the failure surfaces. A missing directory is success.
    pub async fn purge(&self, retries: u32, backoff: Duration) -> Result<(), WardenError> {
        self.purge_with(retries, backoff, || std::fs::remove_dir_all(&self.path))
            .await
    }

    /// Purge loop with an injectable remover, so the retry budget is
    /// exercisable in tests without a genuinely locked file.
    async fn purge_with<F>(
        &self,
        retries: u32,
        backoff: Duration,
        mut remove: F,
    ) -> Result<(), WardenError>
    where
        F: FnMut() -> io::Result<()>,
    {
        let mut remaining = retries;
        loop {
            match remove() {
                Ok(()) => {
                    info!("credential directory purged: {}", self.path.display());
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) if is_busy(&e) && remaining > 0 => {
                    warn!(
                        "credential purge hit a busy file, retrying in {:?} ({} left): {e}",
                        backoff, remaining
                    );
                    remaining -= 1;
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    return Err(WardenError::Store(format!(
                        "purge {}: {e}",
                        self.path.display()
                    )));
                }
            }
        }
    }

    /// Assemble the read-only summary the presentation layer consumes.
    pub fn summarize(&self, session: &Session) -> SessionSummary {
        let store = self.inspect();
        SessionSummary {
            has_session: store.file_count > 0,
            file_count: store.file_count,
            connected_since: session.connected_since(),
        }
    }
}

/// EBUSY / ETXTBSY, plus the Windows sharing-violation message shape.
fn is_busy(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(16) | Some(26) | Some(32))
        || e.to_string().to_lowercase().contains("resource busy")
}

fn walk(dir: &Path, summary: &mut StoreSummary) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            walk(&entry.path(), summary)?;
        } else {
            summary.file_count += 1;
            summary.total_bytes += meta.len();
        }
    }
    Ok(())
}
