//! Diagnostic screenshots.
//!
//! Whenever a session ends in a state nobody can vouch for (an unconfirmed
//! booking, an expired session, a failure) the page is captured so the user
//! can see what the site actually showed.

use std::path::{Path, PathBuf};

use chrono::Local;

/// Why a snapshot was taken. Determines the file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// Final page after a booking whose outcome could not be confirmed.
    Result,
    /// Page at the moment of a failure or fatal session error.
    Error,
}

impl SnapshotKind {
    fn prefix(self) -> &'static str {
        match self {
            SnapshotKind::Result => "booking_result",
            SnapshotKind::Error => "booking_error",
        }
    }
}

/// Error writing a snapshot.
#[derive(Debug, thiserror::Error)]
#[error("failed to write snapshot {path}: {source}")]
pub struct SnapshotError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Writes PNG snapshots into a directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `png` as `<prefix>-<timestamp>.png`, creating the directory if needed.
    pub async fn save(&self, kind: SnapshotKind, png: &[u8]) -> Result<PathBuf, SnapshotError> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
        let path = self.dir.join(format!("{}-{stamp}.png", kind.prefix()));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SnapshotError {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, png)
            .await
            .map_err(|source| SnapshotError {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new(".")
    }
}
