//! File snapshot change log.
//!
//! Records the pre-change contents of files under a revision id and restores
//! them on revert. A file that did not exist before the change is deleted on
//! revert. Snapshots live in memory for the life of the process.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::ports::{ChangeLog, ChangeLogError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeState {
    Active,
    Reverted,
}

#[derive(Debug, Clone)]
struct FileChange {
    path: PathBuf,
    /// Contents before the change; `None` if the file did not exist.
    original: Option<String>,
    state: ChangeState,
}

/// In-memory change log backed by file snapshots.
#[derive(Debug, Default)]
pub struct SnapshotChangeLog {
    revisions: RwLock<HashMap<String, Vec<FileChange>>>,
}

impl SnapshotChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file's pre-change contents under `revision_id`.
    pub async fn record(
        &self,
        revision_id: &str,
        path: impl Into<PathBuf>,
        original: Option<String>,
    ) {
        let path = path.into();
        debug!(
            revision_id,
            path = %path.display(),
            existed = original.is_some(),
            "recording change"
        );
        self.revisions
            .write()
            .await
            .entry(revision_id.to_string())
            .or_default()
            .push(FileChange {
                path,
                original,
                state: ChangeState::Active,
            });
    }

    /// Snapshot a file as it is on disk right now, before it gets modified.
    pub async fn snapshot_file(
        &self,
        revision_id: &str,
        path: &Path,
    ) -> Result<(), ChangeLogError> {
        let original = match tokio::fs::read_to_string(path).await {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => {
                return Err(ChangeLogError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        self.record(revision_id, path, original).await;
        Ok(())
    }

    /// Number of changes under a revision that have not been reverted.
    pub async fn active_count(&self, revision_id: &str) -> usize {
        let revisions = self.revisions.read().await;
        revisions.get(revision_id).map_or(0, |changes| {
            changes
                .iter()
                .filter(|c| c.state == ChangeState::Active)
                .count()
        })
    }
}

async fn restore(change: &FileChange) -> Result<(), ChangeLogError> {
    let result = match &change.original {
        Some(contents) => tokio::fs::write(&change.path, contents).await,
        None => match tokio::fs::remove_file(&change.path).await {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        },
    };

    result.map_err(|source| ChangeLogError::Io {
        path: change.path.clone(),
        source,
    })
}

#[async_trait]
impl ChangeLog for SnapshotChangeLog {
    async fn has_active_change(&self, revision_id: &str) -> Result<bool, ChangeLogError> {
        Ok(self.active_count(revision_id).await > 0)
    }

    async fn revert(&self, revision_id: &str) -> Result<(), ChangeLogError> {
        let mut revisions = self.revisions.write().await;
        let changes = revisions
            .get_mut(revision_id)
            .ok_or_else(|| ChangeLogError::RevisionNotFound(revision_id.to_string()))?;

        if !changes.iter().any(|c| c.state == ChangeState::Active) {
            return Err(ChangeLogError::NoActiveChanges(revision_id.to_string()));
        }

        // Newest first, so a file changed twice ends at its oldest snapshot.
        for change in changes.iter_mut().rev() {
            if change.state != ChangeState::Active {
                continue;
            }
            restore(change).await?;
            change.state = ChangeState::Reverted;
        }

        info!(revision_id, "revision reverted");
        Ok(())
    }
}
