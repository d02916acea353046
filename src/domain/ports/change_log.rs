//! Revertible change log port (rollback collaborator).

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Change log operation errors
#[derive(Debug, Error)]
pub enum ChangeLogError {
    #[error("Revision ID '{0}' not found")]
    RevisionNotFound(String),

    #[error("No active changes found for revision ID '{0}' to revert")]
    NoActiveChanges(String),

    #[error("Failed to restore {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tracks applied changes by revision id so a rejected change can be undone.
#[async_trait]
pub trait ChangeLog: Send + Sync {
    /// Whether the revision exists and still has changes that were not reverted.
    async fn has_active_change(&self, revision_id: &str) -> Result<bool, ChangeLogError>;

    /// Revert every active change recorded under the revision.
    ///
    /// # Errors
    /// Returns error if:
    /// - The revision is unknown
    /// - The revision has no active changes
    /// - Restoring a file fails
    async fn revert(&self, revision_id: &str) -> Result<(), ChangeLogError>;
}
