//! Null change log implementation.
//!
//! Used when the caller has no revertible change tracking but the type system
//! requires a ChangeLog implementation.

use async_trait::async_trait;

use super::{ChangeLog, ChangeLogError};

/// A change log that never has anything to revert.
#[derive(Debug, Clone, Default)]
pub struct NullChangeLog;

impl NullChangeLog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChangeLog for NullChangeLog {
    async fn has_active_change(&self, _revision_id: &str) -> Result<bool, ChangeLogError> {
        Ok(false)
    }

    async fn revert(&self, revision_id: &str) -> Result<(), ChangeLogError> {
        Err(ChangeLogError::RevisionNotFound(revision_id.to_string()))
    }
}
