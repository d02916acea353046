//! Review requests: the context under review and the options governing it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::history::ReviewHistory;

/// Kind of review being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    /// Review of staged changes. The only supported kind.
    #[default]
    Staged,
    /// Automated fix-and-retry review. Recognized but not supported.
    Automated,
}

impl fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staged => f.write_str("staged"),
            Self::Automated => f.write_str("automated"),
        }
    }
}

/// Options for a single review call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewOptions {
    pub kind: ReviewKind,
    pub skip_prompt: bool,
    /// Review happens before the change is applied. Unless `skip_prompt` is
    /// also set, non-approved verdicts are advisory: returned unchanged with
    /// no rollback and no fallback substitution.
    pub pre_apply: bool,
    pub rollback_on_reject: bool,
}

impl ReviewOptions {
    pub fn staged() -> Self {
        Self::default()
    }

    pub fn with_rollback_on_reject(mut self) -> Self {
        self.rollback_on_reject = true;
        self
    }

    pub fn pre_apply(mut self) -> Self {
        self.pre_apply = true;
        self
    }

    /// Whether non-approved verdicts should be passed through untouched.
    pub fn is_advisory(&self) -> bool {
        self.pre_apply && !self.skip_prompt
    }
}

/// Free-form metadata used only to enrich the outbound request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewMetadata {
    pub project_type: Option<String>,
    pub commit_message: Option<String>,
    pub key_comments: Option<String>,
    pub change_categories: Option<String>,
}

/// The unit of work for one review call.
#[derive(Debug, Clone, Default)]
pub struct ReviewContext {
    pub diff: String,
    pub original_prompt: String,
    pub processed_instructions: Option<String>,
    /// Token correlating this review to a revertible change.
    pub revision_id: Option<String>,
    pub session_id: Option<String>,
    pub current_iteration: u32,
    pub full_file_context: Option<String>,
    pub related_files: Vec<String>,
    pub metadata: ReviewMetadata,
    /// Owned history; created by the orchestrator on first use.
    pub history: Option<ReviewHistory>,
}

impl ReviewContext {
    pub fn new(diff: impl Into<String>) -> Self {
        Self {
            diff: diff.into(),
            ..Self::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.original_prompt = prompt.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.processed_instructions = Some(instructions.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_revision_id(mut self, revision_id: impl Into<String>) -> Self {
        self.revision_id = Some(revision_id.into());
        self
    }

    pub fn with_file_context(mut self, context: impl Into<String>) -> Self {
        self.full_file_context = Some(context.into());
        self
    }

    pub fn with_related_files(mut self, files: Vec<String>) -> Self {
        self.related_files = files;
        self
    }

    pub fn with_metadata(mut self, metadata: ReviewMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Session id, if one is set and non-empty.
    pub fn session_key(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Revision id, if one is set and non-empty.
    pub fn revision_key(&self) -> Option<&str> {
        self.revision_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Overwrite the mutable request fields with those of a newer request for
    /// the same session. History, related files, and metadata are kept.
    pub fn merge_request(&mut self, incoming: Self) {
        self.diff = incoming.diff;
        self.original_prompt = incoming.original_prompt;
        self.processed_instructions = incoming.processed_instructions;
        self.revision_id = incoming.revision_id;
        self.current_iteration = incoming.current_iteration;
        self.full_file_context = incoming.full_file_context;
    }
}
