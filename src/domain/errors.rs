//! Domain errors for the review loop.

use thiserror::Error;

use super::models::ReviewKind;
use super::ports::ChangeLogError;

/// Errors raised by an evaluator backend.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluator not available: {0}")]
    Unavailable(String),

    #[error("Evaluator request failed: {0}")]
    Request(String),

    #[error("Evaluator API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Evaluator returned an empty response")]
    EmptyResponse,

    #[error("Scripted evaluator has no responses left")]
    Exhausted,
}

/// Errors surfaced by the review orchestrator.
///
/// Exhausting the iteration cap is deliberately absent: that outcome is a
/// `needs_revision` verdict, not an error.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Invalid review input: {0}")]
    InvalidInput(String),

    #[error("Only staged review type is supported, requested type: {0}")]
    UnsupportedReviewKind(ReviewKind),

    #[error("Failed to perform code review: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Unknown review status: {0}")]
    UnknownVerdictStatus(String),

    #[error("Changes rejected by automated review, but rollback of revision {revision_id} failed. Feedback: {feedback}")]
    RollbackFailed {
        revision_id: String,
        feedback: String,
        #[source]
        source: ChangeLogError,
    },

    #[error("Change log error: {0}")]
    ChangeLog(#[from] ChangeLogError),
}

pub type ReviewResult<T> = Result<T, ReviewError>;
