//! Evaluator port.
//!
//! An evaluator receives a fully formatted review request and answers with
//! its raw response text. The response may be a structured verdict object
//! (possibly surrounded by commentary) or plain prose; turning it into a
//! [`Verdict`](crate::domain::models::Verdict) is the verdict parser's job,
//! not the evaluator's.

use async_trait::async_trait;

use crate::domain::errors::EvaluatorError;

/// A reviewer the orchestrator consults once per round.
///
/// Implementations must not retry internally on behalf of the orchestrator;
/// a failure is surfaced to the caller as-is.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Submit a review request and return the raw response text.
    async fn evaluate(&self, request: &str) -> Result<String, EvaluatorError>;
}
