//! Review orchestrator service.
//!
//! The `ReviewOrchestrator` runs one review round per call:
//!
//! - **VALIDATE** -- Reject empty diffs and unsupported review kinds before
//!   touching any state.
//! - **LOAD** -- Check out the session slot and merge the incoming request
//!   into the stored context, creating a history on first use.
//! - **GUARD** -- Short-circuit with a fallback verdict at the iteration cap,
//!   or with the latest verdict once feedback has converged.
//! - **EVALUATE** -- Format the request, consult the evaluator, parse and
//!   record the verdict.
//! - **ROUTE** -- Map the verdict to an outcome: accept, continue, or roll
//!   back a rejected change.
//!
//! The session slot stays checked out for the whole round, so concurrent
//! calls for the same session are applied one after the other.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{ReviewError, ReviewResult};
use crate::domain::models::{
    FinalStatus, ReviewConfiguration, ReviewContext, ReviewHistory, ReviewKind, ReviewOptions,
    Verdict, VerdictStatus,
};
use crate::domain::ports::{ChangeLog, Evaluator, RequestFormatter};
use crate::services::convergence_detector::ConvergenceDetector;
use crate::services::fingerprint::{fingerprint, generate_session_id};
use crate::services::iteration_limiter::IterationLimiter;
use crate::services::request_builder::MarkdownRequestBuilder;
use crate::services::session_store::SessionStore;
use crate::services::verdict_parser::parse_response;

/// Feedback returned when a converged history has no iterations to fall back on.
pub const CONVERGED_WITHOUT_RESULT: &str =
    "Review process converged but no valid result found. Manual review required.";

/// Sequences evaluator calls for review sessions.
///
/// Generic over its evaluator and change log so tests and the CLI can plug
/// in scripted or null implementations.
pub struct ReviewOrchestrator<E: Evaluator, C: ChangeLog> {
    evaluator: Arc<E>,
    change_log: Arc<C>,
    sessions: Arc<SessionStore>,
    formatter: Box<dyn RequestFormatter>,
    config: ReviewConfiguration,
    limiter: IterationLimiter,
    detector: ConvergenceDetector,
}

impl<E: Evaluator, C: ChangeLog> ReviewOrchestrator<E, C> {
    /// Create an orchestrator using the markdown request builder.
    pub fn new(
        evaluator: Arc<E>,
        change_log: Arc<C>,
        config: ReviewConfiguration,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            evaluator,
            change_log,
            sessions,
            formatter: Box::new(MarkdownRequestBuilder::new()),
            limiter: IterationLimiter::from_config(&config),
            detector: ConvergenceDetector::from_config(&config),
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Snapshot of a session's history, if the session is stored.
    pub async fn history(&self, session_id: &str) -> Option<ReviewHistory> {
        self.sessions
            .load(session_id)
            .await
            .and_then(|context| context.history)
    }

    /// Run one review round for `context`.
    ///
    /// Contexts carrying a session id accumulate history across calls; other
    /// contexts get a one-off history that is discarded afterwards.
    ///
    /// # Errors
    /// Returns error if:
    /// - The diff is empty or the review kind is unsupported
    /// - The evaluator fails
    /// - The evaluator answers with an unknown verdict status
    /// - A rejected change cannot be rolled back
    #[instrument(
        skip(self, context, options),
        fields(session_id = context.session_key().unwrap_or_default(), kind = %options.kind),
        err
    )]
    pub async fn perform_review(
        &self,
        context: ReviewContext,
        options: &ReviewOptions,
    ) -> ReviewResult<Verdict> {
        validate(&context, options)?;

        let Some(session_id) = context.session_key().map(str::to_string) else {
            let mut context = context;
            return self.run_round(&mut context, options).await;
        };

        // The round works on a copy; the slot keeps the stored context until
        // the round completes, so a dropped call leaves the session intact.
        let mut guard = self.sessions.checkout(&session_id).await;
        let stored = guard.context().cloned();
        let was_stored = stored.is_some();
        let mut current = match stored {
            Some(mut existing) => {
                existing.merge_request(context);
                existing
            }
            None => context,
        };

        let rounds_before = recorded_rounds(&current);
        let outcome = self.run_round(&mut current, options).await;
        let recorded = recorded_rounds(&current) > rounds_before;

        if was_stored || recorded {
            guard.put(current);
        }
        self.sessions.release(guard).await;

        outcome
    }

    async fn run_round(
        &self,
        context: &mut ReviewContext,
        options: &ReviewOptions,
    ) -> ReviewResult<Verdict> {
        {
            let history = ensure_history(context);

            if self.limiter.has_exceeded(history) {
                info!(
                    iterations = history.len(),
                    max_iterations = self.limiter.max_iterations(),
                    "Review iteration limit exceeded; applying fallback"
                );
                return Ok(self.limiter.fallback(history));
            }

            if self.config.enable_convergence_detection && self.detector.has_converged(history) {
                info!(
                    threshold = self.detector.threshold(),
                    "Review process has converged; similar feedback detected in recent iterations"
                );
                return Ok(conclude_converged(history));
            }
        }

        let request = self.formatter.format(context);
        debug!(
            evaluator = self.evaluator.name(),
            request_len = request.len(),
            "requesting review"
        );
        let response = self.evaluator.evaluate(&request).await?;
        let verdict = parse_response(&response).into_verdict()?;

        let content_hash = fingerprint(&context.diff);
        let diff = context.diff.clone();
        let history = ensure_history(context);
        let number = history.record(diff, content_hash, verdict.clone());
        context.current_iteration = number;
        info!(iteration = number, status = %verdict.status, "review iteration recorded");

        self.route(verdict, context, options).await
    }

    async fn route(
        &self,
        verdict: Verdict,
        context: &mut ReviewContext,
        options: &ReviewOptions,
    ) -> ReviewResult<Verdict> {
        match verdict.status {
            VerdictStatus::Approved => {
                ensure_history(context).conclude(FinalStatus::Approved);
                Ok(verdict)
            }
            VerdictStatus::NeedsRevision => {
                Ok(self.handle_needs_revision(verdict, context, options))
            }
            VerdictStatus::Rejected => self.handle_rejected(verdict, context, options).await,
        }
    }

    fn handle_needs_revision(
        &self,
        verdict: Verdict,
        context: &mut ReviewContext,
        options: &ReviewOptions,
    ) -> Verdict {
        if options.is_advisory() {
            return verdict;
        }

        let last_round = self.config.max_iterations.saturating_sub(1);
        if context.current_iteration >= last_round {
            if let Some(approved) = ensure_history(context).most_recent_approved() {
                info!(
                    iteration = approved.number,
                    "final round still needs revision; returning earlier approved verdict"
                );
                return approved.verdict.clone();
            }
        }

        verdict
    }

    async fn handle_rejected(
        &self,
        verdict: Verdict,
        context: &mut ReviewContext,
        options: &ReviewOptions,
    ) -> ReviewResult<Verdict> {
        if options.is_advisory() {
            return Ok(verdict);
        }

        if options.rollback_on_reject {
            if let Some(revision_id) = context.revision_key() {
                if self.change_log.has_active_change(revision_id).await? {
                    if let Err(source) = self.change_log.revert(revision_id).await {
                        warn!(revision_id, error = %source, "rollback of rejected change failed");
                        return Err(ReviewError::RollbackFailed {
                            revision_id: revision_id.to_string(),
                            feedback: verdict.feedback,
                            source,
                        });
                    }
                    info!(revision_id, "rolled back rejected change");
                } else {
                    info!(
                        revision_id,
                        "No active changes recorded for this revision; skipping rollback"
                    );
                }
            }
        }

        ensure_history(context).conclude(FinalStatus::Rejected);
        Ok(verdict)
    }
}

fn validate(context: &ReviewContext, options: &ReviewOptions) -> ReviewResult<()> {
    if context.diff.trim().is_empty() {
        return Err(ReviewError::InvalidInput(
            "no diff content provided for review".to_string(),
        ));
    }
    if options.kind != ReviewKind::Staged {
        return Err(ReviewError::UnsupportedReviewKind(options.kind));
    }
    Ok(())
}

/// The context's history, created on first use.
///
/// A new history takes the caller's session id, so the history recorded for
/// a named session is the one [`ReviewOrchestrator::history`] returns for
/// that id. Only anonymous contexts get an id generated from the prompt,
/// the diff, and the current time.
fn ensure_history(context: &mut ReviewContext) -> &mut ReviewHistory {
    let ReviewContext {
        history,
        session_id,
        original_prompt,
        diff,
        ..
    } = context;

    history.get_or_insert_with(|| {
        let id = session_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map_or_else(
                || generate_session_id(original_prompt, diff),
                str::to_string,
            );
        ReviewHistory::new(id, original_prompt.clone(), diff.clone())
    })
}

fn recorded_rounds(context: &ReviewContext) -> usize {
    context.history.as_ref().map_or(0, ReviewHistory::len)
}

fn conclude_converged(history: &mut ReviewHistory) -> Verdict {
    let verdict = history.latest().map_or_else(
        || Verdict::needs_revision(CONVERGED_WITHOUT_RESULT),
        |iteration| iteration.verdict.clone(),
    );
    history.conclude(FinalStatus::Converged);
    verdict
}
