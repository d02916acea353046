//! Iteration cap and the fallback verdict used once it is hit.

use tracing::warn;

use crate::domain::models::{FinalStatus, ReviewConfiguration, ReviewHistory, Verdict};

/// Enforces the per-session iteration cap.
#[derive(Debug, Clone, Copy)]
pub struct IterationLimiter {
    max_iterations: u32,
}

impl IterationLimiter {
    pub const fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    pub const fn from_config(config: &ReviewConfiguration) -> Self {
        Self::new(config.max_iterations)
    }

    pub const fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// True once the history holds at least `max_iterations` rounds.
    pub fn has_exceeded(&self, history: &ReviewHistory) -> bool {
        u32::try_from(history.len()).map_or(true, |len| len >= self.max_iterations)
    }

    /// Best available verdict once the cap is hit.
    ///
    /// Prefers the newest approved verdict in the history; otherwise
    /// synthesizes a `needs_revision` asking for manual intervention. The
    /// history is concluded as [`FinalStatus::Fallback`] either way.
    pub fn fallback(&self, history: &mut ReviewHistory) -> Verdict {
        let verdict = history
            .most_recent_approved()
            .map(|iteration| iteration.verdict.clone())
            .unwrap_or_else(|| {
                warn!(
                    session_id = %history.session_id,
                    max_iterations = self.max_iterations,
                    "iteration cap reached without an approved verdict"
                );
                Verdict::needs_revision(format!(
                    "Review process exceeded maximum iterations ({}). \
                     Manual intervention required. Consider simplifying the \
                     original request or breaking it into smaller parts.",
                    self.max_iterations
                ))
            });

        history.conclude(FinalStatus::Fallback);
        verdict
    }
}

impl Default for IterationLimiter {
    fn default() -> Self {
        Self::from_config(&ReviewConfiguration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::VerdictStatus;

    fn history_of(verdicts: Vec<Verdict>) -> ReviewHistory {
        let mut history = ReviewHistory::new("s-1", "prompt", "diff");
        for (i, verdict) in verdicts.into_iter().enumerate() {
            history.record(format!("diff {i}"), format!("h{i}"), verdict);
        }
        history
    }

    #[test]
    fn test_has_exceeded_at_cap() {
        let limiter = IterationLimiter::new(3);
        let history = history_of(vec![Verdict::needs_revision("a"); 2]);
        assert!(!limiter.has_exceeded(&history));

        let history = history_of(vec![Verdict::needs_revision("a"); 3]);
        assert!(limiter.has_exceeded(&history));
    }

    #[test]
    fn test_zero_cap_is_always_exceeded() {
        let limiter = IterationLimiter::new(0);
        assert!(limiter.has_exceeded(&history_of(Vec::new())));
    }

    #[test]
    fn test_fallback_prefers_most_recent_approved() {
        let limiter = IterationLimiter::new(3);
        let mut history = history_of(vec![
            Verdict::approved("first looks good"),
            Verdict::approved("second looks good"),
            Verdict::needs_revision("nit"),
        ]);

        let verdict = limiter.fallback(&mut history);
        assert_eq!(verdict.status, VerdictStatus::Approved);
        assert_eq!(verdict.feedback, "second looks good");
        assert!(history.is_converged());
        assert_eq!(history.final_status(), FinalStatus::Fallback);
    }

    #[test]
    fn test_fallback_synthesizes_needs_revision() {
        let limiter = IterationLimiter::new(2);
        let mut history = history_of(vec![Verdict::needs_revision("a"), Verdict::rejected("b")]);

        let verdict = limiter.fallback(&mut history);
        assert_eq!(verdict.status, VerdictStatus::NeedsRevision);
        assert!(verdict
            .feedback
            .starts_with("Review process exceeded maximum iterations (2)."));
        assert!(verdict.feedback.contains("Manual intervention required."));
        assert_eq!(history.final_status(), FinalStatus::Fallback);
    }
}
