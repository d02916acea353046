//! Review history for a single session.
//!
//! A [`ReviewHistory`] is an append-only log of [`Iteration`]s. Iterations are
//! numbered from 1 in the order they were recorded and are never reordered,
//! mutated, or removed once appended. The only way to add one is
//! [`ReviewHistory::record`], and the only way to mark a history as converged
//! is [`ReviewHistory::conclude`], which always sets a final status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::verdict::{Verdict, VerdictStatus};

/// Terminal label attached to a history once it concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    #[default]
    None,
    Approved,
    Rejected,
    Fallback,
    Converged,
}

impl FinalStatus {
    /// Label as reported to callers; empty while the history is open.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Fallback => "fallback",
            Self::Converged => "converged",
        }
    }
}

/// One evaluator round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iteration {
    /// 1-based round number.
    pub number: u32,
    /// Diff text reviewed in this round.
    pub diff: String,
    pub verdict: Verdict,
    /// Whether the change was actually applied. The controller never applies
    /// patches itself, so recorded iterations start out `false`.
    pub applied: bool,
    pub timestamp: DateTime<Utc>,
    /// Fingerprint of `diff`.
    pub content_hash: String,
}

/// Append-only iteration log owned by one review context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewHistory {
    pub session_id: String,
    iterations: Vec<Iteration>,
    pub original_prompt: String,
    pub original_content: String,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    converged: bool,
    final_status: FinalStatus,
}

impl ReviewHistory {
    pub fn new(
        session_id: impl Into<String>,
        original_prompt: impl Into<String>,
        original_content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            iterations: Vec::new(),
            original_prompt: original_prompt.into(),
            original_content: original_content.into(),
            start_time: now,
            last_update: now,
            converged: false,
            final_status: FinalStatus::None,
        }
    }

    /// Append a new iteration and return its number.
    pub fn record(
        &mut self,
        diff: impl Into<String>,
        content_hash: impl Into<String>,
        verdict: Verdict,
    ) -> u32 {
        let number = u32::try_from(self.len() + 1).unwrap_or(u32::MAX);
        let now = Utc::now();
        self.iterations.push(Iteration {
            number,
            diff: diff.into(),
            verdict,
            applied: false,
            timestamp: now,
            content_hash: content_hash.into(),
        });
        self.last_update = now;
        number
    }

    /// Mark the history converged with the given final status.
    ///
    /// Returns `false` and leaves the history untouched for
    /// [`FinalStatus::None`], since a converged history must carry a label.
    pub fn conclude(&mut self, status: FinalStatus) -> bool {
        if status == FinalStatus::None {
            return false;
        }
        self.converged = true;
        self.final_status = status;
        self.last_update = Utc::now();
        true
    }

    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn latest(&self) -> Option<&Iteration> {
        self.iterations.last()
    }

    /// The trailing `n` iterations (fewer if the history is shorter).
    pub fn recent(&self, n: usize) -> &[Iteration] {
        let start = self.iterations.len().saturating_sub(n);
        &self.iterations[start..]
    }

    /// Newest iteration whose verdict was `approved`.
    pub fn most_recent_approved(&self) -> Option<&Iteration> {
        self.iterations
            .iter()
            .rev()
            .find(|iteration| iteration.verdict.status == VerdictStatus::Approved)
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    pub fn final_status(&self) -> FinalStatus {
        self.final_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(statuses: &[VerdictStatus]) -> ReviewHistory {
        let mut history = ReviewHistory::new("session", "prompt", "diff");
        for (i, status) in statuses.iter().enumerate() {
            history.record(
                format!("diff {i}"),
                format!("hash {i}"),
                Verdict::new(*status, format!("feedback {i}")),
            );
        }
        history
    }

    #[test]
    fn test_new_history_is_open_and_empty() {
        let prompt = "Create a user registration function";
        let history = ReviewHistory::new("abc", prompt, "fn x()");
        assert_eq!(history.session_id, "abc");
        assert_eq!(history.original_prompt, prompt);
        assert_eq!(history.original_content, "fn x()");
        assert!(history.is_empty());
        assert!(!history.is_converged());
        assert_eq!(history.final_status(), FinalStatus::None);
        assert_eq!(history.start_time, history.last_update);
    }

    #[test]
    fn test_record_numbers_iterations_from_one() {
        let history = history_with(&[
            VerdictStatus::NeedsRevision,
            VerdictStatus::NeedsRevision,
            VerdictStatus::Approved,
        ]);

        let numbers: Vec<u32> = history.iterations().iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(history.len(), 3);
        assert!(history.iterations().iter().all(|i| !i.applied));
        assert_eq!(history.latest().unwrap().content_hash, "hash 2");
    }

    #[test]
    fn test_conclude_refuses_none() {
        let mut history = history_with(&[VerdictStatus::Approved]);
        assert!(!history.conclude(FinalStatus::None));
        assert!(!history.is_converged());

        assert!(history.conclude(FinalStatus::Approved));
        assert!(history.is_converged());
        assert_eq!(history.final_status().as_str(), "approved");
    }

    #[test]
    fn test_most_recent_approved_scans_backward() {
        let history = history_with(&[
            VerdictStatus::Approved,
            VerdictStatus::NeedsRevision,
            VerdictStatus::Approved,
            VerdictStatus::Rejected,
        ]);

        let approved = history.most_recent_approved().unwrap();
        assert_eq!(approved.number, 3);

        let rejected_only = history_with(&[VerdictStatus::Rejected]);
        assert!(rejected_only.most_recent_approved().is_none());
    }

    #[test]
    fn test_recent_window_clamps_to_length() {
        let history = history_with(&[VerdictStatus::NeedsRevision, VerdictStatus::Rejected]);
        assert_eq!(history.recent(3).len(), 2);
        assert_eq!(history.recent(1)[0].number, 2);
    }
}
