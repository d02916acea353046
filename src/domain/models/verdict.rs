//! Evaluator verdicts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ReviewError;

/// Classification an evaluator assigns to a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Approved,
    NeedsRevision,
    Rejected,
}

impl VerdictStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::NeedsRevision => "needs_revision",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictStatus {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "needs_revision" => Ok(Self::NeedsRevision),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ReviewError::UnknownVerdictStatus(s.to_string())),
        }
    }
}

/// An evaluator's verdict on one diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_guidance: Option<String>,
}

impl Verdict {
    pub fn new(status: VerdictStatus, feedback: impl Into<String>) -> Self {
        Self {
            status,
            feedback: feedback.into(),
            detailed_guidance: None,
        }
    }

    pub fn approved(feedback: impl Into<String>) -> Self {
        Self::new(VerdictStatus::Approved, feedback)
    }

    pub fn needs_revision(feedback: impl Into<String>) -> Self {
        Self::new(VerdictStatus::NeedsRevision, feedback)
    }

    pub fn rejected(feedback: impl Into<String>) -> Self {
        Self::new(VerdictStatus::Rejected, feedback)
    }

    /// Attach detailed guidance for the next revision.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.detailed_guidance = Some(guidance.into());
        self
    }

    pub fn is_approved(&self) -> bool {
        self.status == VerdictStatus::Approved
    }
}
