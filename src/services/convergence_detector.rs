//! Convergence detection over the trailing review window.
//!
//! Early rounds are expected to oscillate, so nothing is claimed until the
//! history holds a full window. Within the window, a single pair of rounds
//! with near-identical feedback is enough: the evaluator is repeating itself
//! regardless of what the third round said.

use tracing::debug;

use crate::domain::models::{ReviewConfiguration, ReviewHistory};
use crate::services::similarity::similarity;

/// Number of trailing iterations inspected.
pub const CONVERGENCE_WINDOW: usize = 3;

/// Decides whether review feedback has stopped changing.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceDetector {
    threshold: f64,
}

impl ConvergenceDetector {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub const fn from_config(config: &ReviewConfiguration) -> Self {
        Self::new(config.similarity_threshold)
    }

    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True once any pair of feedbacks in the trailing window scores at or
    /// above the threshold.
    pub fn has_converged(&self, history: &ReviewHistory) -> bool {
        if history.len() < CONVERGENCE_WINDOW {
            return false;
        }

        let window = history.recent(CONVERGENCE_WINDOW);
        for (i, earlier) in window.iter().enumerate() {
            for later in &window[i + 1..] {
                let score = similarity(&earlier.verdict.feedback, &later.verdict.feedback);
                if score >= self.threshold {
                    debug!(
                        first = earlier.number,
                        second = later.number,
                        score,
                        threshold = self.threshold,
                        "repeated feedback detected"
                    );
                    return true;
                }
            }
        }

        false
    }
}

impl Default for ConvergenceDetector {
    fn default() -> Self {
        Self::from_config(&ReviewConfiguration::default())
    }
}
