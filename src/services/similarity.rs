//! Feedback similarity scoring.
//!
//! Review feedback is prose whose meaning lives in its vocabulary rather than
//! its phrasing, so similarity is the Jaccard index over sets of normalized
//! tokens. Word order and repetition are ignored.

use std::collections::HashSet;

/// Punctuation trimmed from both ends of every token.
const TRIM_CHARS: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Lowercased, punctuation-trimmed, non-empty unique tokens of `text`.
fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .map(|word| word.trim_matches(TRIM_CHARS).to_string())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Similarity of two feedback strings in `[0.0, 1.0]`.
///
/// Two empty token sets are identical (`1.0`); exactly one empty set shares
/// nothing with the other (`0.0`).
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = token_set(a);
    let right = token_set(b);

    match (left.is_empty(), right.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let intersection = left.intersection(&right).count();
    let union = left.len() + right.len() - intersection;

    #[allow(clippy::cast_precision_loss)]
    let score = intersection as f64 / union as f64;
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_one() {
        let text = "Add error handling to the function";
        assert!((similarity(text, text) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_inputs() {
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!(similarity("something", "").abs() < f64::EPSILON);
        assert!(similarity("", "something").abs() < f64::EPSILON);
    }

    #[test]
    fn test_punctuation_only_counts_as_empty() {
        assert!((similarity("...", "?!") - 1.0).abs() < f64::EPSILON);
        assert!(similarity(";;", "word").abs() < f64::EPSILON);
    }

    #[test]
    fn test_unrelated_strings_score_low() {
        assert!(similarity("hello world", "goodbye universe") <= 0.2);
    }

    #[test]
    fn test_partial_overlap_is_jaccard() {
        // {add, error, handling, to, the, function} vs {add, error, handling, and, validation}
        // shared 3, union 8
        let score = similarity(
            "Add error handling to the function",
            "Add error handling and validation",
        );
        assert!((score - 3.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_punctuation_and_order_are_ignored() {
        let score = similarity("Fix the bug, please!", "please FIX bug the");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_repetition_is_ignored() {
        let score = similarity("tests tests tests", "tests");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }
}
