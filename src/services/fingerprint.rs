//! Content fingerprints for change tracking between rounds.
//!
//! Not used for anything security-sensitive; SHA-256 is simply a stable,
//! collision-resistant digest.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `text`.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fresh session id for a submission.
///
/// The current time is mixed in so identical prompt/diff pairs submitted at
/// different moments still get distinct sessions.
pub fn generate_session_id(prompt: &str, diff: &str) -> String {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros());
    fingerprint(&format!("{prompt}-{diff}-{nanos}"))
}
