//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::sync::Arc;

use reviewloop::adapters::change_log::SnapshotChangeLog;
use reviewloop::adapters::evaluators::{ScriptedEvaluator, ScriptedResponse};
use reviewloop::{ReviewConfiguration, ReviewOrchestrator, SessionStore};

/// A small two-file diff.
#[allow(dead_code)]
pub const SAMPLE_DIFF: &str = "diff --git a/src/user.rs b/src/user.rs
--- a/src/user.rs
+++ b/src/user.rs
@@ -1,2 +1,6 @@
 pub struct User;
+
+pub fn register(name: &str) -> Result<User, String> {
+    if name.is_empty() { return Err(\"empty\".into()); }
+    Ok(User)
+}
";

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Structured verdict reply in the JSON dialect.
#[allow(dead_code)]
pub fn verdict_json(status: &str, feedback: &str) -> ScriptedResponse {
    ScriptedResponse::reply(
        serde_json::json!({
            "status": status,
            "feedback": feedback,
            "detailed_guidance": "",
        })
        .to_string(),
    )
}

/// Orchestrator over a scripted evaluator and a snapshot change log.
#[allow(dead_code)]
pub fn orchestrator(
    responses: Vec<ScriptedResponse>,
    config: ReviewConfiguration,
) -> (
    ReviewOrchestrator<ScriptedEvaluator, SnapshotChangeLog>,
    Arc<ScriptedEvaluator>,
    Arc<SnapshotChangeLog>,
) {
    let evaluator = Arc::new(ScriptedEvaluator::new(responses));
    let change_log = Arc::new(SnapshotChangeLog::new());
    let orchestrator = ReviewOrchestrator::new(
        Arc::clone(&evaluator),
        Arc::clone(&change_log),
        config,
        Arc::new(SessionStore::with_capacity(64)),
    );
    (orchestrator, evaluator, change_log)
}
