//! Implementation of the `reviewloop review` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::adapters::evaluators::{AnthropicEvaluator, ScriptedEvaluator};
use crate::cli::load_config;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{
    Config, ReviewContext, ReviewHistory, ReviewMetadata, ReviewOptions, Verdict,
};
use crate::domain::ports::{Evaluator, NullChangeLog};
use crate::services::diff_context;
use crate::services::{ReviewOrchestrator, SessionStore};

#[derive(Args, Debug, Default)]
pub struct ReviewArgs {
    /// Review this unified diff instead of `git diff --cached`
    #[arg(short, long, value_name = "PATH")]
    pub diff_file: Option<PathBuf>,

    /// Session id recorded with the review. Each run keeps its session in
    /// memory only, so rounds accumulate across calls through the library,
    /// not across separate CLI runs.
    #[arg(short, long)]
    pub session: Option<String>,

    /// The request the change is meant to fulfil
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// Processed instructions derived from the prompt
    #[arg(long)]
    pub instructions: Option<String>,

    /// Intent of the change; defaults to a summary of the staged stat
    #[arg(long)]
    pub commit_message: Option<String>,

    /// Project type; detected from marker files when omitted
    #[arg(long)]
    pub project_type: Option<String>,

    /// Files related to the change (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub related: Vec<String>,

    /// Override the evaluator model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Review before the change is applied; non-approved verdicts are advisory
    #[arg(long)]
    pub pre_apply: bool,

    /// Non-interactive mode
    #[arg(long)]
    pub skip_prompt: bool,

    /// Dry run: answer with the contents of this file instead of calling the API
    #[arg(long, value_name = "PATH")]
    pub response_file: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ReviewOutput {
    pub status: String,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_guidance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub iterations: usize,
    pub final_status: String,
}

impl ReviewOutput {
    fn new(verdict: Verdict, session_id: Option<String>, history: Option<&ReviewHistory>) -> Self {
        Self {
            status: verdict.status.to_string(),
            feedback: verdict.feedback,
            detailed_guidance: verdict.detailed_guidance,
            session_id,
            iterations: history.map_or(1, ReviewHistory::len),
            final_status: history
                .map(|h| h.final_status().as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

impl CommandOutput for ReviewOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Review status: {}", self.status)];
        if let Some(session_id) = &self.session_id {
            lines.push(format!(
                "Session: {} (iteration {})",
                truncate(session_id, 24),
                self.iterations
            ));
        }
        if !self.final_status.is_empty() {
            lines.push(format!("Final status: {}", self.final_status));
        }
        lines.push(String::new());
        lines.push(self.feedback.clone());
        if let Some(guidance) = &self.detailed_guidance {
            lines.push("\nDetailed guidance:".to_string());
            lines.push(guidance.clone());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(
    args: ReviewArgs,
    config_path: Option<&Path>,
    json_mode: bool,
) -> Result<()> {
    let mut config = load_config(config_path).context("Failed to load configuration")?;
    if let Some(model) = &args.model {
        config.evaluator.model.clone_from(model);
    }

    let diff = match &args.diff_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read diff file {}", path.display()))?,
        None => staged_diff().await?,
    };
    if diff.trim().is_empty() {
        anyhow::bail!(
            "No staged changes found. Stage your changes before running 'reviewloop review'."
        );
    }

    let root = std::env::current_dir().context("Failed to get current directory")?;
    let context = build_context(&args, diff, &root).await;
    let options = review_options(&args);

    let result = match &args.response_file {
        Some(path) => {
            let canned = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read response file {}", path.display()))?;
            info!(path = %path.display(), "dry run with canned evaluator response");
            let evaluator = ScriptedEvaluator::always(canned);
            run_review(evaluator, &config, context, &options).await?
        }
        None => {
            let evaluator = AnthropicEvaluator::new(config.evaluator.clone())
                .context("Failed to create evaluator")?;
            run_review(evaluator, &config, context, &options).await?
        }
    };

    output(&result, json_mode);
    Ok(())
}

/// Run one review round and collect what the command reports.
async fn run_review<E: Evaluator>(
    evaluator: E,
    config: &Config,
    context: ReviewContext,
    options: &ReviewOptions,
) -> Result<ReviewOutput> {
    let sessions = Arc::new(SessionStore::from_config(&config.session_store));
    let orchestrator = ReviewOrchestrator::new(
        Arc::new(evaluator),
        Arc::new(NullChangeLog::new()),
        config.review.clone(),
        sessions,
    );

    let session_id = context.session_key().map(str::to_string);
    let verdict = orchestrator
        .perform_review(context, options)
        .await
        .context("Code review failed")?;

    let history = match &session_id {
        Some(id) => orchestrator.history(id).await,
        None => None,
    };
    Ok(ReviewOutput::new(verdict, session_id, history.as_ref()))
}

fn review_options(args: &ReviewArgs) -> ReviewOptions {
    ReviewOptions {
        skip_prompt: args.skip_prompt,
        pre_apply: args.pre_apply,
        ..ReviewOptions::staged()
    }
}

async fn build_context(args: &ReviewArgs, diff: String, root: &Path) -> ReviewContext {
    let commit_message = match &args.commit_message {
        Some(message) => Some(message.clone()),
        None if args.diff_file.is_none() => staged_summary().await,
        None => None,
    };

    let metadata = ReviewMetadata {
        project_type: args
            .project_type
            .clone()
            .or_else(|| diff_context::detect_project_type(root)),
        commit_message,
        key_comments: diff_context::key_comments(&diff),
        change_categories: diff_context::change_categories(&diff),
    };
    let file_context = diff_context::file_context(root, &diff).await;

    let mut context = ReviewContext::new(diff)
        .with_prompt(args.prompt.clone())
        .with_related_files(args.related.clone())
        .with_metadata(metadata);
    if let Some(instructions) = &args.instructions {
        context = context.with_instructions(instructions.clone());
    }
    if let Some(session) = &args.session {
        context = context.with_session_id(session.clone());
    }
    if let Some(file_context) = file_context {
        context = context.with_file_context(file_context);
    }
    context
}

async fn staged_diff() -> Result<String> {
    let output = Command::new("git")
        .args(["diff", "--cached"])
        .output()
        .await
        .context("Failed to run git diff --cached")?;

    if !output.status.success() {
        anyhow::bail!(
            "git diff --cached failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    debug!(bytes = output.stdout.len(), "read staged diff");
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Last line of `git diff --cached --stat`, e.g. "2 files changed, 10 insertions(+)".
async fn staged_summary() -> Option<String> {
    let output = Command::new("git")
        .args(["diff", "--cached", "--stat"])
        .output()
        .await
        .ok()
        .filter(|o| o.status.success())?;

    stat_summary(&String::from_utf8_lossy(&output.stdout))
}

fn stat_summary(stat: &str) -> Option<String> {
    stat.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| format!("Staged changes summary: {line}"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::domain::models::FinalStatus;

    const DIFF: &str = "diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1 +1,2 @@
 fn a() {}
+// IMPORTANT: b must stay pure
+fn b() {}
";

    #[test]
    fn test_stat_summary_uses_totals_line() {
        let stat = concat!(
            " src/lib.rs | 2 ++\n",
            " src/main.rs | 1 -\n",
            " 2 files changed, 2 insertions(+), 1 deletion(-)\n",
        );
        let expected = "Staged changes summary: 2 files changed, 2 insertions(+), 1 deletion(-)";
        assert_eq!(stat_summary(stat).as_deref(), Some(expected));
        assert!(stat_summary("\n").is_none());
    }

    #[test]
    fn test_review_options_from_flags() {
        let args = ReviewArgs {
            pre_apply: true,
            ..ReviewArgs::default()
        };
        let options = review_options(&args);
        assert!(options.pre_apply);
        assert!(!options.rollback_on_reject);
        assert!(options.is_advisory());
    }

    #[tokio::test]
    async fn test_build_context_derives_metadata() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/lib.rs"), "fn b() {}\n").unwrap();

        let args = ReviewArgs {
            diff_file: Some(PathBuf::from("change.diff")),
            session: Some("s-1".to_string()),
            prompt: "add b".to_string(),
            related: vec!["src/main.rs".to_string()],
            ..ReviewArgs::default()
        };
        let context = build_context(&args, DIFF.to_string(), root).await;

        assert_eq!(context.session_key(), Some("s-1"));
        assert_eq!(context.original_prompt, "add b");
        assert_eq!(context.related_files, vec!["src/main.rs"]);
        assert_eq!(
            context.metadata.project_type.as_deref(),
            Some("Rust project")
        );
        assert!(context.metadata.commit_message.is_none());
        assert!(context
            .metadata
            .key_comments
            .as_deref()
            .unwrap()
            .contains("IMPORTANT: b must stay pure"));
        let file_context = context.full_file_context.unwrap();
        assert!(file_context.contains("### src/lib.rs"));
    }

    #[tokio::test]
    async fn test_run_review_with_canned_response() {
        let config = Config::default();
        let context = ReviewContext::new(DIFF)
            .with_prompt("add b")
            .with_session_id("dry-run");
        let evaluator = ScriptedEvaluator::always(
            r#"{"status": "approved", "feedback": "Looks good", "detailed_guidance": ""}"#,
        );

        let out = run_review(evaluator, &config, context, &ReviewOptions::staged())
            .await
            .unwrap();

        assert_eq!(out.status, "approved");
        assert_eq!(out.feedback, "Looks good");
        assert_eq!(out.session_id.as_deref(), Some("dry-run"));
        assert_eq!(out.iterations, 1);
        assert_eq!(out.final_status, FinalStatus::Approved.as_str());
        assert!(out.to_human().starts_with("Review status: approved"));
        assert_eq!(out.to_json()["status"], "approved");
    }

    #[tokio::test]
    async fn test_run_review_surfaces_evaluator_failure() {
        let config = Config::default();
        let err = run_review(
            ScriptedEvaluator::new([]),
            &config,
            ReviewContext::new(DIFF),
            &ReviewOptions::staged(),
        )
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("Code review failed"));
    }
}
