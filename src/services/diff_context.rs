//! Request metadata derived from a staged diff and the working tree.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use tracing::debug;

use crate::services::request_builder::affected_files;

/// Most key comments surfaced to the evaluator.
pub const MAX_KEY_COMMENTS: usize = 10;

/// Lines of each changed file included as context.
pub const MAX_CONTEXT_LINES: usize = 500;

const IMPORTANT_MARKERS: &[&str] = &[
    "CRITICAL",
    "IMPORTANT",
    "NOTE:",
    "WARNING",
    "TODO:",
    "FIXME",
    "HACK",
    "XXX",
    "BUG",
    "SECURITY",
    "FIX",
    "WORKAROUND",
    "BECAUSE",
    "REASON:",
    "WHY:",
    "INTENT:",
    "PURPOSE:",
];

const PROJECT_MARKERS: &[(&[&str], &str)] = &[
    (&["go.mod"], "Go project"),
    (&["package.json"], "Node.js project"),
    (
        &["requirements.txt", "setup.py", "pyproject.toml"],
        "Python project",
    ),
    (&["Cargo.toml"], "Rust project"),
    (&["Gemfile"], "Ruby project"),
];

/// Guess the project type from marker files in `root`.
pub fn detect_project_type(root: &Path) -> Option<String> {
    PROJECT_MARKERS
        .iter()
        .find(|(files, _)| files.iter().any(|f| root.join(f).exists()))
        .map(|(_, label)| (*label).to_string())
}

/// Added comment lines that look like they carry intent, as
/// `- path: comment` lines. At most [`MAX_KEY_COMMENTS`].
pub fn key_comments(diff: &str) -> Option<String> {
    let mut current_file = "";
    let mut found = Vec::new();

    for line in diff.lines() {
        if line.starts_with("diff --git") {
            if let Some(path) = line.split_whitespace().nth(3) {
                current_file = path.strip_prefix("b/").unwrap_or(path);
            }
            continue;
        }
        if line.starts_with("+++") {
            continue;
        }
        let Some(added) = line.strip_prefix('+') else {
            continue;
        };
        if !(added.contains("//") || added.contains('#')) {
            continue;
        }
        let comment = added.trim();
        if is_important_comment(comment) {
            found.push(format!("- {current_file}: {comment}"));
            if found.len() == MAX_KEY_COMMENTS {
                break;
            }
        }
    }

    (!found.is_empty()).then(|| found.join("\n"))
}

fn is_important_comment(comment: &str) -> bool {
    let upper = comment.to_uppercase();
    IMPORTANT_MARKERS.iter().any(|m| upper.contains(m))
        || (comment.starts_with("//") && comment.len() > 50)
}

/// Rough classification of the diff's added and removed lines, as
/// `- Category (n changes)` lines sorted by category name.
pub fn change_categories(diff: &str) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for line in diff.lines() {
        if line.starts_with("diff --git") || line.starts_with("index") {
            continue;
        }
        if line.starts_with('-') && !line.starts_with("---") {
            *counts.entry("Code removal/refactoring").or_default() += 1;
            continue;
        }
        if line.starts_with("+++") {
            continue;
        }
        let Some(added) = line.strip_prefix('+') else {
            continue;
        };

        let upper = added.to_uppercase();
        let mut bump = |category| *counts.entry(category).or_default() += 1;

        if upper.contains("SECURITY") {
            bump("Security fixes/improvements");
        }
        if ["error", "Err", "if err", "?;"]
            .iter()
            .any(|p| added.contains(p))
        {
            bump("Error handling");
        }
        if added.trim_end().ends_with(".md")
            || upper.contains("COMMENT")
            || upper.contains("DOCUMENT")
        {
            bump("Documentation");
        }
        if ["require(", "github.com/", "go.mod", "Cargo.toml", "[dependencies]"]
            .iter()
            .any(|p| added.contains(p))
        {
            bump("Dependency updates");
        }
        if added.contains("test") || added.contains("Test") {
            bump("Test changes");
        }
        if ["log.", "tracing::", "println!", "fmt.Print", "debug!"]
            .iter()
            .any(|p| added.contains(p))
        {
            bump("Debug/logging");
        }
    }

    if counts.is_empty() {
        return None;
    }
    Some(
        counts
            .iter()
            .map(|(category, n)| format!("- {category} ({n} changes)"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Current contents of the files a diff touches, read relative to `root`.
///
/// Files outside the tree, deleted files, lock files and generated files are
/// skipped. Each file is cut to [`MAX_CONTEXT_LINES`] lines.
pub async fn file_context(root: &Path, diff: &str) -> Option<String> {
    let mut parts = Vec::new();

    for file in affected_files(diff) {
        if !is_repo_relative(&file) || should_skip(&file) {
            continue;
        }
        let contents = match tokio::fs::read_to_string(root.join(&file)).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!(file = %file, error = %e, "skipping file context");
                continue;
            }
        };
        let excerpt: Vec<&str> = contents.lines().take(MAX_CONTEXT_LINES).collect();
        if excerpt.is_empty() {
            continue;
        }
        let lang = Path::new(&file)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        parts.push(format!("### {file}\n```{lang}\n{}\n```", excerpt.join("\n")));
    }

    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

fn is_repo_relative(file: &str) -> bool {
    Path::new(file)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn should_skip(file: &str) -> bool {
    const SUFFIXES: &[&str] = &[".sum", ".lock", ".map", ".pb.go", ".pb.cc", ".pb.h"];
    const INFIXES: &[&str] = &[".min.", "node_modules/", "_generated."];

    SUFFIXES.iter().any(|s| file.ends_with(s)) || INFIXES.iter().any(|s| file.contains(s))
}
