//! Markdown review request assembly.
//!
//! Context sections come before the diff so the evaluator reads the intent
//! of a change before the change itself.

use std::collections::HashSet;

use crate::domain::models::ReviewContext;
use crate::domain::ports::RequestFormatter;

const PREAMBLE: &str = concat!(
    "Please perform a structured code review of the following changes.\n\n",
    "Respond with a single JSON object of the form:\n",
    "{\"status\": \"approved\" | \"needs_revision\" | \"rejected\", ",
    "\"feedback\": \"<summary of findings>\", ",
    "\"detailed_guidance\": \"<optional step-by-step fixes>\"}\n\n",
    "Use \"approved\" when the changes are correct and complete, ",
    "\"needs_revision\" when they are on the right track but need specific fixes, ",
    "and \"rejected\" when they are fundamentally wrong or unsafe.",
);

/// Default [`RequestFormatter`]: a markdown document with one section per
/// populated context field, ending with the diff.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRequestBuilder;

impl MarkdownRequestBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl RequestFormatter for MarkdownRequestBuilder {
    fn format(&self, context: &ReviewContext) -> String {
        let mut parts = vec![PREAMBLE.to_string()];

        let mut section = |title: &str, body: Option<&str>| {
            if let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) {
                parts.push(format!("\n## {title}\n{body}"));
            }
        };

        let metadata = &context.metadata;
        section("Project Type", metadata.project_type.as_deref());
        section(
            "Commit Message (Intent)",
            metadata.commit_message.as_deref(),
        );
        section(
            "Key Code Comments (Context)",
            metadata.key_comments.as_deref(),
        );
        section("Change Categories", metadata.change_categories.as_deref());

        let touched: HashSet<String> = affected_files(&context.diff).into_iter().collect();
        let related: Vec<&str> = context
            .related_files
            .iter()
            .map(String::as_str)
            .filter(|file| !file.is_empty() && !touched.contains(*file))
            .collect();
        if !related.is_empty() {
            let body = format!(
                "The following files may be affected by or related to these changes:\n{}",
                related.join("\n")
            );
            section("Related Files to Consider", Some(body.as_str()));
        }

        section("Original Request", Some(context.original_prompt.as_str()));
        section(
            "Processed Instructions",
            context.processed_instructions.as_deref(),
        );
        section("Full File Context", context.full_file_context.as_deref());

        parts.push(format!(
            "\n## Code Changes to Review\n```diff\n{}\n```",
            context.diff
        ));

        parts.join("\n")
    }
}

/// Unique file paths named in a unified diff's headers, in first-seen order.
///
/// Reads `diff --git a/x b/x`, `--- a/x`, and `+++ b/x` lines; `/dev/null`
/// sides of added or deleted files are skipped.
pub fn affected_files(diff: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for line in diff.lines() {
        let path = if line.starts_with("diff --git") {
            line.split_whitespace().nth(2)
        } else if line.starts_with("---") || line.starts_with("+++") {
            line.split_whitespace().nth(1)
        } else {
            None
        };

        let Some(path) = path.filter(|p| !p.contains("/dev/null")) else {
            continue;
        };
        let path = path
            .strip_prefix("a/")
            .or_else(|| path.strip_prefix("b/"))
            .unwrap_or(path);

        if seen.insert(path.to_string()) {
            files.push(path.to_string());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ReviewMetadata;

    const DIFF: &str = "diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1 +1,2 @@
 fn a() {}
+fn b() {}
diff --git a/src/new.rs b/src/new.rs
new file mode 100644
--- /dev/null
+++ b/src/new.rs
@@ -0,0 +1 @@
+fn c() {}";

    #[test]
    fn test_affected_files_dedupes_and_skips_dev_null() {
        assert_eq!(affected_files(DIFF), vec!["src/lib.rs", "src/new.rs"]);
        assert!(affected_files("").is_empty());
    }

    #[test]
    fn test_sections_are_ordered_with_diff_last() {
        let context = ReviewContext::new(DIFF)
            .with_prompt("add function b")
            .with_instructions("1. add b")
            .with_file_context("fn a() {}")
            .with_related_files(vec!["src/lib.rs".to_string(), "src/main.rs".to_string()])
            .with_metadata(ReviewMetadata {
                project_type: Some("rust".to_string()),
                commit_message: Some("feat: add b".to_string()),
                key_comments: Some("// b is used by main".to_string()),
                change_categories: Some("feature".to_string()),
            });

        let request = MarkdownRequestBuilder::new().format(&context);

        let headings = [
            "## Project Type",
            "## Commit Message (Intent)",
            "## Key Code Comments (Context)",
            "## Change Categories",
            "## Related Files to Consider",
            "## Original Request",
            "## Processed Instructions",
            "## Full File Context",
            "## Code Changes to Review",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|h| request.find(h).unwrap_or_else(|| panic!("missing {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(request.starts_with("Please perform a structured code review"));
        assert!(request.ends_with(&format!("```diff\n{DIFF}\n```")));
    }

    #[test]
    fn test_related_files_exclude_touched_files() {
        let context = ReviewContext::new(DIFF)
            .with_related_files(vec!["src/lib.rs".to_string(), "src/main.rs".to_string()]);
        let request = MarkdownRequestBuilder::new().format(&context);

        let related = request
            .split("## Related Files to Consider")
            .nth(1)
            .and_then(|rest| rest.split("## ").next())
            .unwrap();
        assert!(related.contains("src/main.rs"));
        assert!(!related.contains("src/lib.rs"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let context = ReviewContext::new("diff --git a/x b/x")
            .with_related_files(vec!["x".to_string()]);
        let request = MarkdownRequestBuilder::new().format(&context);

        assert!(!request.contains("## Project Type"));
        assert!(!request.contains("## Original Request"));
        assert!(!request.contains("## Related Files to Consider"));
        assert!(request.contains("## Code Changes to Review"));
    }
}
