//! Turning raw evaluator output into a [`Verdict`].
//!
//! Evaluators are asked for a JSON object, but in practice the object may be
//! wrapped in a markdown fence or buried in commentary, and some responses
//! are plain prose. Parsing therefore tries, in order:
//!
//! 1. the whole response as JSON
//! 2. the contents of a markdown code fence
//! 3. every `{` in the response, taking the first complete JSON value there
//!
//! A candidate counts only if it is an object with a string `"status"` key.
//! Responses with no such object are classified by keyword as free text.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::errors::ReviewResult;
use crate::domain::models::{Verdict, VerdictStatus};

/// Feedback substituted when a structured verdict leaves it empty.
pub const DEFAULT_FEEDBACK: &str = "No specific feedback provided";

/// The verdict object as the evaluator wrote it, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StructuredVerdict {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub detailed_guidance: Option<String>,
}

impl StructuredVerdict {
    fn from_object(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let status = object.get("status")?.as_str()?.to_string();
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            status,
            feedback: text("feedback").unwrap_or_default(),
            detailed_guidance: text("detailed_guidance").filter(|g| !g.trim().is_empty()),
        })
    }
}

/// A parsed evaluator response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewResponse {
    /// A JSON verdict object was found in the response.
    Structured(StructuredVerdict),
    /// No verdict object was found; the whole response is the feedback.
    FreeText(String),
}

impl ReviewResponse {
    /// Validate into a [`Verdict`].
    ///
    /// Structured verdicts default an empty status to `needs_revision` and
    /// empty feedback to [`DEFAULT_FEEDBACK`]; any other unrecognized status
    /// is an error. Free text never fails.
    pub fn into_verdict(self) -> ReviewResult<Verdict> {
        match self {
            Self::Structured(structured) => {
                let status = if structured.status.is_empty() {
                    VerdictStatus::NeedsRevision
                } else {
                    structured.status.parse::<VerdictStatus>()?
                };
                let feedback = if structured.feedback.trim().is_empty() {
                    DEFAULT_FEEDBACK.to_string()
                } else {
                    structured.feedback
                };

                let verdict = Verdict::new(status, feedback);
                Ok(match structured.detailed_guidance {
                    Some(guidance) => verdict.with_guidance(guidance),
                    None => verdict,
                })
            }
            Self::FreeText(text) => Ok(Verdict::new(classify_free_text(&text), text)),
        }
    }
}

/// Parse a raw evaluator response.
pub fn parse_response(raw: &str) -> ReviewResponse {
    match find_structured(raw) {
        Some(structured) => ReviewResponse::Structured(structured),
        None => {
            debug!(
                len = raw.len(),
                "no verdict object found; treating response as free text"
            );
            ReviewResponse::FreeText(raw.to_string())
        }
    }
}

/// Keyword classification of a prose response.
pub fn classify_free_text(text: &str) -> VerdictStatus {
    let lower = text.to_lowercase();
    if lower.contains("reject") || lower.contains("not acceptable") {
        VerdictStatus::Rejected
    } else if lower.contains("needs") && lower.contains("revision") {
        VerdictStatus::NeedsRevision
    } else {
        VerdictStatus::Approved
    }
}

fn find_structured(raw: &str) -> Option<StructuredVerdict> {
    let whole = serde_json::from_str::<Value>(raw.trim()).ok();
    if let Some(found) = whole.as_ref().and_then(StructuredVerdict::from_object) {
        return Some(found);
    }

    if let Some(fenced) = fenced_block(raw) {
        let value = serde_json::from_str::<Value>(fenced).ok();
        if let Some(found) = value.as_ref().and_then(StructuredVerdict::from_object) {
            return Some(found);
        }
    }

    raw.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => StructuredVerdict::from_object(&value),
            _ => None,
        }
    })
}

/// Contents of the first markdown code fence, with any language tag dropped.
fn fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_ticks = &raw[open + 3..];
    let body_start = after_ticks.find('\n')? + 1;
    let body = &after_ticks[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}
