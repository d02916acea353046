//! Evaluator adapters.

pub mod anthropic;
pub mod scripted;

pub use anthropic::AnthropicEvaluator;
pub use scripted::{ScriptedEvaluator, ScriptedResponse};
