//! Reviewloop - iterative review of code changes by an LLM evaluator
//!
//! Each call to [`ReviewOrchestrator::perform_review`] runs one review round:
//! the diff and its intent are formatted into a request, the evaluator's
//! verdict is parsed and appended to the session's history, and the verdict
//! is routed. Repeated calls under one session id accumulate history until
//! the change is approved, the feedback stops changing, or the iteration cap
//! is reached.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Review models, errors, and port traits
//! - **Service Layer** (`services`): The review loop and its policies
//! - **Adapters** (`adapters`): Evaluator backends and change logs
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reviewloop::adapters::evaluators::ScriptedEvaluator;
//! use reviewloop::{NullChangeLog, ReviewContext, ReviewOptions, ReviewOrchestrator, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = ReviewOrchestrator::new(
//!         Arc::new(ScriptedEvaluator::always(r#"{"status":"approved","feedback":"ok"}"#)),
//!         Arc::new(NullChangeLog::new()),
//!         Default::default(),
//!         Arc::new(SessionStore::with_capacity(16)),
//!     );
//!     let context = ReviewContext::new("+fn b() {}").with_session_id("s-1");
//!     let verdict = orchestrator.perform_review(context, &ReviewOptions::staged()).await?;
//!     println!("{}", verdict.status);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{EvaluatorError, ReviewError, ReviewResult};
pub use domain::models::{
    Config, FinalStatus, Iteration, LoggingConfig, ReviewConfiguration, ReviewContext,
    ReviewHistory, ReviewKind, ReviewMetadata, ReviewOptions, Verdict, VerdictStatus,
};
pub use domain::ports::{ChangeLog, ChangeLogError, Evaluator, NullChangeLog, RequestFormatter};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ReviewOrchestrator, SessionStore};
