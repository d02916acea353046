//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the review loop consumes:
//! - Evaluator: the reviewer consulted once per round
//! - ChangeLog: revertible change tracking used for rollback on rejection
//! - RequestFormatter: assembly of the outbound review request
//!
//! These traits let the orchestrator stay independent of any particular LLM
//! backend, patch mechanism, or prompt layout.

pub mod change_log;
pub mod evaluator;
pub mod null_change_log;
pub mod request_formatter;

pub use change_log::{ChangeLog, ChangeLogError};
pub use evaluator::Evaluator;
pub use null_change_log::NullChangeLog;
pub use request_formatter::RequestFormatter;
