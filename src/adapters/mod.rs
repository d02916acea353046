//! Adapters for external systems: evaluator backends and change logs.

pub mod change_log;
pub mod evaluators;
