//! Request formatting port.

use crate::domain::models::ReviewContext;

/// Assembles the opaque request text sent to an evaluator.
pub trait RequestFormatter: Send + Sync {
    fn format(&self, context: &ReviewContext) -> String;
}
