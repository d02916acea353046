//! Review loop services.

pub mod convergence_detector;
pub mod diff_context;
pub mod fingerprint;
pub mod iteration_limiter;
pub mod request_builder;
pub mod review_orchestrator;
pub mod session_store;
pub mod similarity;
pub mod verdict_parser;

pub use convergence_detector::{ConvergenceDetector, CONVERGENCE_WINDOW};
pub use fingerprint::{fingerprint, generate_session_id};
pub use iteration_limiter::IterationLimiter;
pub use request_builder::{affected_files, MarkdownRequestBuilder};
pub use review_orchestrator::ReviewOrchestrator;
pub use session_store::{SessionGuard, SessionStore};
pub use similarity::similarity;
pub use verdict_parser::{parse_response, ReviewResponse, StructuredVerdict};
