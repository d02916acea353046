pub mod config;
pub mod history;
pub mod review;
pub mod verdict;

pub use config::{
    Config, EvaluatorConfig, LogFormat, LoggingConfig, ReviewConfiguration, RotationPolicy,
    SessionStoreConfig,
};
pub use history::{FinalStatus, Iteration, ReviewHistory};
pub use review::{ReviewContext, ReviewKind, ReviewMetadata, ReviewOptions};
pub use verdict::{Verdict, VerdictStatus};
