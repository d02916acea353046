//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Compact or JSON console output on stderr
//! - Optional rolling JSON log files via tracing-appender

pub mod logger;

pub use logger::LoggerImpl;
