//! Change log adapters.

pub mod snapshot;

pub use snapshot::SnapshotChangeLog;
