//! Engagement orchestration.
//!
//! Wires the pure engines to a [`Store`]: each operation is a
//! read-modify-write cycle over one user's records, retried a bounded
//! number of times when an optimistic write loses a race. The manager
//! returns updated state plus ordered notification events; rendering
//! them is the caller's job.

#![warn(missing_docs)]

mod manager;

pub use manager::{
    BasicEngagementManager, EngagementError, EngagementManager, Outcome, TasksOutcome,
};

/// Error type for engagement operations.
pub type Result<T> = std::result::Result<T, EngagementError>;
