//! Ember engines - the pure state-transition logic.
//!
//! Level mapping, streak continuation, achievement unlocking, and daily
//! task reset. Every function here takes a snapshot of state and returns
//! the next one; no I/O, no clocks, no shared mutable state.

#![warn(missing_docs)]

pub mod achievement;
pub mod daily;
pub mod level;
pub mod streak;

mod error;

pub use achievement::{CategoryCounters, Evaluation, MetricSnapshot};
pub use error::EngineError;
pub use streak::CheckIn;

/// Error type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
