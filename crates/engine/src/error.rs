//! Engine error taxonomy.

/// Errors that can occur during engine evaluation.
///
/// All variants are validation rejections: the operation is refused and
/// the input state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A supplied date is in the future or not a calendar date
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A toggle referenced a task id absent from the set
    #[error("task not found: {0}")]
    TaskNotFound(String),
}
