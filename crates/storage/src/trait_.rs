//! Store trait abstraction.

use async_trait::async_trait;
use ember_core::{AchievementSet, DailyTaskSet, Profile, UserId};

/// Error type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Optimistic write lost a race; re-read and retry the whole cycle
    #[error("write conflict for {user}: expected version {expected}, found {found}")]
    Conflict {
        /// User whose record raced
        user: UserId,
        /// Version the writer read
        expected: u64,
        /// Version currently persisted
        found: u64,
    },

    /// Item not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Store abstraction for Ember records.
///
/// Loads return `Ok(None)` for a user with no prior record; that is
/// first use, not an error, and callers initialize from the catalog.
/// Saves enforce compare-and-set: the record's `version` must match the
/// persisted one or the save fails with [`StoreError::Conflict`], and on
/// success the record is written with `version + 1`. This is what makes
/// a read-modify-write cycle atomic per user key.
#[async_trait]
pub trait Store: Send + Sync {
    // === Profile operations ===

    /// Load a user's profile.
    async fn load_profile(&self, user: &UserId) -> Result<Option<Profile>>;

    /// Save a profile (create or update), enforcing compare-and-set.
    async fn save_profile(&mut self, profile: &Profile) -> Result<()>;

    // === Achievement operations ===

    /// Load a user's achievement set.
    async fn load_achievements(&self, user: &UserId) -> Result<Option<AchievementSet>>;

    /// Save an achievement set, enforcing compare-and-set.
    async fn save_achievements(&mut self, user: &UserId, set: &AchievementSet) -> Result<()>;

    // === Daily task operations ===

    /// Load a user's daily task set.
    async fn load_daily_tasks(&self, user: &UserId) -> Result<Option<DailyTaskSet>>;

    /// Save a daily task set, enforcing compare-and-set.
    async fn save_daily_tasks(&mut self, user: &UserId, set: &DailyTaskSet) -> Result<()>;
}
