//! Profile model - one user's engagement state.

use serde::{Deserialize, Serialize};

use crate::id::UserId;
use crate::Time;

/// A user's engagement profile.
///
/// `streak_days` is 0 only before the first check-in; `last_check_in`
/// moves forward through check-ins and is rewritten only by the explicit
/// streak-start override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user
    pub id: UserId,

    /// Cumulative experience points, never decreasing
    pub xp: u64,

    /// Consecutive days with at least one check-in
    pub streak_days: u32,

    /// Most recent check-in, if any
    pub last_check_in: Option<Time>,

    /// Registration timestamp
    pub joined_at: Time,

    /// Optimistic-concurrency token, bumped by the store on every save
    pub version: u64,
}

impl Profile {
    /// Create a fresh profile with zeroed counters.
    pub fn new(id: UserId, now: Time) -> Self {
        Self {
            id,
            xp: 0,
            streak_days: 0,
            last_check_in: None,
            joined_at: now,
            version: 0,
        }
    }
}
