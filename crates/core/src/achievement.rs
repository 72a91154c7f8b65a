//! Achievement model - milestones with a one-time XP reward.

use serde::{Deserialize, Serialize};

/// The progress dimension an achievement measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    /// Consecutive check-in days
    Streak,
    /// Completed meditations
    Meditation,
    /// Journal entries written
    Journal,
    /// Community interactions
    Community,
    /// One-off milestones awarded by the caller
    Special,
}

/// A milestone with a progress requirement and a one-time XP reward.
///
/// `id`, `title`, `description`, `icon`, `category`, `requirement` and
/// `xp` come from the immutable catalog; `unlocked` and `progress` are
/// per-user state. `unlocked` transitions false to true exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    /// Stable catalog identifier (e.g. `streak-7`)
    pub id: String,

    /// Display title
    pub title: String,

    /// Display description
    pub description: String,

    /// Icon hint for the presentation layer
    pub icon: String,

    /// Progress dimension
    pub category: AchievementCategory,

    /// Threshold at which the achievement unlocks
    pub requirement: u32,

    /// XP awarded on unlock
    pub xp: u64,

    /// Whether the achievement has been earned
    pub unlocked: bool,

    /// Progress toward the requirement, clamped to it
    pub progress: u32,
}

/// One user's copy of the achievement catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementSet {
    /// Achievements in catalog order
    pub achievements: Vec<Achievement>,

    /// Optimistic-concurrency token, bumped by the store on every save
    pub version: u64,
}

impl AchievementSet {
    /// Total XP of already-unlocked achievements.
    pub fn unlocked_xp(&self) -> u64 {
        self.achievements
            .iter()
            .filter(|a| a.unlocked)
            .map(|a| a.xp)
            .sum()
    }
}
