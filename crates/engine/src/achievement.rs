//! Achievement evaluation - unlock milestones against progress metrics.

use ember_core::{Achievement, AchievementCategory, AchievementSet};
use tracing::debug;

/// Per-category progress counters supplied by the caller.
///
/// The engine treats these as opaque tallies; how a meditation or a
/// journal entry gets counted is the caller's business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounters {
    /// Completed meditations
    pub meditations: u32,

    /// Journal entries written
    pub journal_entries: u32,

    /// Community interactions
    pub community_interactions: u32,

    /// One-off milestones granted by the caller
    pub special: u32,
}

/// A full metrics snapshot for one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSnapshot {
    /// Current streak length
    pub streak_days: u32,

    /// Everything that is not streak-driven
    pub counters: CategoryCounters,
}

impl MetricSnapshot {
    /// The counter backing a category.
    pub fn metric(&self, category: AchievementCategory) -> u32 {
        match category {
            AchievementCategory::Streak => self.streak_days,
            AchievementCategory::Meditation => self.counters.meditations,
            AchievementCategory::Journal => self.counters.journal_entries,
            AchievementCategory::Community => self.counters.community_interactions,
            AchievementCategory::Special => self.counters.special,
        }
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The achievement set with refreshed progress and unlocks applied
    pub set: AchievementSet,

    /// Total XP awarded by this pass
    pub xp_awarded: u64,

    /// Newly unlocked achievements, in catalog order
    pub unlocked: Vec<Achievement>,
}

/// Evaluate every locked achievement against a metrics snapshot.
///
/// Already-unlocked achievements are skipped entirely, which is what
/// makes unlocking monotonic: repeated passes over the same metrics
/// award each achievement's XP exactly once. Evaluation runs in catalog
/// order so XP accumulation is deterministic.
pub fn evaluate(mut set: AchievementSet, metrics: &MetricSnapshot) -> Evaluation {
    let mut xp_awarded = 0u64;
    let mut unlocked = Vec::new();

    for achievement in &mut set.achievements {
        if achievement.unlocked {
            continue;
        }

        let progress = metrics.metric(achievement.category);
        achievement.progress = progress.min(achievement.requirement);

        if progress >= achievement.requirement {
            achievement.unlocked = true;
            achievement.progress = achievement.requirement;
            xp_awarded += achievement.xp;
            debug!(id = %achievement.id, xp = achievement.xp, "achievement unlocked");
            unlocked.push(achievement.clone());
        }
    }

    Evaluation {
        set,
        xp_awarded,
        unlocked,
    }
}
