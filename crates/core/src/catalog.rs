//! Immutable configuration shared by all users.
//!
//! The catalog is read-only process-wide data. Each user receives their
//! own copy at initialization so that per-user mutation (unlocks, task
//! completion) can never alias another user's records.

use crate::achievement::{Achievement, AchievementCategory, AchievementSet};
use crate::tasks::{DailyTask, DailyTaskSet};
use crate::Time;

/// Ascending XP floors for each level; index 0 is level 1's floor.
///
/// The table defines 10 levels. XP beyond the last band still maps to
/// level 10; the level-progress computation synthesizes an open-ended
/// upper bound for that band.
pub const LEVEL_THRESHOLDS: [u64; 10] = [0, 100, 250, 450, 700, 1000, 1350, 1750, 2200, 2700];

/// Build a fresh copy of the default achievement catalog.
pub fn default_achievements() -> AchievementSet {
    let achievements = vec![
        achievement(
            "streak-3",
            "Getting Started",
            "Maintain a 3-day streak",
            "flame",
            AchievementCategory::Streak,
            3,
            50,
        ),
        achievement(
            "streak-7",
            "One Week Strong",
            "Maintain a 7-day streak",
            "flame",
            AchievementCategory::Streak,
            7,
            100,
        ),
        achievement(
            "streak-30",
            "Monthly Master",
            "Maintain a 30-day streak",
            "flame",
            AchievementCategory::Streak,
            30,
            500,
        ),
        achievement(
            "meditation-5",
            "Mindful Beginner",
            "Complete 5 meditations",
            "heart-pulse",
            AchievementCategory::Meditation,
            5,
            100,
        ),
        achievement(
            "journal-5",
            "Journal Enthusiast",
            "Write 5 journal entries",
            "book-open",
            AchievementCategory::Journal,
            5,
            100,
        ),
        achievement(
            "community-first",
            "Community Member",
            "Engage with the community for the first time",
            "message-circle",
            AchievementCategory::Community,
            1,
            50,
        ),
    ];

    AchievementSet {
        achievements,
        version: 0,
    }
}

/// Build a fresh copy of the default daily checklist.
pub fn default_tasks(now: Time) -> DailyTaskSet {
    let tasks = vec![
        task(
            "daily-meditation",
            "Complete a Meditation",
            "Take 5 minutes for mindfulness",
        ),
        task(
            "journal-entry",
            "Write in Journal",
            "Document your thoughts and progress",
        ),
        task(
            "check-community",
            "Connect with Community",
            "Share or find support with others",
        ),
    ];

    DailyTaskSet {
        tasks,
        last_updated: now,
        version: 0,
    }
}

fn achievement(
    id: &str,
    title: &str,
    description: &str,
    icon: &str,
    category: AchievementCategory,
    requirement: u32,
    xp: u64,
) -> Achievement {
    Achievement {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        category,
        requirement,
        xp,
        unlocked: false,
        progress: 0,
    }
}

fn task(id: &str, title: &str, description: &str) -> DailyTask {
    DailyTask {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        completed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_copies_are_independent() {
        let mut a = default_achievements();
        let b = default_achievements();

        a.achievements[0].unlocked = true;
        a.achievements[0].progress = 3;

        assert!(!b.achievements[0].unlocked);
        assert_eq!(b.achievements[0].progress, 0);
    }

    #[test]
    fn thresholds_are_strictly_ascending_from_zero() {
        assert_eq!(LEVEL_THRESHOLDS[0], 0);
        assert!(LEVEL_THRESHOLDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn default_tasks_start_uncompleted() {
        let now = chrono::Utc::now();
        let set = default_tasks(now);
        assert_eq!(set.tasks.len(), 3);
        assert!(set.tasks.iter().all(|t| !t.completed));
        assert_eq!(set.completion_percent(), 0.0);
    }
}
