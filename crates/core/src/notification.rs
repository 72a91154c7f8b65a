//! Notification events - what changed, for the presentation layer.
//!
//! Engines and the orchestrator never render anything; they return these
//! descriptors in order and the caller decides how to show them.

use serde::{Deserialize, Serialize};

use crate::achievement::Achievement;
use crate::id::NotificationId;
use crate::Time;

/// Outcome of a check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckInStatus {
    /// A check-in was already recorded for this calendar day
    AlreadyCheckedIn,
    /// The streak grew by one day
    Continued,
    /// A day was missed (or this is the first check-in); streak restarts at 1
    Reset,
}

/// An event the caller may surface to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: NotificationId,

    /// When the event was computed
    pub timestamp: Time,

    /// What happened
    pub kind: NotificationKind,
}

/// The payload of a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A check-in was processed
    CheckIn {
        /// How the streak changed
        status: CheckInStatus,
        /// Streak length after the check-in
        streak_days: u32,
    },
    /// An achievement was newly unlocked
    AchievementUnlocked {
        /// The achievement, in its unlocked state
        achievement: Achievement,
    },
    /// Every daily task is now complete
    TasksCompleted,
    /// An operation was rejected with a user-visible reason
    ValidationError {
        /// Human-readable reason
        message: String,
    },
}

impl Notification {
    /// Wrap a payload with a fresh id and the given timestamp.
    pub fn new(kind: NotificationKind, now: Time) -> Self {
        Self {
            id: NotificationId::new(),
            timestamp: now,
            kind,
        }
    }
}
