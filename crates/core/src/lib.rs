//! Ember core data models.
//!
//! This crate defines the records that power the engagement system:
//! user profiles, achievement sets, daily task checklists, and the
//! notification events the engines emit.

#![warn(missing_docs)]

// Core identities
mod id;

// User state
mod profile;
mod achievement;
mod tasks;

// Events emitted toward the presentation layer
mod notification;

// Immutable configuration
pub mod catalog;

// Re-exports
pub use id::{UserId, NotificationId};

pub use profile::Profile;
pub use achievement::{Achievement, AchievementCategory, AchievementSet};
pub use tasks::{DailyTask, DailyTaskSet};
pub use notification::{CheckInStatus, Notification, NotificationKind};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
