//! Daily task checklist model.

use serde::{Deserialize, Serialize};

use crate::Time;

/// One entry in the daily checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTask {
    /// Stable catalog identifier (e.g. `journal-entry`)
    pub id: String,

    /// Display title
    pub title: String,

    /// Display description
    pub description: String,

    /// Whether the user completed the task today
    pub completed: bool,
}

/// A user's checklist for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTaskSet {
    /// Tasks in catalog order
    pub tasks: Vec<DailyTask>,

    /// When the set was last reset or created
    pub last_updated: Time,

    /// Optimistic-concurrency token, bumped by the store on every save
    pub version: u64,
}

impl DailyTaskSet {
    /// Number of completed tasks.
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Completion as a percentage in `[0, 100]`. Empty sets read as 0.
    pub fn completion_percent(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.tasks.len() as f64 * 100.0
    }

    /// Whether every task is completed.
    pub fn all_completed(&self) -> bool {
        !self.tasks.is_empty() && self.completed_count() == self.tasks.len()
    }
}
