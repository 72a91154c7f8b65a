//! Daily task reset and toggling.
//!
//! A task set is Fresh when `last_updated` falls on today's calendar day
//! and Stale otherwise. Observation transitions Stale to Fresh at most
//! once per day; toggling flips a single flag and leaves `last_updated`
//! alone so it keeps witnessing the day the set belongs to.

use ember_core::{DailyTaskSet, Time};
use tracing::info;

use crate::error::EngineError;

/// Bring a task set up to date with the current calendar day.
///
/// Returns the (possibly reset) set and whether a reset occurred.
/// Observing an already-Fresh set is a no-op, so repeated calls within
/// one day fire the reset at most once.
pub fn observe(mut set: DailyTaskSet, now: Time) -> (DailyTaskSet, bool) {
    if set.last_updated.date_naive() == now.date_naive() {
        return (set, false);
    }

    info!(day = %now.date_naive(), "resetting daily tasks");
    for task in &mut set.tasks {
        task.completed = false;
    }
    set.last_updated = now;
    (set, true)
}

/// Flip one task's completion flag.
///
/// Rejects unknown ids with [`EngineError::TaskNotFound`] and leaves the
/// set untouched in that case.
pub fn toggle(mut set: DailyTaskSet, task_id: &str) -> Result<DailyTaskSet, EngineError> {
    let task = set
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))?;

    task.completed = !task.completed;
    Ok(set)
}
