//! Streak continuation - the check-in state machine.
//!
//! A streak is a count of consecutive calendar days with at least one
//! check-in. Calendar days are the UTC date of the timestamp; both
//! comparisons below use the same frame so a check-in can never be
//! classified as today by one rule and two-days-ago by the other.

use chrono::Days;
use ember_core::{CheckInStatus, Time};

use crate::error::EngineError;

/// Result of running a check-in through the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckIn {
    /// Streak length after the check-in
    pub streak_days: u32,

    /// Check-in timestamp to persist
    pub last_check_in: Time,

    /// How the streak changed
    pub status: CheckInStatus,
}

/// Decide whether a check-in continues, resets, or is a no-op.
///
/// Same calendar day as the last check-in: no-op. Exactly the day after:
/// the streak grows by one. Anything else, including no prior check-in:
/// the streak restarts at 1.
pub fn check_in(now: Time, last_check_in: Option<Time>, streak_days: u32) -> CheckIn {
    let today = now.date_naive();

    if let Some(last) = last_check_in {
        let last_day = last.date_naive();

        if last_day == today {
            return CheckIn {
                streak_days,
                last_check_in: last,
                status: CheckInStatus::AlreadyCheckedIn,
            };
        }

        if last_day.checked_add_days(Days::new(1)) == Some(today) {
            return CheckIn {
                streak_days: streak_days + 1,
                last_check_in: now,
                status: CheckInStatus::Continued,
            };
        }
    }

    CheckIn {
        streak_days: 1,
        last_check_in: now,
        status: CheckInStatus::Reset,
    }
}

/// Recompute a streak as the inclusive whole-day span from `start` to `now`.
///
/// Rejects a `start` after `now` with [`EngineError::InvalidDate`];
/// callers must not mutate state on failure.
pub fn streak_from_start(start: Time, now: Time) -> Result<u32, EngineError> {
    let start_day = start.date_naive();
    let today = now.date_naive();

    if start_day > today {
        return Err(EngineError::InvalidDate(format!(
            "streak start {} is in the future",
            start_day
        )));
    }

    let span = (today - start_day).num_days() + 1;
    Ok(span as u32)
}
