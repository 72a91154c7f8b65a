//! Engagement management service.

use std::sync::Arc;

use async_trait::async_trait;
use ember_core::{
    catalog, AchievementSet, DailyTaskSet, Notification, NotificationKind, Profile, Time, UserId,
};
use ember_engine::{
    achievement, daily, level, streak, CategoryCounters, EngineError, MetricSnapshot,
};
use ember_storage::{Store, StoreError};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Bound on optimistic-write retries per operation.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Errors surfaced by engagement operations.
#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    /// An engine rejected the operation; no state was mutated
    #[error(transparent)]
    Validation(#[from] EngineError),

    /// The store failed, or every optimistic write attempt lost its race
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a profile-level operation.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The profile as persisted by this operation
    pub profile: Profile,

    /// Level derived from the profile's XP
    pub level: u32,

    /// Progress through the current level band, in percent
    pub level_progress: f64,

    /// Events for the presentation layer, in order
    pub notifications: Vec<Notification>,
}

/// Result of a daily-task operation.
#[derive(Debug, Clone)]
pub struct TasksOutcome {
    /// Today's task set
    pub tasks: DailyTaskSet,

    /// Events for the presentation layer, in order
    pub notifications: Vec<Notification>,
}

/// Engagement management service.
#[async_trait]
pub trait EngagementManager: Send + Sync {
    /// Process a daily check-in, then re-evaluate achievements.
    async fn check_in(
        &self,
        user: &UserId,
        now: Time,
        counters: CategoryCounters,
    ) -> Result<Outcome, EngagementError>;

    /// Override the streak start date, recomputing the streak length.
    async fn set_streak_start(
        &self,
        user: &UserId,
        start: Time,
        now: Time,
    ) -> Result<Outcome, EngagementError>;

    /// Evaluate achievements against current metrics without a check-in.
    async fn evaluate_achievements(
        &self,
        user: &UserId,
        now: Time,
        counters: CategoryCounters,
    ) -> Result<Outcome, EngagementError>;

    /// Read-only profile summary; never writes.
    async fn status(&self, user: &UserId, now: Time) -> Result<Outcome, EngagementError>;

    /// Load today's task set, resetting it first if it is stale.
    async fn daily_tasks(&self, user: &UserId, now: Time) -> Result<TasksOutcome, EngagementError>;

    /// Flip one task's completion flag in today's set.
    async fn toggle_task(
        &self,
        user: &UserId,
        task_id: &str,
        now: Time,
    ) -> Result<TasksOutcome, EngagementError>;
}

/// Basic engagement manager implementation.
pub struct BasicEngagementManager<S: Store> {
    store: Arc<Mutex<S>>,
}

impl<S: Store> BasicEngagementManager<S> {
    /// Create a new manager over a store.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Run a read-modify-write cycle, retrying lost optimistic writes.
    async fn with_retry<T, F, Fut>(&self, user: &UserId, op: &str, f: F) -> Result<T, EngagementError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, EngagementError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match f().await {
                Err(EngagementError::Store(StoreError::Conflict { .. }))
                    if attempt < MAX_WRITE_ATTEMPTS =>
                {
                    warn!(%user, op, attempt, "optimistic write raced; retrying cycle");
                }
                other => return other,
            }
        }
    }

    /// Load a profile, degrading to a fresh default on read failure.
    async fn profile_or_default(store: &S, user: &UserId, now: Time) -> Profile {
        match store.load_profile(user).await {
            Ok(Some(profile)) => profile,
            Ok(None) => Profile::new(user.clone(), now),
            Err(e) => {
                warn!(%user, error = %e, "profile read failed; using defaults");
                Profile::new(user.clone(), now)
            }
        }
    }

    /// Load an achievement set, degrading to the catalog on read failure.
    async fn achievements_or_default(store: &S, user: &UserId) -> AchievementSet {
        match store.load_achievements(user).await {
            Ok(Some(set)) => set,
            Ok(None) => catalog::default_achievements(),
            Err(e) => {
                warn!(%user, error = %e, "achievement read failed; using catalog");
                catalog::default_achievements()
            }
        }
    }

    /// Load a task set, degrading to the catalog on read failure.
    ///
    /// Returns whether the set was created on this call, so the caller
    /// knows a save is needed even without a reset.
    async fn tasks_or_default(store: &S, user: &UserId, now: Time) -> (DailyTaskSet, bool) {
        match store.load_daily_tasks(user).await {
            Ok(Some(set)) => (set, false),
            Ok(None) => (catalog::default_tasks(now), true),
            Err(e) => {
                warn!(%user, error = %e, "task read failed; using catalog");
                (catalog::default_tasks(now), true)
            }
        }
    }

    async fn check_in_cycle(
        &self,
        user: &UserId,
        now: Time,
        counters: CategoryCounters,
    ) -> Result<Outcome, EngagementError> {
        let mut store = self.store.lock().await;

        let mut profile = Self::profile_or_default(&store, user, now).await;
        let result = streak::check_in(now, profile.last_check_in, profile.streak_days);

        let achievements = Self::achievements_or_default(&store, user).await;
        let metrics = MetricSnapshot {
            streak_days: result.streak_days,
            counters,
        };
        let evaluation = achievement::evaluate(achievements, &metrics);

        profile.streak_days = result.streak_days;
        profile.last_check_in = Some(result.last_check_in);
        // XP in this system comes only from unlocks, so the floor below
        // heals a profile write that was lost after its unlocks landed.
        profile.xp = (profile.xp + evaluation.xp_awarded).max(evaluation.set.unlocked_xp());

        // Achievements go first: if the profile write below races and the
        // cycle reruns, re-evaluation skips the already-unlocked entries
        // instead of awarding their XP a second time.
        store.save_achievements(user, &evaluation.set).await?;
        store.save_profile(&profile).await?;

        let mut notifications = vec![Notification::new(
            NotificationKind::CheckIn {
                status: result.status,
                streak_days: result.streak_days,
            },
            now,
        )];
        for unlocked in &evaluation.unlocked {
            notifications.push(Notification::new(
                NotificationKind::AchievementUnlocked {
                    achievement: unlocked.clone(),
                },
                now,
            ));
        }

        info!(
            %user,
            status = ?result.status,
            streak = result.streak_days,
            xp = profile.xp,
            "check-in processed"
        );

        Ok(outcome(profile, notifications))
    }

    async fn set_streak_start_cycle(
        &self,
        user: &UserId,
        start: Time,
        now: Time,
    ) -> Result<Outcome, EngagementError> {
        let mut store = self.store.lock().await;

        let mut profile = Self::profile_or_default(&store, user, now).await;

        // Rejected before any mutation.
        let streak_days = streak::streak_from_start(start, now)?;

        profile.streak_days = streak_days;
        // The recomputed streak includes today, so the profile now reads
        // as checked in; otherwise tomorrow's check-in would reset it.
        profile.last_check_in = Some(now);
        store.save_profile(&profile).await?;

        info!(%user, streak = streak_days, "streak start overridden");
        Ok(outcome(profile, Vec::new()))
    }

    async fn evaluate_cycle(
        &self,
        user: &UserId,
        now: Time,
        counters: CategoryCounters,
    ) -> Result<Outcome, EngagementError> {
        let mut store = self.store.lock().await;

        let mut profile = Self::profile_or_default(&store, user, now).await;
        let achievements = Self::achievements_or_default(&store, user).await;

        let metrics = MetricSnapshot {
            streak_days: profile.streak_days,
            counters,
        };
        let evaluation = achievement::evaluate(achievements, &metrics);
        let xp_before = profile.xp;
        profile.xp = (profile.xp + evaluation.xp_awarded).max(evaluation.set.unlocked_xp());

        store.save_achievements(user, &evaluation.set).await?;
        if profile.xp != xp_before {
            store.save_profile(&profile).await?;
        }

        let notifications = evaluation
            .unlocked
            .iter()
            .map(|a| {
                Notification::new(
                    NotificationKind::AchievementUnlocked {
                        achievement: a.clone(),
                    },
                    now,
                )
            })
            .collect();

        Ok(outcome(profile, notifications))
    }

    async fn daily_tasks_cycle(
        &self,
        user: &UserId,
        now: Time,
    ) -> Result<TasksOutcome, EngagementError> {
        let mut store = self.store.lock().await;

        let (set, created) = Self::tasks_or_default(&store, user, now).await;
        let (set, reset) = daily::observe(set, now);

        if created || reset {
            store.save_daily_tasks(user, &set).await?;
        }

        Ok(TasksOutcome {
            tasks: set,
            notifications: Vec::new(),
        })
    }

    async fn toggle_task_cycle(
        &self,
        user: &UserId,
        task_id: &str,
        now: Time,
    ) -> Result<TasksOutcome, EngagementError> {
        let mut store = self.store.lock().await;

        let (set, _) = Self::tasks_or_default(&store, user, now).await;
        let (set, _) = daily::observe(set, now);

        // Rejected before any save.
        let set = daily::toggle(set, task_id)?;
        store.save_daily_tasks(user, &set).await?;

        let mut notifications = Vec::new();
        if set.all_completed() {
            notifications.push(Notification::new(NotificationKind::TasksCompleted, now));
        }

        info!(
            %user,
            task = task_id,
            percent = set.completion_percent(),
            "task toggled"
        );

        Ok(TasksOutcome {
            tasks: set,
            notifications,
        })
    }
}

fn outcome(profile: Profile, notifications: Vec<Notification>) -> Outcome {
    Outcome {
        level: level::level_of(profile.xp),
        level_progress: level::level_progress(profile.xp),
        profile,
        notifications,
    }
}

#[async_trait]
impl<S: Store + 'static> EngagementManager for BasicEngagementManager<S> {
    async fn check_in(
        &self,
        user: &UserId,
        now: Time,
        counters: CategoryCounters,
    ) -> Result<Outcome, EngagementError> {
        self.with_retry(user, "check_in", || self.check_in_cycle(user, now, counters))
            .await
    }

    async fn set_streak_start(
        &self,
        user: &UserId,
        start: Time,
        now: Time,
    ) -> Result<Outcome, EngagementError> {
        self.with_retry(user, "set_streak_start", || {
            self.set_streak_start_cycle(user, start, now)
        })
        .await
    }

    async fn evaluate_achievements(
        &self,
        user: &UserId,
        now: Time,
        counters: CategoryCounters,
    ) -> Result<Outcome, EngagementError> {
        self.with_retry(user, "evaluate_achievements", || {
            self.evaluate_cycle(user, now, counters)
        })
        .await
    }

    async fn status(&self, user: &UserId, now: Time) -> Result<Outcome, EngagementError> {
        let store = self.store.lock().await;
        let profile = Self::profile_or_default(&store, user, now).await;
        Ok(outcome(profile, Vec::new()))
    }

    async fn daily_tasks(&self, user: &UserId, now: Time) -> Result<TasksOutcome, EngagementError> {
        self.with_retry(user, "daily_tasks", || self.daily_tasks_cycle(user, now))
            .await
    }

    async fn toggle_task(
        &self,
        user: &UserId,
        task_id: &str,
        now: Time,
    ) -> Result<TasksOutcome, EngagementError> {
        self.with_retry(user, "toggle_task", || {
            self.toggle_task_cycle(user, task_id, now)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ember_core::CheckInStatus;
    use ember_storage::MemoryStore;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Time {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn user() -> UserId {
        UserId::new("alice")
    }

    fn check_in_status(outcome: &Outcome) -> CheckInStatus {
        match outcome.notifications[0].kind {
            NotificationKind::CheckIn { status, .. } => status,
            ref other => panic!("expected check-in notification, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn first_check_in_starts_then_continues() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();

        let day1 = manager
            .check_in(&user, at(2025, 3, 10, 9), CategoryCounters::default())
            .await
            .unwrap();
        assert_eq!(check_in_status(&day1), CheckInStatus::Reset);
        assert_eq!(day1.profile.streak_days, 1);
        assert_eq!(day1.level, 1);

        let day2 = manager
            .check_in(&user, at(2025, 3, 11, 9), CategoryCounters::default())
            .await
            .unwrap();
        assert_eq!(check_in_status(&day2), CheckInStatus::Continued);
        assert_eq!(day2.profile.streak_days, 2);
    }

    #[tokio::test]
    async fn same_day_check_in_changes_nothing() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();

        manager
            .check_in(&user, at(2025, 3, 10, 9), CategoryCounters::default())
            .await
            .unwrap();
        let again = manager
            .check_in(&user, at(2025, 3, 10, 21), CategoryCounters::default())
            .await
            .unwrap();

        assert_eq!(check_in_status(&again), CheckInStatus::AlreadyCheckedIn);
        assert_eq!(again.profile.streak_days, 1);
        assert_eq!(again.profile.xp, 0);
    }

    #[tokio::test]
    async fn three_day_streak_unlocks_achievement_once() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();

        for day in 10..12 {
            manager
                .check_in(&user, at(2025, 3, day, 9), CategoryCounters::default())
                .await
                .unwrap();
        }
        let third = manager
            .check_in(&user, at(2025, 3, 12, 9), CategoryCounters::default())
            .await
            .unwrap();

        assert_eq!(third.profile.streak_days, 3);
        assert_eq!(third.profile.xp, 50);
        assert_eq!(third.notifications.len(), 2);
        assert!(matches!(
            &third.notifications[1].kind,
            NotificationKind::AchievementUnlocked { achievement } if achievement.id == "streak-3"
        ));

        // A later evaluation over the same metrics awards nothing more.
        let again = manager
            .evaluate_achievements(&user, at(2025, 3, 12, 10), CategoryCounters::default())
            .await
            .unwrap();
        assert_eq!(again.profile.xp, 50);
        assert!(again.notifications.is_empty());
    }

    #[tokio::test]
    async fn counters_unlock_their_categories_on_check_in() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();

        let counters = CategoryCounters {
            meditations: 5,
            ..CategoryCounters::default()
        };
        let outcome = manager
            .check_in(&user, at(2025, 3, 10, 9), counters)
            .await
            .unwrap();

        assert_eq!(outcome.profile.xp, 100);
        assert_eq!(outcome.level, 2);
        assert!(outcome.notifications.iter().any(|n| matches!(
            &n.kind,
            NotificationKind::AchievementUnlocked { achievement } if achievement.id == "meditation-5"
        )));
    }

    #[tokio::test]
    async fn set_streak_start_rewrites_the_streak() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();
        let now = at(2025, 3, 10, 12);

        let outcome = manager
            .set_streak_start(&user, at(2025, 3, 4, 0), now)
            .await
            .unwrap();
        assert_eq!(outcome.profile.streak_days, 7);

        // The override counts today as checked in.
        let tomorrow = manager
            .check_in(&user, at(2025, 3, 11, 8), CategoryCounters::default())
            .await
            .unwrap();
        assert_eq!(check_in_status(&tomorrow), CheckInStatus::Continued);
        assert_eq!(tomorrow.profile.streak_days, 8);
    }

    #[tokio::test]
    async fn future_streak_start_is_rejected_without_mutation() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();
        let now = at(2025, 3, 10, 12);

        manager
            .check_in(&user, now, CategoryCounters::default())
            .await
            .unwrap();

        let err = manager
            .set_streak_start(&user, at(2025, 3, 11, 0), now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngagementError::Validation(EngineError::InvalidDate(_))
        ));

        let status = manager.status(&user, now).await.unwrap();
        assert_eq!(status.profile.streak_days, 1);
    }

    #[tokio::test]
    async fn stale_tasks_reset_once_per_day() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();
        let yesterday = at(2025, 3, 9, 20);

        // Seed yesterday's fully-completed set directly in the store.
        {
            let store = manager.store();
            let mut store = store.lock().await;
            let mut set = catalog::default_tasks(yesterday);
            for task in &mut set.tasks {
                task.completed = true;
            }
            store.save_daily_tasks(&user, &set).await.unwrap();
        }

        let morning = manager.daily_tasks(&user, at(2025, 3, 10, 7)).await.unwrap();
        assert!(morning.tasks.tasks.iter().all(|t| !t.completed));

        // Progress made today survives a second observation.
        manager
            .toggle_task(&user, "journal-entry", at(2025, 3, 10, 9))
            .await
            .unwrap();
        let evening = manager.daily_tasks(&user, at(2025, 3, 10, 22)).await.unwrap();
        assert_eq!(evening.tasks.completed_count(), 1);
    }

    #[tokio::test]
    async fn completing_every_task_emits_one_event() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let user = user();
        let now = at(2025, 3, 10, 9);

        let first = manager.toggle_task(&user, "daily-meditation", now).await.unwrap();
        assert!(first.notifications.is_empty());

        manager.toggle_task(&user, "journal-entry", now).await.unwrap();
        let last = manager.toggle_task(&user, "check-community", now).await.unwrap();

        assert!(last.tasks.all_completed());
        assert!(matches!(
            last.notifications[0].kind,
            NotificationKind::TasksCompleted
        ));
    }

    #[tokio::test]
    async fn unknown_task_toggle_is_rejected() {
        let manager = BasicEngagementManager::new(MemoryStore::new());
        let err = manager
            .toggle_task(&user(), "no-such-task", at(2025, 3, 10, 9))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngagementError::Validation(EngineError::TaskNotFound(_))
        ));
    }

    /// Store that loses the first profile write, as a concurrent session would.
    struct FlakyStore {
        inner: MemoryStore,
        dropped_one: bool,
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn load_profile(&self, user: &UserId) -> ember_storage::Result<Option<Profile>> {
            self.inner.load_profile(user).await
        }

        async fn save_profile(&mut self, profile: &Profile) -> ember_storage::Result<()> {
            if !self.dropped_one {
                self.dropped_one = true;
                return Err(StoreError::Conflict {
                    user: profile.id.clone(),
                    expected: profile.version,
                    found: profile.version + 1,
                });
            }
            self.inner.save_profile(profile).await
        }

        async fn load_achievements(
            &self,
            user: &UserId,
        ) -> ember_storage::Result<Option<AchievementSet>> {
            self.inner.load_achievements(user).await
        }

        async fn save_achievements(
            &mut self,
            user: &UserId,
            set: &AchievementSet,
        ) -> ember_storage::Result<()> {
            self.inner.save_achievements(user, set).await
        }

        async fn load_daily_tasks(
            &self,
            user: &UserId,
        ) -> ember_storage::Result<Option<DailyTaskSet>> {
            self.inner.load_daily_tasks(user).await
        }

        async fn save_daily_tasks(
            &mut self,
            user: &UserId,
            set: &DailyTaskSet,
        ) -> ember_storage::Result<()> {
            self.inner.save_daily_tasks(user, set).await
        }
    }

    #[tokio::test]
    async fn lost_write_is_retried_and_awards_xp_once() {
        let manager = BasicEngagementManager::new(FlakyStore {
            inner: MemoryStore::new(),
            dropped_one: false,
        });
        let user = user();

        let counters = CategoryCounters {
            community_interactions: 1,
            ..CategoryCounters::default()
        };
        let outcome = manager
            .check_in(&user, at(2025, 3, 10, 9), counters)
            .await
            .unwrap();

        // The retried cycle saw the already-unlocked achievement and did
        // not award its XP a second time.
        assert_eq!(outcome.profile.streak_days, 1);
        assert_eq!(outcome.profile.xp, 50);
    }

    /// Store whose reads always fail, as an unreachable backend would.
    struct OfflineStore;

    #[async_trait]
    impl Store for OfflineStore {
        async fn load_profile(&self, _user: &UserId) -> ember_storage::Result<Option<Profile>> {
            Err(StoreError::Other("store offline".to_string()))
        }

        async fn save_profile(&mut self, _profile: &Profile) -> ember_storage::Result<()> {
            Ok(())
        }

        async fn load_achievements(
            &self,
            _user: &UserId,
        ) -> ember_storage::Result<Option<AchievementSet>> {
            Err(StoreError::Other("store offline".to_string()))
        }

        async fn save_achievements(
            &mut self,
            _user: &UserId,
            _set: &AchievementSet,
        ) -> ember_storage::Result<()> {
            Ok(())
        }

        async fn load_daily_tasks(
            &self,
            _user: &UserId,
        ) -> ember_storage::Result<Option<DailyTaskSet>> {
            Err(StoreError::Other("store offline".to_string()))
        }

        async fn save_daily_tasks(
            &mut self,
            _user: &UserId,
            _set: &DailyTaskSet,
        ) -> ember_storage::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn unreachable_store_degrades_to_defaults() {
        let manager = BasicEngagementManager::new(OfflineStore);
        let now = at(2025, 3, 10, 9);

        let status = manager.status(&user(), now).await.unwrap();
        assert_eq!(status.profile.xp, 0);
        assert_eq!(status.profile.streak_days, 0);
        assert_eq!(status.level, 1);

        let tasks = manager.daily_tasks(&user(), now).await.unwrap();
        assert_eq!(tasks.tasks.tasks.len(), 3);
    }
}
