//! In-memory store implementation.
//!
//! Holds records in hash maps with the same compare-and-set semantics as
//! the JSON backend. Used by tests and ephemeral sessions; nothing
//! survives the process.

use std::collections::HashMap;

use async_trait::async_trait;
use ember_core::{AchievementSet, DailyTaskSet, Profile, UserId};

use super::{Result, Store, StoreError};

/// Volatile hash-map store backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: HashMap<UserId, Profile>,
    achievements: HashMap<UserId, AchievementSet>,
    tasks: HashMap<UserId, DailyTaskSet>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version(user: &UserId, expected: u64, found: Option<u64>) -> Result<()> {
    match found {
        Some(found) if found != expected => Err(StoreError::Conflict {
            user: user.clone(),
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_profile(&self, user: &UserId) -> Result<Option<Profile>> {
        Ok(self.profiles.get(user).cloned())
    }

    async fn save_profile(&mut self, profile: &Profile) -> Result<()> {
        let found = self.profiles.get(&profile.id).map(|p| p.version);
        check_version(&profile.id, profile.version, found)?;

        let mut next = profile.clone();
        next.version += 1;
        self.profiles.insert(profile.id.clone(), next);
        Ok(())
    }

    async fn load_achievements(&self, user: &UserId) -> Result<Option<AchievementSet>> {
        Ok(self.achievements.get(user).cloned())
    }

    async fn save_achievements(&mut self, user: &UserId, set: &AchievementSet) -> Result<()> {
        let found = self.achievements.get(user).map(|s| s.version);
        check_version(user, set.version, found)?;

        let mut next = set.clone();
        next.version += 1;
        self.achievements.insert(user.clone(), next);
        Ok(())
    }

    async fn load_daily_tasks(&self, user: &UserId) -> Result<Option<DailyTaskSet>> {
        Ok(self.tasks.get(user).cloned())
    }

    async fn save_daily_tasks(&mut self, user: &UserId, set: &DailyTaskSet) -> Result<()> {
        let found = self.tasks.get(user).map(|s| s.version);
        check_version(user, set.version, found)?;

        let mut next = set.clone();
        next.version += 1;
        self.tasks.insert(user.clone(), next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn cas_matches_json_backend_semantics() {
        let mut store = MemoryStore::new();
        let user = UserId::new("alice");

        let profile = Profile::new(user.clone(), Utc::now());
        store.save_profile(&profile).await.unwrap();

        let stale = profile; // still version 0
        let err = store.save_profile(&stale).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { found: 1, .. }));

        let fresh = store.load_profile(&user).await.unwrap().unwrap();
        assert_eq!(fresh.version, 1);
        store.save_profile(&fresh).await.unwrap();
        assert_eq!(store.load_profile(&user).await.unwrap().unwrap().version, 2);
    }
}
