//! JSON file store implementation.
//!
//! Stores one JSON file per record under a root directory (typically
//! `.ember/`). Every record carries a `version` field; saves compare the
//! incoming version against the persisted one and reject stale writers
//! with [`StoreError::Conflict`], so concurrent read-modify-write cycles
//! on the same user cannot silently overwrite each other.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ember_core::{AchievementSet, DailyTaskSet, Profile, UserId};
use tokio::fs;

use super::{Result, Store, StoreError};

/// File-based JSON store backend.
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at `root`, creating its subdirectories.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("profiles")).await?;
        fs::create_dir_all(root.join("achievements")).await?;
        fs::create_dir_all(root.join("tasks")).await?;

        Ok(Self { root })
    }

    fn profile_path(&self, user: &UserId) -> PathBuf {
        self.root.join("profiles").join(format!("{}.json", user))
    }

    fn achievements_path(&self, user: &UserId) -> PathBuf {
        self.root.join("achievements").join(format!("{}.json", user))
    }

    fn tasks_path(&self, user: &UserId) -> PathBuf {
        self.root.join("tasks").join(format!("{}.json", user))
    }

    /// Version currently persisted at `path`, if any record exists.
    async fn persisted_version(path: &Path) -> Result<Option<u64>> {
        match fs::read_to_string(path).await {
            Ok(s) => {
                let json: serde_json::Value = serde_json::from_str(&s)?;
                let version = json.get("version").and_then(|v| v.as_u64()).unwrap_or(0);
                Ok(Some(version))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Compare-and-set write: reject stale versions, persist `version + 1`.
    async fn write_versioned<T: serde::Serialize>(
        path: &Path,
        user: &UserId,
        expected: u64,
        record: &T,
    ) -> Result<()> {
        if let Some(found) = Self::persisted_version(path).await? {
            if found != expected {
                tracing::debug!(%user, expected, found, "stale write rejected");
                return Err(StoreError::Conflict {
                    user: user.clone(),
                    expected,
                    found,
                });
            }
        }

        let mut json = serde_json::to_value(record)?;
        json["version"] = serde_json::Value::from(expected + 1);
        fs::write(path, serde_json::to_string_pretty(&json)?.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn load_profile(&self, user: &UserId) -> Result<Option<Profile>> {
        read_json(&self.profile_path(user)).await
    }

    async fn save_profile(&mut self, profile: &Profile) -> Result<()> {
        let path = self.profile_path(&profile.id);
        Self::write_versioned(&path, &profile.id, profile.version, profile).await
    }

    async fn load_achievements(&self, user: &UserId) -> Result<Option<AchievementSet>> {
        read_json(&self.achievements_path(user)).await
    }

    async fn save_achievements(&mut self, user: &UserId, set: &AchievementSet) -> Result<()> {
        let path = self.achievements_path(user);
        Self::write_versioned(&path, user, set.version, set).await
    }

    async fn load_daily_tasks(&self, user: &UserId) -> Result<Option<DailyTaskSet>> {
        read_json(&self.tasks_path(user)).await
    }

    async fn save_daily_tasks(&mut self, user: &UserId, set: &DailyTaskSet) -> Result<()> {
        let path = self.tasks_path(user);
        Self::write_versioned(&path, user, set.version, set).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ember_core::catalog;

    #[tokio::test]
    async fn absent_records_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).await.unwrap();
        let user = UserId::new("nobody");

        assert!(store.load_profile(&user).await.unwrap().is_none());
        assert!(store.load_achievements(&user).await.unwrap().is_none());
        assert!(store.load_daily_tasks(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_bumps_version_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path()).await.unwrap();

        let user = UserId::new("alice");
        let mut profile = Profile::new(user.clone(), Utc::now());
        profile.xp = 150;

        store.save_profile(&profile).await.unwrap();

        let loaded = store.load_profile(&user).await.unwrap().unwrap();
        assert_eq!(loaded.xp, 150);
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn stale_write_is_rejected_with_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path()).await.unwrap();

        let user = UserId::new("alice");
        let profile = Profile::new(user.clone(), Utc::now());
        store.save_profile(&profile).await.unwrap();

        // Two sessions read version 1.
        let mut first = store.load_profile(&user).await.unwrap().unwrap();
        let mut second = store.load_profile(&user).await.unwrap().unwrap();

        first.xp = 50;
        store.save_profile(&first).await.unwrap();

        second.xp = 100;
        let err = store.save_profile(&second).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 1,
                found: 2,
                ..
            }
        ));

        // The losing write changed nothing.
        let persisted = store.load_profile(&user).await.unwrap().unwrap();
        assert_eq!(persisted.xp, 50);
    }

    #[tokio::test]
    async fn achievement_and_task_sets_persist_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path()).await.unwrap();

        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        let now = Utc::now();

        let mut alice_set = catalog::default_achievements();
        alice_set.achievements[0].unlocked = true;
        store.save_achievements(&alice, &alice_set).await.unwrap();
        store
            .save_achievements(&bob, &catalog::default_achievements())
            .await
            .unwrap();
        store
            .save_daily_tasks(&alice, &catalog::default_tasks(now))
            .await
            .unwrap();

        let alice_loaded = store.load_achievements(&alice).await.unwrap().unwrap();
        let bob_loaded = store.load_achievements(&bob).await.unwrap().unwrap();
        assert!(alice_loaded.achievements[0].unlocked);
        assert!(!bob_loaded.achievements[0].unlocked);

        let tasks = store.load_daily_tasks(&alice).await.unwrap().unwrap();
        assert_eq!(tasks.tasks.len(), 3);
        assert_eq!(tasks.version, 1);
    }
}
