//! Authenticated user session.

use std::sync::Arc;

use super::{read_json, write_json};
use crate::errors::AppError;
use crate::models::UserProfile;
use crate::storage::{keys, Storage};

pub struct SessionStore {
    storage: Arc<dyn Storage>,
    current: Option<UserProfile>,
}

impl SessionStore {
    /// Restore the persisted session. Never fails: corrupt data means "no session".
    pub async fn load(storage: Arc<dyn Storage>) -> Self {
        let current = read_json(storage.as_ref(), keys::USER).await;
        Self { storage, current }
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub async fn save(&mut self, profile: UserProfile) -> Result<(), AppError> {
        let result = write_json(self.storage.as_ref(), keys::USER, &profile).await;
        self.current = Some(profile);
        result
    }

    pub async fn clear(&mut self) -> Result<(), AppError> {
        self.current = None;
        self.storage.remove(keys::USER).await
    }

    /// Apply a partial change to the active profile and re-persist all of it.
    pub async fn update<F>(&mut self, mutate: F) -> Result<UserProfile, AppError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let profile = self
            .current
            .as_mut()
            .ok_or_else(|| AppError::NotFound("No active session".to_string()))?;
        mutate(profile);
        let updated = profile.clone();

        write_json(self.storage.as_ref(), keys::USER, &updated).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn profile() -> UserProfile {
        UserProfile {
            name: "bacterio".into(),
            role: "Investigador".into(),
            level: 1,
            avatar: "🦠".into(),
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut session = SessionStore::load(storage.clone()).await;
        assert!(!session.is_active());

        session.save(profile()).await.unwrap();
        let restored = SessionStore::load(storage.clone()).await;
        assert_eq!(restored.current(), Some(&profile()));

        session.clear().await.unwrap();
        assert!(SessionStore::load(storage).await.current().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_means_no_session() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(keys::USER, "{\"name\": ").await.unwrap();
        assert!(!SessionStore::load(storage).await.is_active());
    }

    #[tokio::test]
    async fn test_update_persists_whole_profile() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut session = SessionStore::load(storage.clone()).await;

        let err = session.update(|p| p.role = "away".into()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        session.save(profile()).await.unwrap();
        let updated = session.update(|p| p.role = "online".into()).await.unwrap();
        assert_eq!(updated.role, "online");

        let restored = SessionStore::load(storage).await;
        assert_eq!(restored.current().map(|p| p.role.as_str()), Some("online"));
        assert_eq!(restored.current().map(|p| p.name.as_str()), Some("bacterio"));
    }
}
