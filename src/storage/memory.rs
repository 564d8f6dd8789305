//! In-memory storage for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Storage;
use crate::errors::AppError;

#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Backend whose every call fails, for exercising soft-fail paths.
#[cfg(test)]
pub struct BrokenStorage;

#[cfg(test)]
#[async_trait]
impl Storage for BrokenStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
        Err(AppError::Storage("disk unplugged".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
        Err(AppError::Storage("disk unplugged".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), AppError> {
        Err(AppError::Storage("disk unplugged".to_string()))
    }
}
