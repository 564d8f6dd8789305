//! Durable key-value storage.
//!
//! Every store in the crate persists through the [`Storage`] trait. SQLite is the
//! source of truth in production; tests substitute [`MemoryStorage`].

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
#[cfg(test)]
pub use memory::BrokenStorage;
pub use sqlite::{init_database, SqliteStorage};

use async_trait::async_trait;

use crate::errors::AppError;

/// Well-known storage keys. These are the on-disk format and must stay stable.
pub mod keys {
    pub const USER: &str = "bio_user";
    pub const THEME: &str = "bio_theme";
    pub const NOTIFICATIONS: &str = "bio_notifications";
    pub const AUDIO: &str = "bio_audio";
    pub const COLLECTION: &str = "bio_collection";
    pub const HISTORY: &str = "bio_history";
    pub const LAST_UPDATE: &str = "bio_last_update";
}

/// String-keyed, string-valued durable storage.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a value. `Ok(None)` means the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Read a key, swallowing backend failures as "absent".
///
/// Stores use this on every read path so that a broken backend degrades to
/// default values instead of surfacing errors.
pub(crate) async fn read_soft(storage: &dyn Storage, key: &str) -> Option<String> {
    match storage.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Storage read of {} failed, using default: {}", key, e);
            None
        }
    }
}
