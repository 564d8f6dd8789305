//! Write-through stores layered over [`Storage`](crate::storage::Storage).
//!
//! Each store owns an in-memory copy of its records, loaded once at startup.
//! Reads tolerate missing or corrupt data by substituting defaults; every
//! mutation re-serializes the store's whole record to storage before returning.

mod collection;
mod history;
mod preferences;
mod session;
mod update_gate;

pub use collection::CollectionStore;
pub use history::HistoryStore;
pub use preferences::PreferenceStore;
pub use session::SessionStore;
pub use update_gate::UpdateGate;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;
use crate::storage::{read_soft, Storage};

/// Decode a JSON record, treating absence and corruption alike as `None`.
async fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = read_soft(storage, key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding corrupt {} record: {}", key, e);
            None
        }
    }
}

async fn write_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Could not encode {} record: {}", key, e)))?;
    storage.set(key, &raw).await
}
