//! Saved research entities ("BioDrive").

use std::sync::Arc;

use serde_json::Value;

use super::{read_json, write_json};
use crate::errors::AppError;
use crate::models::CollectionEntry;
use crate::storage::{keys, Storage};

/// Ordered collection with at most one entry per scientific name.
pub struct CollectionStore {
    storage: Arc<dyn Storage>,
    entries: Vec<CollectionEntry>,
}

impl CollectionStore {
    /// Load the saved entries. A record that fails to decode is skipped on
    /// its own; only an unreadable array resets the collection.
    pub async fn load(storage: Arc<dyn Storage>) -> Self {
        let raw: Vec<Value> = read_json(storage.as_ref(), keys::COLLECTION)
            .await
            .unwrap_or_default();

        let entries = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable collection entry {}: {}", index, e);
                    None
                }
            })
            .collect();
        Self { storage, entries }
    }

    pub fn load_all(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, scientific_name: &str) -> bool {
        self.find(scientific_name).is_some()
    }

    pub fn find(&self, scientific_name: &str) -> Option<&CollectionEntry> {
        self.entries
            .iter()
            .find(|e| e.key() == Some(scientific_name))
    }

    /// Append an entry unless its key is already saved.
    ///
    /// Returns `Ok(false)` without writing when the key exists.
    pub async fn add(&mut self, entry: CollectionEntry) -> Result<bool, AppError> {
        if self.entries.iter().any(|e| e.key() == entry.key()) {
            return Ok(false);
        }
        self.entries.push(entry);
        self.persist().await?;
        Ok(true)
    }

    /// Place an entry first, replacing any earlier entry with the same key.
    pub async fn prepend(&mut self, entry: CollectionEntry) -> Result<(), AppError> {
        self.entries.retain(|e| e.key() != entry.key());
        self.entries.insert(0, entry);
        self.persist().await
    }

    /// Overwrite the whole collection. Later duplicates of a key are dropped.
    pub async fn replace_all(&mut self, entries: Vec<CollectionEntry>) -> Result<(), AppError> {
        let mut unique: Vec<CollectionEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.key() == entry.key()) {
                unique.push(entry);
            }
        }
        self.entries = unique;
        self.persist().await
    }

    async fn persist(&self) -> Result<(), AppError> {
        write_json(self.storage.as_ref(), keys::COLLECTION, &self.entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileUpload, ResponseType};
    use crate::storage::MemoryStorage;

    fn entity(name: &str) -> CollectionEntry {
        CollectionEntry {
            is_valid: true,
            response_type: ResponseType::ENTITY,
            scientific_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_is_idempotent_on_scientific_name() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut store = CollectionStore::load(storage.clone()).await;

        assert!(store.add(entity("Escherichia coli")).await.unwrap());
        let mut again = entity("Escherichia coli");
        again.common_name = Some("E. coli".into());
        assert!(!store.add(again).await.unwrap());
        assert_eq!(store.len(), 1);

        let reloaded = CollectionStore::load(storage).await;
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.load_all()[0].common_name.is_none());
    }

    #[tokio::test]
    async fn test_add_appends_in_order() {
        let mut store = CollectionStore::load(Arc::new(MemoryStorage::new())).await;
        store.add(entity("Deinococcus radiodurans")).await.unwrap();
        store.add(entity("Thermus aquaticus")).await.unwrap();

        let names: Vec<_> = store.load_all().iter().filter_map(|e| e.key()).collect();
        assert_eq!(names, ["Deinococcus radiodurans", "Thermus aquaticus"]);
        assert!(store.contains("Thermus aquaticus"));
        assert!(!store.contains("thermus aquaticus"));
    }

    #[tokio::test]
    async fn test_reupload_refreshes_instead_of_duplicating() {
        let mut store = CollectionStore::load(Arc::new(MemoryStorage::new())).await;
        store.add(entity("Escherichia coli")).await.unwrap();

        let upload = FileUpload {
            file_name: "gel.png".into(),
            mime_type: Some("image/png".into()),
            size_bytes: 1024,
        };
        store
            .prepend(CollectionEntry::from_upload(&upload, "01/05/2024"))
            .await
            .unwrap();
        store
            .prepend(CollectionEntry::from_upload(&upload, "02/05/2024"))
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.load_all()[0].key(), Some("gel.png"));
        assert_eq!(
            store.load_all()[0].last_modified.as_deref(),
            Some("02/05/2024")
        );
    }

    #[tokio::test]
    async fn test_corrupt_collection_loads_empty() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(keys::COLLECTION, "[{\"isValid\": tru").await.unwrap();
        let mut store = CollectionStore::load(storage).await;
        assert!(store.load_all().is_empty());

        store
            .replace_all(vec![entity("A"), entity("B"), entity("A")])
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_loosely_shaped_entries_survive_load_and_add() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let saved = serde_json::json!([
            {
                "isValid": true,
                "responseType": "ENTITY",
                "scientificName": "Escherichia coli",
                "taxonomy": {"kingdom": "Bacteria", "domain": "Bacteria"},
                "hazardLevel": "BSL-2"
            },
            {
                "isValid": true,
                "responseType": "ENTITY",
                "scientificName": "Vibrio",
                "webResults": [{"title": "t", "url": "u", "snippet": "s"}]
            },
            {"scientificName": 42},
            {
                "isValid": true,
                "responseType": "ENTITY",
                "scientificName": "Thermus aquaticus"
            }
        ]);
        storage
            .set(keys::COLLECTION, &saved.to_string())
            .await
            .unwrap();

        let mut store = CollectionStore::load(storage.clone()).await;
        let names: Vec<_> = store.load_all().iter().filter_map(|e| e.key()).collect();
        assert_eq!(names, ["Escherichia coli", "Vibrio", "Thermus aquaticus"]);

        store.add(entity("Bacillus")).await.unwrap();

        let raw = storage.get(keys::COLLECTION).await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 4);
        assert_eq!(stored[0]["taxonomy"]["domain"], "Bacteria");
        assert_eq!(stored[0]["hazardLevel"], "BSL-2");
        assert_eq!(stored[1]["webResults"][0]["title"], "t");
        assert_eq!(stored[3]["scientificName"], "Bacillus");
    }
}
