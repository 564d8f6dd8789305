//! Bounded, deduplicated search history.

use std::sync::Arc;

use chrono::Local;

use super::{read_json, write_json};
use crate::errors::AppError;
use crate::models::HistoryItem;
use crate::storage::{keys, Storage};

/// Maximum number of remembered searches.
pub const HISTORY_LIMIT: usize = 50;

pub struct HistoryStore {
    storage: Arc<dyn Storage>,
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    pub async fn load(storage: Arc<dyn Storage>) -> Self {
        let items = read_json(storage.as_ref(), keys::HISTORY)
            .await
            .unwrap_or_default();
        Self { storage, items }
    }

    pub fn load_all(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Record a search stamped with the current local time.
    pub async fn record(&mut self, term: &str) -> Result<Vec<HistoryItem>, AppError> {
        let timestamp = Local::now().format("%d/%m/%Y, %H:%M:%S").to_string();
        self.record_at(term, timestamp).await
    }

    /// Move `term` to the front (exact match dedup) and keep the newest entries.
    pub async fn record_at(
        &mut self,
        term: &str,
        timestamp: String,
    ) -> Result<Vec<HistoryItem>, AppError> {
        self.items.retain(|item| item.term != term);
        self.items.insert(
            0,
            HistoryItem {
                term: term.to_string(),
                timestamp,
                kind: "search".to_string(),
            },
        );
        self.items.truncate(HISTORY_LIMIT);

        write_json(self.storage.as_ref(), keys::HISTORY, &self.items).await?;
        Ok(self.items.clone())
    }

    pub async fn clear(&mut self) -> Result<(), AppError> {
        self.items.clear();
        write_json(self.storage.as_ref(), keys::HISTORY, &self.items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn terms(items: &[HistoryItem]) -> Vec<&str> {
        items.iter().map(|i| i.term.as_str()).collect()
    }

    #[tokio::test]
    async fn test_rerecorded_term_moves_to_front() {
        let mut history = HistoryStore::load(Arc::new(MemoryStorage::new())).await;
        history.record("Tardígrados").await.unwrap();
        history.record("CRISPR").await.unwrap();
        let items = history.record("Tardígrados").await.unwrap();

        assert_eq!(terms(&items), ["Tardígrados", "CRISPR"]);
        assert_eq!(items[0].kind, "search");
    }

    #[tokio::test]
    async fn test_dedup_is_case_sensitive() {
        let mut history = HistoryStore::load(Arc::new(MemoryStorage::new())).await;
        history.record("crispr").await.unwrap();
        let items = history.record("CRISPR").await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_bounded_most_recent_first_and_unique() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::load(storage.clone()).await;

        for i in 0..120 {
            // Revisit a small set of terms now and then to exercise dedup.
            let term = if i % 7 == 0 {
                format!("term-{}", i % 3)
            } else {
                format!("term-{}", i)
            };
            let items = history.record_at(&term, i.to_string()).await.unwrap();

            assert!(items.len() <= HISTORY_LIMIT);
            assert_eq!(items[0].term, term);
            let mut seen = std::collections::HashSet::new();
            assert!(items.iter().all(|item| seen.insert(item.term.clone())));
            let stamps: Vec<u32> = items.iter().map(|i| i.timestamp.parse().unwrap()).collect();
            assert!(stamps.windows(2).all(|w| w[0] > w[1]));
        }

        let reloaded = HistoryStore::load(storage).await;
        assert_eq!(reloaded.load_all().len(), HISTORY_LIMIT);
        // 119 is a revisit step: 119 % 3 == 2.
        assert_eq!(reloaded.load_all()[0].term, "term-2");
    }

    #[tokio::test]
    async fn test_clear_persists_empty_list() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut history = HistoryStore::load(storage.clone()).await;
        history.record("Prochlorococcus").await.unwrap();
        history.clear().await.unwrap();

        assert!(HistoryStore::load(storage.clone()).await.load_all().is_empty());
        assert_eq!(storage.get(keys::HISTORY).await.unwrap().as_deref(), Some("[]"));
    }
}
