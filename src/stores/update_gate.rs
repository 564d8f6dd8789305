//! Once-per-day changelog gate.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::ai::{BioService, EMPTY_CHANGELOG, FALLBACK_CHANGELOG};
use crate::errors::AppError;
use crate::models::SystemUpdate;
use crate::storage::{keys, read_soft, Storage};

/// Format of the persisted `bio_last_update` marker, as the dashboard writes
/// it ("Wed May 01 2024").
const MARKER_FORMAT: &str = "%a %b %d %Y";

/// Marker format written by earlier builds of this service.
const ISO_MARKER_FORMAT: &str = "%Y-%m-%d";

fn marker_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, MARKER_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, ISO_MARKER_FORMAT))
        .ok()
}

/// Decides whether today's changelog overlay is shown. Stateless apart from the
/// durable marker, so it is cheap to clone into background tasks.
#[derive(Clone)]
pub struct UpdateGate {
    storage: Arc<dyn Storage>,
}

impl UpdateGate {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Return today's changelog the first time it is asked for on a given day.
    ///
    /// Later calls on the same day get a badge-only update (`show == false`).
    /// Changelog generation never fails this call; it falls back to a fixed
    /// feature list instead. A failed marker write is logged and the
    /// announcement is still returned.
    pub async fn check_and_consume(
        &self,
        today: NaiveDate,
        source: &dyn BioService,
    ) -> SystemUpdate {
        let last = read_soft(self.storage.as_ref(), keys::LAST_UPDATE).await;
        if last.as_deref().and_then(marker_date) == Some(today) {
            return SystemUpdate::badge(today);
        }

        let features = match source.changelog_features().await {
            Ok(features) if !features.is_empty() => features,
            Ok(_) => EMPTY_CHANGELOG.iter().map(|s| s.to_string()).collect(),
            Err(e) => {
                tracing::warn!("Changelog generation failed, using fallback: {}", e);
                FALLBACK_CHANGELOG.iter().map(|s| s.to_string()).collect()
            }
        };

        let marker = today.format(MARKER_FORMAT).to_string();
        if let Err(e) = self.record(&marker).await {
            tracing::warn!("Could not persist last update marker: {}", e);
        }

        SystemUpdate::announcement(today, features)
    }

    async fn record(&self, marker: &str) -> Result<(), AppError> {
        self.storage.set(keys::LAST_UPDATE, marker).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubBio;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::Ordering;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_shown_once_per_day() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let gate = UpdateGate::new(storage.clone());
        let bio = StubBio::new();

        let first = gate.check_and_consume(may_first(), &bio).await;
        assert!(first.show);
        assert!(!first.features.is_empty());
        assert_eq!(first.version, "v2024.5.1");
        assert_eq!(
            storage.get(keys::LAST_UPDATE).await.unwrap().as_deref(),
            Some("Wed May 01 2024")
        );

        let second = gate.check_and_consume(may_first(), &bio).await;
        assert!(!second.show);
        assert!(second.features.is_empty());
        assert_eq!(second.version, "v2024.5.1");
        assert_eq!(bio.changelog_calls.load(Ordering::SeqCst), 1);

        let next_day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert!(gate.check_and_consume(next_day, &bio).await.show);
    }

    #[tokio::test]
    async fn test_marker_from_dashboard_or_iso_is_honored() {
        let bio = StubBio::new();
        for stored in ["Wed May 01 2024", "2024-05-01"] {
            let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
            storage.set(keys::LAST_UPDATE, stored).await.unwrap();
            let gate = UpdateGate::new(storage);
            assert!(!gate.check_and_consume(may_first(), &bio).await.show);
        }
        assert_eq!(bio.changelog_calls.load(Ordering::SeqCst), 0);

        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(keys::LAST_UPDATE, "5/1/2024").await.unwrap();
        let gate = UpdateGate::new(storage);
        assert!(gate.check_and_consume(may_first(), &bio).await.show);
    }

    #[tokio::test]
    async fn test_generation_failure_uses_fallback() {
        let gate = UpdateGate::new(Arc::new(MemoryStorage::new()));
        let update = gate
            .check_and_consume(may_first(), &StubBio::failing())
            .await;
        assert!(update.show);
        assert_eq!(update.features, FALLBACK_CHANGELOG.map(String::from).to_vec());
    }

    #[tokio::test]
    async fn test_empty_changelog_is_filled_in() {
        let gate = UpdateGate::new(Arc::new(MemoryStorage::new()));
        let bio = StubBio {
            changelog: Vec::new(),
            ..StubBio::new()
        };
        let update = gate.check_and_consume(may_first(), &bio).await;
        assert_eq!(update.features, EMPTY_CHANGELOG.map(String::from).to_vec());
    }
}
