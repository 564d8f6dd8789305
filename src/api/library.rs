//! Preferences, search history and BioDrive endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::models::{CollectionEntry, FileUpload, HistoryItem, Preferences, PreferencesPatch};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// False when the entity was already in the collection
    pub added: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    pub scientific_name: String,
}

/// GET /api/preferences
pub async fn get_preferences(State(state): State<AppState>) -> ApiResult<Preferences> {
    let ctl = state.driver.controller().lock().await;
    success(ctl.preferences())
}

/// PUT /api/preferences - Apply a partial preference change.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(patch): Json<PreferencesPatch>,
) -> ApiResult<Preferences> {
    let mut ctl = state.driver.controller().lock().await;
    success(ctl.update_preferences(&patch).await)
}

/// GET /api/history - Most recent search first.
pub async fn get_history(State(state): State<AppState>) -> ApiResult<Vec<HistoryItem>> {
    let ctl = state.driver.controller().lock().await;
    success(ctl.history().to_vec())
}

/// DELETE /api/history
pub async fn clear_history(State(state): State<AppState>) -> ApiResult<()> {
    let mut ctl = state.driver.controller().lock().await;
    ctl.clear_history().await;
    success(())
}

/// GET /api/collection - Saved entities and uploads, BioDrive order.
pub async fn list_collection(State(state): State<AppState>) -> ApiResult<Vec<CollectionEntry>> {
    let ctl = state.driver.controller().lock().await;
    success(ctl.collection().to_vec())
}

/// PUT /api/collection - Replace the whole collection. Duplicate names keep the first.
pub async fn replace_collection(
    State(state): State<AppState>,
    Json(entries): Json<Vec<CollectionEntry>>,
) -> ApiResult<Vec<CollectionEntry>> {
    let mut ctl = state.driver.controller().lock().await;
    ctl.replace_collection(entries).await;
    success(ctl.collection().to_vec())
}

/// POST /api/collection/save - Save the entity currently on screen.
pub async fn save_current(State(state): State<AppState>) -> ApiResult<SaveResponse> {
    let mut ctl = state.driver.controller().lock().await;
    let added = ctl.save_current_result().await?;
    success(SaveResponse { added })
}

/// POST /api/collection/upload - Register a file dropped onto BioDrive.
pub async fn upload_file(
    State(state): State<AppState>,
    Json(upload): Json<FileUpload>,
) -> ApiResult<CollectionEntry> {
    let mut ctl = state.driver.controller().lock().await;
    success(ctl.upload(&upload).await?)
}

/// POST /api/collection/open - Reopen a saved entity in the search view.
pub async fn open_saved(
    State(state): State<AppState>,
    Json(request): Json<OpenRequest>,
) -> ApiResult<CollectionEntry> {
    let mut ctl = state.driver.controller().lock().await;
    success(ctl.open_saved(&request.scientific_name)?)
}
