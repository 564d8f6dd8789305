//! AI-backed endpoints: search, chat, imaging, articles and the dashboard widgets.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::controller::{self, SearchState};
use crate::errors::AppError;
use crate::models::{ChatMessage, Spotlight};
use crate::weather::WeatherReport;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    /// Data URL, or null when the placeholder should be shown
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub title: String,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub html: String,
}

/// Coordinates granted by the browser. Both are needed for a lookup.
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// POST /api/search - Look up a biological term.
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<SearchState> {
    success(controller::run_search(state.driver.controller(), &request.term).await?)
}

/// GET /api/chat - The conversation so far.
pub async fn chat_log(State(state): State<AppState>) -> ApiResult<Vec<ChatMessage>> {
    let ctl = state.driver.controller().lock().await;
    success(ctl.chat_log().to_vec())
}

/// POST /api/chat - Ask the lab assistant. A blank message is ignored.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Option<ChatMessage>> {
    success(controller::run_chat(state.driver.controller(), &request.message).await?)
}

/// POST /api/image - Generate a microscope image of the current result.
pub async fn generate_image(State(state): State<AppState>) -> ApiResult<ImageResponse> {
    let image = controller::run_image(state.driver.controller()).await?;
    success(ImageResponse { image })
}

/// POST /api/page - Render a simulated article for a web result.
pub async fn render_page(
    State(state): State<AppState>,
    Json(request): Json<PageRequest>,
) -> ApiResult<PageResponse> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Page title is required".to_string()));
    }
    let html =
        controller::render_page(state.driver.controller(), &request.title, &request.query).await;
    success(PageResponse { html })
}

/// GET /api/spotlight - Weekly highlight, generated once and cached.
pub async fn get_spotlight(State(state): State<AppState>) -> ApiResult<Spotlight> {
    success(controller::spotlight(state.driver.controller()).await)
}

/// GET /api/weather - Local conditions and a matching microbe.
pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> ApiResult<WeatherReport> {
    let coords = match (params.lat, params.lon) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "lat and lon must be given together".to_string(),
            ))
        }
    };
    let report =
        controller::refresh_weather(state.driver.controller(), &state.weather, coords).await;
    success(report)
}
