//! Session and navigation endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::controller::PlatformSnapshot;
use crate::models::{LoginRequest, PlatformView, UserProfile};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub view: PlatformView,
}

/// GET /api/state - Everything needed to render the current frame.
pub async fn get_state(State(state): State<AppState>) -> ApiResult<PlatformSnapshot> {
    let ctl = state.driver.controller().lock().await;
    success(ctl.snapshot())
}

/// POST /api/session/login - Accept credentials and start the biometric scan.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<UserProfile> {
    let profile = state.driver.login(&request).await?;
    tracing::info!("Session opened for {}", profile.name);
    success(profile)
}

/// DELETE /api/session - Log out and return to the intro.
pub async fn logout(State(state): State<AppState>) -> ApiResult<PlatformSnapshot> {
    state.driver.logout().await;
    let ctl = state.driver.controller().lock().await;
    success(ctl.snapshot())
}

/// PUT /api/session/role - Change the status label.
pub async fn set_role(
    State(state): State<AppState>,
    Json(request): Json<RoleRequest>,
) -> ApiResult<UserProfile> {
    let mut ctl = state.driver.controller().lock().await;
    success(ctl.set_role(&request.role).await?)
}

/// PUT /api/view - Switch the main platform section.
pub async fn set_view(
    State(state): State<AppState>,
    Json(request): Json<ViewRequest>,
) -> ApiResult<PlatformView> {
    let mut ctl = state.driver.controller().lock().await;
    ctl.navigate(request.view)?;
    success(ctl.view())
}
