//! BioTools, BioMaps, speech and audio cue endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::audio::{AudioCue, SpeechCommand, Tone};
use crate::controller::{self, SearchState};
use crate::errors::AppError;
use crate::maps::{find_location, BioMapLocation, BIO_MAP_LOCATIONS};
use crate::tools::{analyze_dna, convert_units, Conversion, DnaAnalysis, LengthUnit};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DnaRequest {
    pub sequence: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub value: f64,
    pub from: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
}

/// POST /api/tools/dna - Length and GC content of a sequence.
pub async fn dna_analysis(Json(request): Json<DnaRequest>) -> ApiResult<DnaAnalysis> {
    success(analyze_dna(&request.sequence))
}

/// POST /api/tools/convert - Convert between mm, µm and nm.
pub async fn unit_conversion(Json(request): Json<ConvertRequest>) -> ApiResult<Conversion> {
    if !request.value.is_finite() {
        return Err(AppError::Validation("Value must be a finite number".to_string()));
    }
    let from = LengthUnit::parse(&request.from)?;
    success(convert_units(request.value, from))
}

/// GET /api/maps - The fixed extreme-habitat locations.
pub async fn list_map_locations() -> ApiResult<&'static [BioMapLocation]> {
    success(&BIO_MAP_LOCATIONS[..])
}

/// POST /api/maps/:id/explore - Run the habitat's themed search.
pub async fn explore_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SearchState> {
    let location = find_location(&id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown map location: {}", id)))?;
    success(controller::run_search(state.driver.controller(), location.query).await?)
}

/// POST /api/speech/toggle - Start reading aloud, or stop if already reading.
pub async fn toggle_speech(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> ApiResult<SpeechCommand> {
    let mut ctl = state.driver.controller().lock().await;
    success(ctl.toggle_speech(&request.text))
}

/// POST /api/speech/finished - Playback ended on its own.
pub async fn speech_finished(State(state): State<AppState>) -> ApiResult<()> {
    state.driver.controller().lock().await.speech_finished();
    success(())
}

/// GET /api/audio/:cue - Tones to synthesize; empty when audio is off.
pub async fn audio_cue(
    State(state): State<AppState>,
    Path(cue): Path<String>,
) -> ApiResult<Vec<Tone>> {
    let cue = AudioCue::parse(&cue)
        .ok_or_else(|| AppError::NotFound(format!("Unknown audio cue: {}", cue)))?;
    let ctl = state.driver.controller().lock().await;
    success(ctl.cue(cue))
}
