//! BioOS core
//!
//! Persistence and session lifecycle for the BioOS research platform, served
//! as a local REST API over SQLite-backed key-value storage.

mod ai;
mod api;
mod audio;
mod auth;
mod config;
mod controller;
mod errors;
mod maps;
mod models;
mod storage;
mod stores;
mod tools;
mod weather;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ai::{BioService, GeminiClient};
use config::Config;
use controller::{BootDriver, ViewController};
use storage::{MemoryStorage, SqliteStorage, Storage};
use weather::WeatherClient;

/// `BIOOS_DB_PATH` value selecting process-local storage.
const MEMORY_DB_PATH: &str = ":memory:";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub driver: BootDriver,
    pub weather: WeatherClient,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BioOS core");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (BIOOS_API_PSK). Authentication is disabled!");
    }
    if config.ai_api_key.is_none() {
        tracing::warn!("No AI key configured (GEMINI_API_KEY). Every AI call will fall back.");
    }

    let storage: Arc<dyn Storage> = if config.db_path.as_os_str() == MEMORY_DB_PATH {
        tracing::warn!("Using in-memory storage; nothing will survive a restart");
        Arc::new(MemoryStorage::new())
    } else {
        let pool = storage::init_database(&config.db_path).await?;
        Arc::new(SqliteStorage::new(pool))
    };

    let http = reqwest::Client::new();
    let bio: Arc<dyn BioService> = Arc::new(GeminiClient::new(http.clone(), &config));
    let weather = WeatherClient::new(http, &config.weather_base_url);

    let shared = ViewController::load(storage, bio).await.into_shared();
    let driver = BootDriver::new(shared.clone(), config.timings);

    // The spotlight is fetched once per process, ahead of the first dashboard.
    tokio::spawn(async move {
        controller::refresh_spotlight(&shared).await;
    });
    driver.start().await;

    let state = AppState {
        driver,
        weather,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Session & navigation
        .route("/state", get(api::get_state))
        .route("/session", delete(api::logout))
        .route("/session/login", post(api::login))
        .route("/session/role", put(api::set_role))
        .route("/view", put(api::set_view))
        // Preferences & history
        .route(
            "/preferences",
            get(api::get_preferences).put(api::update_preferences),
        )
        .route("/history", get(api::get_history).delete(api::clear_history))
        // BioDrive
        .route(
            "/collection",
            get(api::list_collection).put(api::replace_collection),
        )
        .route("/collection/save", post(api::save_current))
        .route("/collection/upload", post(api::upload_file))
        .route("/collection/open", post(api::open_saved))
        // Research
        .route("/search", post(api::search))
        .route("/chat", get(api::chat_log).post(api::chat))
        .route("/image", post(api::generate_image))
        .route("/page", post(api::render_page))
        .route("/spotlight", get(api::get_spotlight))
        .route("/weather", get(api::get_weather))
        // Tools
        .route("/maps", get(api::list_map_locations))
        .route("/maps/{id}/explore", post(api::explore_location))
        .route("/tools/dna", post(api::dna_analysis))
        .route("/tools/convert", post(api::unit_conversion))
        .route("/speech/toggle", post(api::toggle_speech))
        .route("/speech/finished", post(api::speech_finished))
        .route("/audio/{cue}", get(api::audio_cue))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
