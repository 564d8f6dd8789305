//! Configuration module for the BioOS core.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Fixed delays that drive the automatic boot transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootTimings {
    /// Intro splash before the session check
    pub intro: Duration,
    /// Decorative biometric scan after login
    pub scan: Duration,
    /// Delay before the daily update check runs
    pub update_defer: Duration,
    /// How long the changelog overlay stays up
    pub overlay: Duration,
}

impl Default for BootTimings {
    fn default() -> Self {
        Self {
            intro: Duration::from_millis(2500),
            scan: Duration::from_millis(3000),
            update_defer: Duration::from_millis(1000),
            overlay: Duration::from_millis(5000),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the local API (optional)
    pub api_psk: Option<String>,
    /// Path to the SQLite file backing durable storage, or `:memory:`
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Key for the generative AI service
    pub ai_api_key: Option<String>,
    /// Text/JSON generation model
    pub ai_model: String,
    /// Image generation model
    pub image_model: String,
    /// Base URL of the generative AI REST endpoint
    pub ai_base_url: String,
    /// Base URL of the weather forecast endpoint
    pub weather_base_url: String,
    pub timings: BootTimings,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("BIOOS_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("BIOOS_DB_PATH")
            .unwrap_or_else(|_| "./data/bioos.sqlite".to_string())
            .into();

        let raw_addr =
            env::var("BIOOS_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr.parse().map_err(|_| {
            AppError::Validation(format!("Invalid BIOOS_BIND_ADDR format: {}", raw_addr))
        })?;

        let log_level = env::var("BIOOS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let ai_api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|s| !s.is_empty());

        let ai_model =
            env::var("BIOOS_AI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let image_model = env::var("BIOOS_IMAGE_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string());
        let ai_base_url = env::var("BIOOS_AI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());
        let weather_base_url = env::var("BIOOS_WEATHER_BASE_URL")
            .unwrap_or_else(|_| "https://api.open-meteo.com/v1".to_string());

        let defaults = BootTimings::default();
        let timings = BootTimings {
            intro: millis_var("BIOOS_INTRO_MS", defaults.intro),
            scan: millis_var("BIOOS_SCAN_MS", defaults.scan),
            update_defer: millis_var("BIOOS_UPDATE_DEFER_MS", defaults.update_defer),
            overlay: millis_var("BIOOS_OVERLAY_MS", defaults.overlay),
        };

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            ai_api_key,
            ai_model,
            image_model,
            ai_base_url,
            weather_base_url,
            timings,
        })
    }
}

/// Read a millisecond duration, keeping the default when unset or unparsable.
fn millis_var(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                tracing::warn!("Ignoring unparsable {}={:?}", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-wide, so everything touching them lives in one test.
    #[test]
    fn test_config_from_env() {
        for var in [
            "BIOOS_API_PSK",
            "BIOOS_DB_PATH",
            "BIOOS_BIND_ADDR",
            "BIOOS_LOG_LEVEL",
            "BIOOS_INTRO_MS",
            "BIOOS_SCAN_MS",
            "BIOOS_UPDATE_DEFER_MS",
            "BIOOS_OVERLAY_MS",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();
        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/bioos.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.timings, BootTimings::default());

        env::set_var("BIOOS_SCAN_MS", "10");
        env::set_var("BIOOS_OVERLAY_MS", "soon");
        let config = Config::from_env().unwrap();
        assert_eq!(config.timings.scan, Duration::from_millis(10));
        assert_eq!(config.timings.overlay, Duration::from_millis(5000));

        env::set_var("BIOOS_BIND_ADDR", "not-an-address");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        env::remove_var("BIOOS_SCAN_MS");
        env::remove_var("BIOOS_OVERLAY_MS");
        env::remove_var("BIOOS_BIND_ADDR");
    }
}
