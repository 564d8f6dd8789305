//! Ambient conditions widget: local temperature plus a matching microbe.

use serde::{Deserialize, Serialize};

use crate::ai::{fallback_microbe, BioService};
use crate::errors::AppError;

/// Coarse sky condition derived from a WMO weather code.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkyCondition {
    Clear,
    Cloudy,
    Rain,
    Storm,
}

impl SkyCondition {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => SkyCondition::Clear,
            c if c >= 95 => SkyCondition::Storm,
            c if c >= 51 => SkyCondition::Rain,
            _ => SkyCondition::Cloudy,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub temp: f64,
    pub weather_code: i64,
    pub sky: SkyCondition,
    pub microbe: String,
    pub description: String,
    /// False when the report is a placeholder
    pub available: bool,
}

impl WeatherReport {
    fn unavailable(description: &str) -> Self {
        Self {
            temp: 0.0,
            weather_code: 0,
            sky: SkyCondition::Clear,
            microbe: "...".to_string(),
            description: description.to_string(),
            available: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    weather_code: i64,
}

/// Current-conditions client for the Open-Meteo forecast API.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn current(&self, latitude: f64, longitude: f64) -> Result<CurrentConditions, AppError> {
        let response = self
            .http
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m,weather_code".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ForecastResponse>()
            .await?;
        Ok(response.current)
    }

    /// Build the dashboard report. Never fails: missing coordinates or a dead
    /// provider produce a placeholder report instead.
    pub async fn report(&self, coords: Option<(f64, f64)>, bio: &dyn BioService) -> WeatherReport {
        let Some((latitude, longitude)) = coords else {
            return WeatherReport::unavailable("GPS Inactivo");
        };

        let current = match self.current(latitude, longitude).await {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!("Weather lookup failed: {}", e);
                return WeatherReport::unavailable("Sin señal satelital");
            }
        };

        let hint = match bio.microbe_for_temperature(current.temperature_2m).await {
            Ok(hint) => hint,
            Err(e) => {
                tracing::warn!("Microbe hint failed, using fallback: {}", e);
                fallback_microbe()
            }
        };

        WeatherReport {
            temp: current.temperature_2m,
            weather_code: current.weather_code,
            sky: SkyCondition::from_code(current.weather_code),
            microbe: hint.name,
            description: hint.desc,
            available: true,
        }
    }
}
