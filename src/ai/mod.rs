//! Generative AI collaborator.
//!
//! The platform never trusts these calls: each call site pairs the trait method
//! with one of the fixed fallbacks below.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{CollectionEntry, MicrobeHint, Spotlight};

/// Changelog used when generation fails outright.
pub const FALLBACK_CHANGELOG: [&str; 3] = [
    "Sincronización de núcleos",
    "Optimización de base de datos",
    "Mejoras generales",
];

/// Changelog used when generation succeeds with no features.
pub const EMPTY_CHANGELOG: [&str; 3] = [
    "Mejoras de rendimiento celular",
    "Actualización de catálogo viral",
    "Parche de seguridad de ADN",
];

pub const CHAT_GREETING: &str =
    "¡Hola! Soy Bio, tu asistente de laboratorio. ¿En qué puedo ayudarte hoy?";
pub const CHAT_EMPTY_REPLY: &str = "Estoy procesando tus datos biológicos...";
pub const CHAT_ERROR_REPLY: &str = "Error de conexión neuronal.";
pub const PAGE_ERROR_HTML: &str = "<p>Error generando la página.</p>";

pub fn fallback_spotlight() -> Spotlight {
    Spotlight {
        title: "Cargando Novedades...".to_string(),
        subtitle: String::new(),
        content: String::new(),
        tag: "BioOS".to_string(),
    }
}

pub fn fallback_microbe() -> MicrobeHint {
    MicrobeHint {
        name: "Microbiota Local".to_string(),
        desc: "Analizando entorno...".to_string(),
    }
}

/// Text, JSON and image generation backing search, chat and the dashboard.
#[async_trait]
pub trait BioService: Send + Sync {
    /// Look up a biological term. An unrecognised term yields `is_valid == false`.
    async fn lookup_entity(&self, term: &str) -> Result<CollectionEntry, AppError>;

    async fn microbe_for_temperature(&self, celsius: f64) -> Result<MicrobeHint, AppError>;

    async fn chat(&self, message: &str, context: &str) -> Result<String, AppError>;

    /// Data URL of a generated microscope image, or `None` if the model returned none.
    async fn microscope_image(&self, term: &str) -> Result<Option<String>, AppError>;

    /// HTML body for a simulated article page.
    async fn article_page(&self, title: &str, query: &str) -> Result<String, AppError>;

    async fn weekly_spotlight(&self) -> Result<Spotlight, AppError>;

    /// Patch notes for today's update. May be empty.
    async fn changelog_features(&self) -> Result<Vec<String>, AppError>;
}
