//! [`BioService`] backed by the Gemini `generateContent` REST endpoint.

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::BioService;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CollectionEntry, MicrobeHint, Spotlight};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

impl InlineData {
    fn data_url(&self) -> String {
        let mime = if self.mime_type.is_empty() {
            "image/jpeg"
        } else {
            &self.mime_type
        };
        format!("data:{};base64,{}", mime, self.data)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .into_iter()
            .flat_map(|c| c.content.parts.iter())
    }

    /// Concatenated text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// HTTP client for the generative AI service.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    async fn generate(
        &self,
        model: &str,
        prompt: String,
        generation_config: Option<Value>,
    ) -> Result<GenerateResponse, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("No AI API key configured".to_string()))?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt),
                    inline_data: None,
                }],
            }],
            generation_config,
        };

        let response = self
            .http
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(response)
    }

    async fn generate_text(&self, prompt: String) -> Result<Option<String>, AppError> {
        Ok(self.generate(&self.model, prompt, None).await?.text())
    }

    async fn generate_json(&self, prompt: String, schema: Option<Value>) -> Result<String, AppError> {
        let mut generation_config = json!({ "responseMimeType": "application/json" });
        if let Some(schema) = schema {
            generation_config["responseSchema"] = schema;
        }

        self.generate(&self.model, prompt, Some(generation_config))
            .await?
            .text()
            .ok_or_else(|| AppError::Upstream("Empty model response".to_string()))
    }
}

fn entity_schema() -> Value {
    let string = json!({ "type": "STRING" });
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "isValid": { "type": "BOOLEAN" },
            "responseType": { "type": "STRING", "enum": ["ENTITY", "QA", "INVALID"] },
            "scientificName": string,
            "commonName": string,
            "type": string,
            "description": string,
            "habitatTemp": string,
            "taxonomy": {
                "type": "OBJECT",
                "properties": {
                    "kingdom": string,
                    "phylum": string,
                    "class": string,
                    "order": string,
                    "family": string,
                    "genus": string
                }
            },
            "hazardLevel": {
                "type": "STRING",
                "enum": ["Safe", "Low", "Moderate", "High", "Extreme"]
            },
            "funFacts": strings,
            "characteristics": strings,
            "webResults": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string,
                        "url": string,
                        "snippet": string,
                        "source": string
                    }
                }
            },
            "bioAnswer": string
        }
    })
}

/// Simulated BioDrive size, stable for a given payload.
fn simulated_file_size(payload: &str) -> String {
    format!("{:.1} MB", 10.0 + (payload.len() % 500) as f64 / 10.0)
}

#[derive(Deserialize)]
struct ChangelogReply {
    #[serde(default)]
    features: Vec<String>,
}

#[async_trait]
impl BioService for GeminiClient {
    async fn lookup_entity(&self, term: &str) -> Result<CollectionEntry, AppError> {
        let prompt = format!(
            r#"Actúa como "Biogle", la enciclopedia biológica definitiva.
Analiza el término: "{term}".

Objetivo: Devolver información MASIVA y detallada.

Instrucciones:
1. Si es una entidad biológica, 'responseType': 'ENTITY'.
2. 'taxonomy': Clasificación científica completa.
3. 'hazardLevel': Nivel de bioseguridad (Safe, Low, Moderate, High, Extreme).
4. 'funFacts': 3 datos curiosos raros.
5. 'habitatTemp': Temperatura ideal.

Genera 4 'webResults' simulados de papers científicos."#
        );

        let text = self.generate_json(prompt, Some(entity_schema())).await?;
        let mut entry: CollectionEntry = serde_json::from_str(&text)
            .map_err(|e| AppError::Upstream(format!("Unreadable entity payload: {}", e)))?;

        entry.file_size = Some(simulated_file_size(&text));
        entry.last_modified = Some(Local::now().format("%d/%m/%Y").to_string());
        Ok(entry)
    }

    async fn microbe_for_temperature(&self, celsius: f64) -> Result<MicrobeHint, AppError> {
        let prompt = format!(
            r#"La temperatura ambiente actual es de {celsius}°C. Nombra UN SOLO microorganismo (bacteria, hongo, arquea) que prospere o sea común a esta temperatura exacta.
Responde en JSON: {{ "name": "Nombre Científico", "desc": "Breve razón en 5 palabras" }}"#
        );
        let text = self.generate_json(prompt, None).await?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Upstream(format!("Unreadable microbe payload: {}", e)))
    }

    async fn chat(&self, message: &str, context: &str) -> Result<String, AppError> {
        let prompt = format!(
            r#"Eres "Bio", un asistente de IA experto en biología dentro de la app "Biogle".
Contexto actual de búsqueda del usuario (si existe): "{context}".
Usuario dice: "{message}".
Responde de forma amigable, científica y breve (máximo 50 palabras). Usa emojis."#
        );
        Ok(self.generate_text(prompt).await?.unwrap_or_default())
    }

    async fn microscope_image(&self, term: &str) -> Result<Option<String>, AppError> {
        let prompt = format!(
            "Scientific SEM (Scanning Electron Microscope) image of {term}, hyper detailed, false color green and blue, biological textbook style."
        );
        let response = self.generate(&self.image_model, prompt, None).await?;

        let image = response
            .parts()
            .find_map(|p| p.inline_data.as_ref())
            .map(InlineData::data_url);
        Ok(image)
    }

    async fn article_page(&self, title: &str, query: &str) -> Result<String, AppError> {
        let prompt = format!(
            r#"Genera el contenido HTML (solo el body, usando clases de Tailwind CSS) para un artículo científico web titulado "{title}".
El tema es: "{query}".
Estilo académico pero accesible."#
        );
        self.generate_text(prompt)
            .await?
            .ok_or_else(|| AppError::Upstream("Empty model response".to_string()))
    }

    async fn weekly_spotlight(&self) -> Result<Spotlight, AppError> {
        let prompt = r#"Genera un "Descubrimiento de la Semana" para la portada de una app de biología.
Debe ser un tema científico fascinante, raro o futurista (ej. CRISPR, Bacterias come-plástico, Tardígrados en la luna).

JSON esperado: {
  "title": "Titulo Impactante (3-5 palabras)",
  "subtitle": "Subtítulo explicativo breve",
  "content": "Resumen fascinante en 2 frases",
  "tag": "Categoría (ej. Genética, Astrobiología)"
}"#;
        let text = self.generate_json(prompt.to_string(), None).await?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Upstream(format!("Unreadable spotlight payload: {}", e)))
    }

    async fn changelog_features(&self) -> Result<Vec<String>, AppError> {
        let prompt = r#"Genera 3 "notas de parche" cortas y técnicas pero ficticias para una actualización de software biológico llamado "BioOS".
Ejemplos: "Optimización de renderizado mitocondrial", "Nueva base de datos de extremófilos", "Calibración de sensores de pH".
Responde JSON: { "features": ["nota1", "nota2", "nota3"] }"#;
        let text = self.generate_json(prompt.to_string(), None).await?;
        let reply: ChangelogReply = serde_json::from_str(&text)
            .map_err(|e| AppError::Upstream(format!("Unreadable changelog payload: {}", e)))?;
        Ok(reply.features)
    }
}
