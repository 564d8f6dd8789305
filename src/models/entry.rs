//! Research entity model, as returned by the AI lookup or created by an upload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of answer the lookup produced.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ResponseType {
    #[default]
    ENTITY,
    QA,
    INVALID,
}

/// Biosafety classification. Unrecognized labels are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum HazardLevel {
    Safe,
    Low,
    Moderate,
    High,
    Extreme,
    #[serde(untagged)]
    Other(String),
}

/// Rank name to taxon, e.g. `kingdom` to `Bacteria`. Any rank is accepted.
pub type Taxonomy = BTreeMap<String, String>;

/// A simulated paper or web hit attached to an entity.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
}

/// A saved research entity. Loosely typed: almost every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<Taxonomy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard_level: Option<HazardLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fun_facts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_results: Option<Vec<WebResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habitat_temp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Fields this build does not know about, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionEntry {
    /// Natural key used for deduplication.
    pub fn key(&self) -> Option<&str> {
        self.scientific_name.as_deref()
    }

    /// Name shown in the search box when an entry is reopened.
    pub fn display_name(&self) -> &str {
        self.common_name
            .as_deref()
            .or(self.scientific_name.as_deref())
            .unwrap_or("")
    }

    /// Build the stand-in entry for a manually uploaded file.
    pub fn from_upload(upload: &FileUpload, today: &str) -> Self {
        let kind = upload
            .mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("Archivo Desconocido");

        Self {
            is_valid: true,
            response_type: ResponseType::ENTITY,
            scientific_name: Some(upload.file_name.clone()),
            common_name: Some(upload.file_name.clone()),
            kind: Some(kind.to_string()),
            description: Some("Archivo subido manualmente por el usuario.".to_string()),
            taxonomy: Some(Taxonomy::from([
                ("kingdom".to_string(), "Usuario".to_string()),
                ("phylum".to_string(), "Upload".to_string()),
            ])),
            bio_answer: Some("Archivo externo.".to_string()),
            file_size: Some(format!("{:.1} KB", upload.size_bytes as f64 / 1024.0)),
            last_modified: Some(today.to_string()),
            ..Default::default()
        }
    }
}

/// Metadata of a file dropped onto BioDrive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub file_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_parses_stored_json() {
        let raw = r#"{
            "isValid": true,
            "responseType": "ENTITY",
            "scientificName": "Escherichia coli",
            "type": "Bacteria",
            "taxonomy": {"kingdom": "Bacteria", "genus": "Escherichia"},
            "hazardLevel": "Low",
            "funFacts": ["Lives in your gut"]
        }"#;
        let entry: CollectionEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.key(), Some("Escherichia coli"));
        assert_eq!(entry.kind.as_deref(), Some("Bacteria"));
        assert_eq!(entry.hazard_level, Some(HazardLevel::Low));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["type"], "Bacteria");
        assert!(back.get("commonName").is_none());
    }

    #[test]
    fn test_upload_entry() {
        let upload = FileUpload {
            file_name: "cultivo.fasta".into(),
            mime_type: None,
            size_bytes: 2048,
        };
        let entry = CollectionEntry::from_upload(&upload, "01/05/2024");
        assert_eq!(entry.key(), Some("cultivo.fasta"));
        assert_eq!(entry.kind.as_deref(), Some("Archivo Desconocido"));
        assert_eq!(entry.file_size.as_deref(), Some("2.0 KB"));
        assert_eq!(entry.taxonomy.unwrap()["phylum"], "Upload");
    }

    #[test]
    fn test_loose_entry_keeps_unknown_shapes() {
        let raw = r#"{
            "isValid": true,
            "scientificName": "Vibrio fischeri",
            "taxonomy": {"kingdom": "Bacteria", "domain": "Bacteria", "subspecies": "MJ11"},
            "hazardLevel": "Unknown",
            "webResults": [{"title": "t", "url": "u", "snippet": "s"}],
            "habitat": "Marine"
        }"#;
        let entry: CollectionEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.hazard_level, Some(HazardLevel::Other("Unknown".into())));
        assert_eq!(entry.web_results.as_ref().unwrap()[0].source, "");
        assert_eq!(entry.taxonomy.as_ref().unwrap()["subspecies"], "MJ11");

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["hazardLevel"], "Unknown");
        assert_eq!(back["taxonomy"]["domain"], "Bacteria");
        assert_eq!(back["habitat"], "Marine");
        assert_eq!(back["responseType"], "ENTITY");
    }
}
