//! Configuration for sync passes and queries.

use crate::error::ConfigError;
use folio_model::{DocumentDetail, DEFAULT_OVERWRITE_FIELDS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;

/// File extensions ingested by default.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &["pdf", "txt", "html"];

/// Fields requested from enrichment providers by default.
pub const DEFAULT_ENRICHMENT_FIELDS: &[&str] = &[
    "citation_count",
    "source_quality",
    "is_retracted",
    "doi",
    "title",
    "authors",
];

/// When enrichment providers are consulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentPolicy {
    /// On ingestion and on every metadata refresh.
    #[default]
    Always,
    /// Only when a file is ingested.
    IngestOnly,
    /// Never; the library is the only source.
    Never,
}

impl EnrichmentPolicy {
    pub fn on_ingest(self) -> bool {
        !matches!(self, EnrichmentPolicy::Never)
    }

    pub fn on_refresh(self) -> bool {
        matches!(self, EnrichmentPolicy::Always)
    }
}

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Ingestible file extensions, without the dot. Compared case-insensitively.
    pub file_extensions: Vec<String>,
    /// Fields an enrichment provider may overwrite once set.
    pub overwrite_fields: BTreeSet<String>,
    /// Fields requested from enrichment providers.
    pub enrichment_fields: Vec<String>,
    pub enrichment: EnrichmentPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            file_extensions: DEFAULT_FILE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            overwrite_fields: DEFAULT_OVERWRITE_FIELDS.iter().map(|s| s.to_string()).collect(),
            enrichment_fields: DEFAULT_ENRICHMENT_FIELDS.iter().map(|s| s.to_string()).collect(),
            enrichment: EnrichmentPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Checks the configuration before a pass touches anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::NoExtensions);
        }
        if self.overwrite_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::BlankField("overwrite_fields"));
        }
        if self.enrichment_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::BlankField("enrichment_fields"));
        }
        for name in self.unrecognized_enrichment_fields() {
            warn!("Enrichment field '{}' is not a metadata field and restricts nothing", name);
        }
        Ok(())
    }

    /// Requested enrichment fields that name no structured metadata field.
    ///
    /// Auxiliary values are never restricted, so these select nothing.
    /// Overwrite fields are exempt: an unknown name there governs the
    /// auxiliary key of the same name.
    pub fn unrecognized_enrichment_fields(&self) -> Vec<&str> {
        self.enrichment_fields
            .iter()
            .map(String::as_str)
            .filter(|name| !DocumentDetail::is_structured_field(name))
            .collect()
    }

    /// Returns true if `path` has one of the configured extensions.
    pub fn is_ingestible(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.file_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.'))
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        parse(text)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration for answering questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of evidence pieces to retrieve.
    pub evidence_k: usize,
    /// Maximum number of sources cited in an answer.
    pub max_sources: usize,
    pub answer_length: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_llm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            evidence_k: 10,
            max_sources: 5,
            answer_length: "about 200 words, but can be longer".to_string(),
            llm: None,
            summary_llm: None,
            embedding: None,
        }
    }
}

impl QueryConfig {
    /// `evidence_k` must exceed `max_sources`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sources == 0 {
            return Err(ConfigError::NoSources);
        }
        if self.evidence_k <= self.max_sources {
            return Err(ConfigError::EvidenceNotAboveSources {
                evidence_k: self.evidence_k,
                max_sources: self.max_sources,
            });
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        parse(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read(path)?;
        config.validate()?;
        Ok(config)
    }
}

fn parse<T: DeserializeOwned>(text: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(text)?)
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}
