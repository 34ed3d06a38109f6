//! Retrieval configuration.
//!
//! [`RetrievalConfig`] is the validated form of the `retrieval:` section of
//! the application config ([`scribe_core::RetrievalSettings`]).

use crate::chunker::{DEFAULT_OVERLAP, DEFAULT_WINDOW_SIZE};
use crate::error::{Result, RetrievalError};
use scribe_core::RetrievalSettings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Vector index implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact brute-force cosine scan
    #[default]
    Flat,
    /// Hierarchical navigable small world graph
    Hnsw,
}

impl FromStr for IndexKind {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "flat" | "brute-force" => Ok(Self::Flat),
            "hnsw" => Ok(Self::Hnsw),
            other => Err(RetrievalError::InvalidArgument(format!(
                "Unknown index kind: '{}'. Supported: flat, hnsw",
                other
            ))),
        }
    }
}

/// Embedder adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    #[default]
    Trigram,
    Ollama,
}

impl FromStr for EmbedderKind {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trigram" => Ok(Self::Trigram),
            "ollama" => Ok(Self::Ollama),
            other => Err(RetrievalError::InvalidArgument(format!(
                "Unknown embedder: '{}'. Supported: trigram, ollama",
                other
            ))),
        }
    }
}

/// Embedder selection and transport settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedderConfig {
    pub kind: EmbedderKind,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: Option<String>,
    /// Per-request timeout for remote embedders
    pub timeout: Duration,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Trigram,
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Validated retrieval configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Words per chunk
    pub window_size: usize,
    /// Words shared between neighboring chunks
    pub overlap: usize,
    /// Default result count for queries
    pub top_k: usize,
    pub index: IndexKind,
    pub embedder: EmbedderConfig,
    /// Relevance floor used when deciding whether excerpts answer a question
    pub min_relevance: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            overlap: DEFAULT_OVERLAP,
            top_k: 5,
            index: IndexKind::Flat,
            embedder: EmbedderConfig::default(),
            min_relevance: 0.2,
        }
    }
}

impl RetrievalConfig {
    /// Build from the application settings, validating every field.
    pub fn from_settings(settings: &RetrievalSettings) -> Result<Self> {
        let config = Self {
            window_size: settings.window_size,
            overlap: settings.overlap,
            top_k: settings.top_k,
            index: settings.index.parse()?,
            embedder: EmbedderConfig {
                kind: settings.embedder.parse()?,
                model: settings.embedding_model.clone(),
                dimensions: settings.dimensions,
                endpoint: settings.endpoint.clone(),
                timeout: Duration::from_secs(settings.timeout_secs),
            },
            min_relevance: settings.min_relevance,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the parameters are consistent.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 || self.overlap >= self.window_size {
            return Err(RetrievalError::InvalidArgument(format!(
                "overlap ({}) must be less than window size ({}) and window size must be > 0",
                self.overlap, self.window_size
            )));
        }
        if self.top_k == 0 {
            return Err(RetrievalError::InvalidArgument(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.embedder.dimensions == 0 {
            return Err(RetrievalError::InvalidArgument(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
