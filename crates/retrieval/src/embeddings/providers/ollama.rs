//! Ollama embedder.
//!
//! Calls the local Ollama `/api/embeddings` endpoint, e.g. with
//! `nomic-embed-text`. Ollama embeds one prompt per request, so batches are
//! sent sequentially.

use crate::config::EmbedderConfig;
use crate::embeddings::provider::Embedder;
use crate::error::{Result, RetrievalError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";
const PROBE_TEXT: &str = "warm up";

/// Embedder backed by an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaEmbedder {
    /// Build the HTTP client. No request is made until [`Embedder::warm_up`]
    /// or the first embed.
    pub fn new(config: &EmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RetrievalError::EmbeddingUnavailable(format!(
                    "Failed to create HTTP client for Ollama: {}",
                    e
                ))
            })?;

        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let body = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::EmbeddingUnavailable(format!(
                        "Ollama request timed out: {}",
                        e
                    ))
                } else {
                    RetrievalError::EmbeddingUnavailable(format!(
                        "Failed to reach Ollama at {}: {}",
                        self.base_url, e
                    ))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|r| r.error)
                .unwrap_or(text);
            return Err(RetrievalError::EmbeddingUnavailable(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            RetrievalError::EmbeddingUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        if parsed.embedding.len() != self.dimensions {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimensions,
                actual: parsed.embedding.len(),
            });
        }

        debug!(dimensions = parsed.embedding.len(), "Received embedding");
        Ok(parsed.embedding)
    }
}

#[async_trait::async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn warm_up(&self) -> Result<()> {
        self.request(PROBE_TEXT).await.map(|_| ()).map_err(|e| {
            RetrievalError::InitializationFailed(format!(
                "Ollama model '{}' not ready at {} ({}). Run: ollama pull {}",
                self.model, self.base_url, e, self.model
            ))
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_config() -> EmbedderConfig {
        EmbedderConfig {
            kind: crate::config::EmbedderKind::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            // Port 9 (discard) is closed on test machines.
            endpoint: Some("http://127.0.0.1:9/".to_string()),
            timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let embedder = OllamaEmbedder::new(&unreachable_config()).unwrap();
        assert_eq!(embedder.base_url(), "http://127.0.0.1:9");
        assert_eq!(embedder.model(), "nomic-embed-text");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_new_defaults_to_local_server() {
        let config = EmbedderConfig {
            endpoint: None,
            ..unreachable_config()
        };
        let embedder = OllamaEmbedder::new(&config).unwrap();
        assert_eq!(embedder.base_url(), DEFAULT_OLLAMA_URL);
    }

    #[tokio::test]
    async fn test_embed_unreachable_is_unavailable() {
        let embedder = OllamaEmbedder::new(&unreachable_config()).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_warm_up_unreachable_is_initialization_failure() {
        let embedder = OllamaEmbedder::new(&unreachable_config()).unwrap();
        let err = embedder.warm_up().await.unwrap_err();
        assert!(matches!(err, RetrievalError::InitializationFailed(_)));
    }
}
