//! Embedder trait and factory.

use crate::config::{EmbedderConfig, EmbedderKind};
use crate::error::{Result, RetrievalError};
use std::sync::Arc;

/// Turns text into fixed-length vectors.
///
/// Implementations must be safe to share across concurrent ingests and
/// queries. Every vector an embedder returns has [`Embedder::dimensions`]
/// entries.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Short identifier such as `trigram` or `ollama`.
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    /// Prepare the embedder (load a model, probe a server).
    ///
    /// Called once before the first ingest or query. Failures surface as
    /// [`RetrievalError::InitializationFailed`].
    async fn warm_up(&self) -> Result<()> {
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order. The default embeds one at a
    /// time and stops at the first failure.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Create the embedder selected by `config`.
pub fn create_embedder(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>> {
    if config.dimensions == 0 {
        return Err(RetrievalError::InvalidArgument(
            "embedding dimensions must be greater than zero".to_string(),
        ));
    }

    match config.kind {
        EmbedderKind::Trigram => Ok(Arc::new(super::providers::TrigramEmbedder::new(
            config.dimensions,
        ))),
        EmbedderKind::Ollama => Ok(Arc::new(super::providers::OllamaEmbedder::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_trigram_embedder() {
        let embedder = create_embedder(&EmbedderConfig::default()).unwrap();
        assert_eq!(embedder.name(), "trigram");
        assert_eq!(embedder.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_embedder() {
        let config = EmbedderConfig {
            kind: EmbedderKind::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            ..Default::default()
        };
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "ollama");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_create_rejects_zero_dimensions() {
        let config = EmbedderConfig {
            dimensions: 0,
            ..Default::default()
        };
        assert!(matches!(
            create_embedder(&config),
            Err(RetrievalError::InvalidArgument(_))
        ));
    }

    #[derive(Debug)]
    struct LengthEmbedder;

    #[async_trait::async_trait]
    impl Embedder for LengthEmbedder {
        fn name(&self) -> &str {
            "length"
        }

        fn dimensions(&self) -> usize {
            1
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text == "boom" {
                return Err(RetrievalError::EmbeddingUnavailable("boom".to_string()));
            }
            Ok(vec![text.len() as f32])
        }
    }

    #[tokio::test]
    async fn test_default_embed_batch_preserves_order() {
        let texts = vec!["a".to_string(), "abc".to_string(), "ab".to_string()];
        let vectors = LengthEmbedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![3.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn test_default_embed_batch_stops_on_failure() {
        let texts = vec!["a".to_string(), "boom".to_string()];
        assert!(LengthEmbedder.embed_batch(&texts).await.is_err());
    }
}
