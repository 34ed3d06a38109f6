//! Error types for the retrieval core.

use scribe_core::AppError;
use thiserror::Error;

/// Errors raised by chunking, embedding, indexing and the retrieval service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RetrievalError {
    /// Malformed arguments: chunking parameters, empty vectors, duplicate
    /// document ids. A caller bug; retrying will not help.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A vector's length disagrees with the index dimensionality.
    #[error("Dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedder failed (network, model load, timeout). Retryable.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Warming up the embedder failed; the next call tries again.
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// A chunk id referenced by the index has no entry in the document store.
    #[error("Chunk not found: {0}")]
    NotFound(String),
}

impl RetrievalError {
    /// Whether retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingUnavailable(_) | Self::InitializationFailed(_)
        )
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        AppError::Retrieval(err.to_string())
    }
}

/// Result alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;
