//! Retrieval type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque key-value metadata carried from documents to their chunks.
pub type Metadata = serde_json::Map<String, Value>;

/// A source document handed to the retrieval service for ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Caller-supplied identifier, unique for the lifetime of a collection
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Full text content
    pub text: String,

    /// Arbitrary metadata (e.g. source type, file path)
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A contiguous word window of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{document_id}_chunk_{index}`
    pub chunk_id: String,

    /// Parent document id
    pub document_id: String,

    /// Zero-based position within the document
    pub index: usize,

    /// Chunk text (words joined by single spaces)
    pub text: String,

    /// Parent metadata plus `chunkIndex`, `documentId` and `title`
    pub metadata: Metadata,
}

/// Build the deterministic chunk identifier.
pub fn chunk_id(document_id: &str, index: usize) -> String {
    format!("{}_chunk_{}", document_id, index)
}

/// A resolved search hit.
///
/// `score` is the cosine similarity between the query embedding and the
/// chunk embedding, in `[-1.0, 1.0]`; higher is more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub content: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Summary of a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,

    /// Number of chunks committed
    pub chunks: usize,

    /// Words in the source text
    pub words: usize,

    pub ingested_at: DateTime<Utc>,
}

/// Lifecycle state of the retrieval service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Embedder not warmed up yet (or closed)
    Uninitialized,
    /// Embedder warmed up; ingest and query run without setup
    Ready,
}

/// Point-in-time statistics for a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub state: ServiceState,

    /// Documents committed since the last clear
    pub documents: usize,

    /// Chunks in the document store
    pub chunks: usize,

    /// Entries in the vector index
    pub vectors: usize,

    /// Established embedding dimensionality, if any vector was added
    pub dimensions: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_format() {
        assert_eq!(chunk_id("doc-1", 0), "doc-1_chunk_0");
        assert_eq!(chunk_id("notes.md", 12), "notes.md_chunk_12");
    }

    #[test]
    fn test_document_builder_metadata() {
        let doc = Document::new("d1", "Title", "body").with_metadata("sourceType", "pdf");
        assert_eq!(doc.metadata.get("sourceType"), Some(&Value::from("pdf")));
    }

    #[test]
    fn test_service_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ServiceState::Ready).unwrap(), "\"ready\"");
    }
}
