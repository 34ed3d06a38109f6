//! Chunk text and metadata keyed by chunk id.

use crate::error::{Result, RetrievalError};
use crate::types::Metadata;
use std::collections::HashMap;

/// What the store keeps for a chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub content: String,
    pub metadata: Metadata,
}

/// In-memory key-value store resolving index hits to chunk text.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    chunks: HashMap<String, StoredChunk>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `chunk_id`.
    pub fn put(&mut self, chunk_id: impl Into<String>, content: impl Into<String>, metadata: Metadata) {
        self.chunks.insert(
            chunk_id.into(),
            StoredChunk {
                content: content.into(),
                metadata,
            },
        );
    }

    pub fn get(&self, chunk_id: &str) -> Result<&StoredChunk> {
        self.chunks
            .get(chunk_id)
            .ok_or_else(|| RetrievalError::NotFound(chunk_id.to_string()))
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.chunks.contains_key(chunk_id)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
