//! Local retrieval core.
//!
//! Splits documents into overlapping word windows, embeds them, indexes the
//! vectors and answers nearest-neighbor queries so answers can be grounded
//! in a few relevant excerpts instead of whole documents.
//!
//! Flow: [`Document`] -> [`Chunker`] -> [`Embedder`] -> [`VectorIndex`] +
//! [`DocumentStore`], all coordinated by [`RetrievalService`].
//! [`GenerationOrchestrator`] sits on top and talks to the LLM.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod orchestrator;
pub mod service;
pub mod store;
pub mod types;

pub use chunker::{chunk, Chunker};
pub use config::{EmbedderConfig, EmbedderKind, IndexKind, RetrievalConfig};
pub use embeddings::{create_embedder, Embedder};
pub use error::{Result, RetrievalError};
pub use index::{cosine_similarity, create_index, FlatIndex, HnswIndex, HnswParams, VectorIndex};
pub use orchestrator::{Answer, GenerationOrchestrator, RetrievalOutcome, SourceRef};
pub use service::RetrievalService;
pub use store::{DocumentStore, StoredChunk};
pub use types::{
    Chunk, CollectionStats, Document, IngestReport, Metadata, SearchResult, ServiceState,
};
