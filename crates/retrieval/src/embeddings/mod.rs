//! Text embedding for the retrieval core.
//!
//! The service depends only on the [`Embedder`] trait. Adapters:
//! - [`providers::trigram::TrigramEmbedder`]: deterministic, offline, hash based
//! - [`providers::ollama::OllamaEmbedder`]: neural embeddings from a local Ollama server

pub mod provider;
pub mod providers;

pub use provider::{create_embedder, Embedder};
