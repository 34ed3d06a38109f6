//! Command handlers for the Scribe CLI.
//!
//! Each run builds a fresh in-memory collection from the given paths; no
//! index is kept between runs.

pub mod ask;
pub mod chunk;
pub mod search;

pub use ask::AskCommand;
pub use chunk::ChunkCommand;
pub use search::SearchCommand;

use crate::sources;
use scribe_core::{config::AppConfig, AppResult};
use scribe_retrieval::{Document, RetrievalConfig, RetrievalError, RetrievalService};
use std::path::PathBuf;
use std::sync::Arc;

/// Load `paths` and ingest them into a new service built from `config`.
pub(crate) async fn build_collection(
    config: &AppConfig,
    paths: &[PathBuf],
) -> AppResult<(Arc<RetrievalService>, Vec<Document>)> {
    let retrieval = RetrievalConfig::from_settings(&config.retrieval)?;
    let service = Arc::new(RetrievalService::from_config(&retrieval)?);
    service.init().await?;

    let documents = sources::load_documents(paths)?;
    let mut chunks = 0;
    for document in &documents {
        match service.ingest(document.clone()).await {
            Ok(report) => chunks += report.chunks,
            Err(RetrievalError::InvalidArgument(reason)) => {
                tracing::warn!("Skipping {}: {}", document.id, reason);
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        "Ingested {} documents ({} chunks)",
        documents.len(),
        chunks
    );
    Ok((service, documents))
}
