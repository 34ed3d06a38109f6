//! Retrieval service: chunk, embed, index and resolve.
//!
//! [`RetrievalService`] owns one collection (a vector index plus the
//! document store) and coordinates the embedder around it. It is a plain
//! value; hosts construct it and share it through `Arc`.
//!
//! Concurrency model:
//! - index and store sit behind one `RwLock`, so readers never see one
//!   without the other;
//! - queries hold the read lock only while searching and resolving;
//! - ingests embed everything first and take the write lock once to commit,
//!   so dropping an ingest future before that point leaves no trace;
//! - a separate mutex serializes ingests and `close`, which keeps the
//!   duplicate id check, the commit and the lifecycle state consistent;
//! - lock order is always the ingest mutex, then the state mutex.

use crate::chunker::Chunker;
use crate::config::RetrievalConfig;
use crate::embeddings::{create_embedder, Embedder};
use crate::error::{Result, RetrievalError};
use crate::index::{create_index, VectorIndex};
use crate::store::DocumentStore;
use crate::types::{CollectionStats, Document, IngestReport, SearchResult, ServiceState};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
struct Collection {
    index: Box<dyn VectorIndex>,
    store: DocumentStore,
    documents: HashSet<String>,
}

impl Collection {
    fn clear(&mut self) {
        self.index.clear();
        self.store.clear();
        self.documents.clear();
    }
}

/// Ingests documents and answers nearest-neighbor queries over their chunks.
#[derive(Debug)]
pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    default_limit: usize,
    state: Mutex<ServiceState>,
    collection: RwLock<Collection>,
    ingest_lock: Mutex<()>,
}

impl RetrievalService {
    /// Assemble a service from its parts. The service starts
    /// [`ServiceState::Uninitialized`] with an empty collection.
    pub fn new(embedder: Arc<dyn Embedder>, chunker: Chunker, index: Box<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            chunker,
            default_limit: 5,
            state: Mutex::new(ServiceState::Uninitialized),
            collection: RwLock::new(Collection {
                index,
                store: DocumentStore::new(),
                documents: HashSet::new(),
            }),
            ingest_lock: Mutex::new(()),
        }
    }

    /// Build the embedder, chunker and index named by `config`.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        config.validate()?;
        let embedder = create_embedder(&config.embedder)?;
        let chunker = Chunker::new(config.window_size, config.overlap)?;
        let index = create_index(config.index);

        info!(
            embedder = embedder.name(),
            index = ?config.index,
            window_size = config.window_size,
            overlap = config.overlap,
            "Created retrieval service"
        );

        Ok(Self::new(embedder, chunker, index).with_default_limit(config.top_k))
    }

    /// Result count used by [`RetrievalService::search`].
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub async fn state(&self) -> ServiceState {
        *self.state.lock().await
    }

    /// Warm up the embedder. A no-op when already ready.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::InitializationFailed`]; the service stays
    /// uninitialized and the next call tries again.
    pub async fn init(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == ServiceState::Ready {
            return Ok(());
        }

        self.embedder.warm_up().await.map_err(|e| match e {
            RetrievalError::InitializationFailed(_) => e,
            other => RetrievalError::InitializationFailed(other.to_string()),
        })?;

        *state = ServiceState::Ready;
        info!(embedder = self.embedder.name(), "Retrieval service ready");
        Ok(())
    }

    /// Drop the collection and return to [`ServiceState::Uninitialized`].
    ///
    /// Waits for an in-flight ingest to finish or be dropped first.
    pub async fn close(&self) {
        let _ingest = self.ingest_lock.lock().await;
        let mut state = self.state.lock().await;
        self.collection.write().await.clear();
        *state = ServiceState::Uninitialized;
        info!("Retrieval service closed");
    }

    /// Chunk, embed and commit a document.
    ///
    /// All chunks become visible together or not at all. A document whose
    /// text has no words is accepted with zero chunks.
    ///
    /// # Errors
    ///
    /// - [`RetrievalError::InvalidArgument`] for an empty or already
    ///   ingested document id
    /// - [`RetrievalError::EmbeddingUnavailable`] when any chunk fails to
    ///   embed
    /// - [`RetrievalError::DimensionMismatch`] when the embedder disagrees
    ///   with the index
    /// - [`RetrievalError::InitializationFailed`] from lazy warm-up
    #[instrument(skip(self, document), fields(document_id = %document.id))]
    pub async fn ingest(&self, document: Document) -> Result<IngestReport> {
        let _ingest = self.ingest_lock.lock().await;
        self.init().await?;

        if document.id.trim().is_empty() {
            return Err(RetrievalError::InvalidArgument(
                "document id must not be empty".to_string(),
            ));
        }
        if self.collection.read().await.documents.contains(&document.id) {
            return Err(RetrievalError::InvalidArgument(format!(
                "document '{}' is already ingested",
                document.id
            )));
        }

        let words = document.text.split_whitespace().count();
        let chunks = self.chunker.chunk_document(&document);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&texts).await?
        };
        if vectors.len() != chunks.len() {
            return Err(RetrievalError::EmbeddingUnavailable(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        debug!(chunks = chunks.len(), "Embedded chunks");

        let entries: Vec<(String, Vec<f32>)> = chunks
            .iter()
            .map(|c| c.chunk_id.clone())
            .zip(vectors)
            .collect();

        let mut collection = self.collection.write().await;
        collection.index.add(entries)?;
        let committed = chunks.len();
        for chunk in chunks {
            collection.store.put(chunk.chunk_id, chunk.text, chunk.metadata);
        }
        collection.documents.insert(document.id.clone());
        drop(collection);

        info!(chunks = committed, words, "Ingested document");

        Ok(IngestReport {
            document_id: document.id,
            chunks: committed,
            words,
            ingested_at: Utc::now(),
        })
    }

    /// Return up to `limit` chunks most similar to `text`, best first.
    ///
    /// Index hits missing from the store are logged and skipped.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::EmbeddingUnavailable`] when the query cannot be
    /// embedded, [`RetrievalError::InitializationFailed`] from lazy warm-up.
    #[instrument(skip(self, text), fields(query_len = text.len()))]
    pub async fn query(&self, text: &str, limit: usize) -> Result<Vec<SearchResult>> {
        self.init().await?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text).await?;

        let collection = self.collection.read().await;
        let hits = collection.index.search(&embedding, limit)?;

        let mut results = Vec::with_capacity(hits.len());
        for (chunk_id, score) in hits {
            match collection.store.get(&chunk_id) {
                Ok(chunk) => results.push(SearchResult {
                    chunk_id,
                    content: chunk.content.clone(),
                    score,
                    metadata: chunk.metadata.clone(),
                }),
                Err(e) => warn!(error = %e, "Skipping unresolved index entry"),
            }
        }

        debug!(
            results = results.len(),
            top_score = ?results.first().map(|r| r.score),
            "Query complete"
        );
        Ok(results)
    }

    /// [`RetrievalService::query`] with the configured default limit.
    pub async fn search(&self, text: &str) -> Result<Vec<SearchResult>> {
        self.query(text, self.default_limit).await
    }

    /// Remove every document, chunk and vector. Safe to call repeatedly.
    pub async fn clear(&self) {
        let mut collection = self.collection.write().await;
        let documents = collection.documents.len();
        collection.clear();
        info!(documents, "Cleared collection");
    }

    pub async fn stats(&self) -> CollectionStats {
        let state = self.state().await;
        let collection = self.collection.read().await;
        CollectionStats {
            state,
            documents: collection.documents.len(),
            chunks: collection.store.len(),
            vectors: collection.index.len(),
            dimensions: collection.index.dimensions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramEmbedder;
    use crate::index::FlatIndex;

    fn service(window: usize, overlap: usize) -> RetrievalService {
        RetrievalService::new(
            Arc::new(TrigramEmbedder::new(128)),
            Chunker::new(window, overlap).unwrap(),
            Box::new(FlatIndex::new()),
        )
    }

    #[tokio::test]
    async fn test_ingest_then_query() {
        let service = service(500, 50);
        let report = service
            .ingest(Document::new("geo", "Geography", "The capital of France is Paris."))
            .await
            .unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(report.words, 6);

        let results = service.query("What is the capital of France?", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("Paris"));
        assert_eq!(results[0].chunk_id, "geo_chunk_0");
        assert_eq!(results[0].metadata["documentId"], "geo");
    }

    #[tokio::test]
    async fn test_lazy_init_on_first_call() {
        let service = service(10, 2);
        assert_eq!(service.state().await, ServiceState::Uninitialized);

        service.query("anything", 3).await.unwrap();
        assert_eq!(service.state().await, ServiceState::Ready);
    }

    #[tokio::test]
    async fn test_duplicate_document_rejected() {
        let service = service(10, 2);
        service.ingest(Document::new("d", "D", "one two three")).await.unwrap();

        let err = service
            .ingest(Document::new("d", "D", "four five six"))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidArgument(_)));
        assert_eq!(service.stats().await.chunks, 1);
    }

    #[tokio::test]
    async fn test_empty_document_has_zero_chunks() {
        let service = service(10, 2);
        let report = service.ingest(Document::new("blank", "Blank", "  \n ")).await.unwrap();

        assert_eq!(report.chunks, 0);
        let stats = service.stats().await;
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.vectors, 0);
    }

    #[tokio::test]
    async fn test_empty_document_id_rejected() {
        let service = service(10, 2);
        assert!(matches!(
            service.ingest(Document::new(" ", "T", "text")).await,
            Err(RetrievalError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_unresolved_hits_are_skipped() {
        let service = service(10, 2);
        service.ingest(Document::new("d", "D", "alpha beta gamma")).await.unwrap();
        {
            let mut collection = service.collection.write().await;
            collection
                .index
                .add(vec![("ghost_chunk_0".to_string(), vec![1.0; 128])])
                .unwrap();
        }

        let results = service.query("alpha beta gamma", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk_id, "d_chunk_0");
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let service = service(4, 1);
        service
            .ingest(Document::new("d", "D", "one two three four five six seven"))
            .await
            .unwrap();

        let stats = service.stats().await;
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.vectors, 2);
        assert_eq!(stats.dimensions, Some(128));

        service.clear().await;
        let stats = service.stats().await;
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.chunks, 0);
        assert_eq!(stats.dimensions, None);

        // Cleared ids may be ingested again.
        service.ingest(Document::new("d", "D", "again")).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_resets_state() {
        let service = service(10, 2);
        service.init().await.unwrap();
        service.ingest(Document::new("d", "D", "words here")).await.unwrap();

        service.close().await;

        let stats = service.stats().await;
        assert_eq!(stats.state, ServiceState::Uninitialized);
        assert_eq!(stats.chunks, 0);
    }

    #[tokio::test]
    async fn test_from_config_uses_top_k() {
        let config = RetrievalConfig {
            top_k: 2,
            window_size: 3,
            overlap: 0,
            ..Default::default()
        };
        let service = RetrievalService::from_config(&config).unwrap();
        service
            .ingest(Document::new("d", "D", "red apple green pear yellow banana blue plum"))
            .await
            .unwrap();

        assert_eq!(service.search("apple").await.unwrap().len(), 2);
    }
}
