//! Grounded answering on top of the retrieval service.
//!
//! The orchestrator asks the service for excerpts and hands them to the LLM.
//! When retrieval finds nothing relevant, or fails outright, it falls back
//! to stuffing the raw source text (bounded) into the prompt instead.

use crate::service::RetrievalService;
use crate::types::{Document, SearchResult};
use scribe_core::AppResult;
use scribe_llm::{LlmClient, LlmRequest};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Scores below this make the prompt ask for cautious answers.
pub const CONFIDENCE_THRESHOLD: f32 = 0.30;

const DEFAULT_MAX_FALLBACK_CHARS: usize = 12_000;
const MAX_SNIPPET_LENGTH: usize = 150;

/// What retrieval produced for a question.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// Excerpts at or above the relevance floor, best first
    Excerpts(Vec<SearchResult>),
    /// Nothing relevant was found
    Empty,
    /// The query itself failed
    Failed(String),
}

impl RetrievalOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Excerpts(_) => "excerpts",
            Self::Empty => "empty",
            Self::Failed(_) => "failed",
        }
    }
}

/// Where part of an answer came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    /// Document title
    pub source: String,

    /// Human-readable location, e.g. "chunk 3"
    pub location: String,

    /// Short excerpt (truncated)
    pub snippet: String,
}

/// A generated answer plus how its context was assembled.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,

    /// `excerpts`, `empty` or `failed`
    pub retrieval: &'static str,

    /// Best similarity score among the excerpts, 0 on fallback
    pub max_score: f32,

    pub model: String,
}

/// Combines the retrieval service with an LLM client.
pub struct GenerationOrchestrator {
    service: Arc<RetrievalService>,
    llm: Arc<dyn LlmClient>,
    model: String,
    top_k: usize,
    min_relevance: f32,
    max_fallback_chars: usize,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("provider", &self.llm.provider_name())
            .field("model", &self.model)
            .field("top_k", &self.top_k)
            .field("min_relevance", &self.min_relevance)
            .field("max_fallback_chars", &self.max_fallback_chars)
            .finish()
    }
}

impl GenerationOrchestrator {
    pub fn new(service: Arc<RetrievalService>, llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            service,
            llm,
            model: model.into(),
            top_k: 5,
            min_relevance: 0.20,
            max_fallback_chars: DEFAULT_MAX_FALLBACK_CHARS,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Minimum cosine similarity for an excerpt to count as relevant.
    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    /// Upper bound on fallback context, in characters.
    pub fn with_max_fallback_chars(mut self, max: usize) -> Self {
        self.max_fallback_chars = max;
        self
    }

    /// Query the service and classify the result. Never fails; a query
    /// error becomes [`RetrievalOutcome::Failed`].
    pub async fn retrieve(&self, question: &str) -> RetrievalOutcome {
        match self.service.query(question, self.top_k).await {
            Ok(results) => {
                let relevant: Vec<SearchResult> = results
                    .into_iter()
                    .filter(|r| r.score >= self.min_relevance)
                    .collect();
                if relevant.is_empty() {
                    tracing::info!(
                        "No relevant excerpts (all scores below {:.2})",
                        self.min_relevance
                    );
                    RetrievalOutcome::Empty
                } else {
                    RetrievalOutcome::Excerpts(relevant)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval failed, falling back to full source text");
                RetrievalOutcome::Failed(e.to_string())
            }
        }
    }

    /// Answer `question` from the collection, or from `sources` verbatim
    /// when retrieval yields nothing usable.
    pub async fn answer(&self, question: &str, sources: &[Document]) -> AppResult<Answer> {
        let outcome = self.retrieve(question).await;

        let (context, refs, max_score) = match &outcome {
            RetrievalOutcome::Excerpts(excerpts) => {
                let max_score = excerpts.first().map(|r| r.score).unwrap_or(0.0);
                (build_context(excerpts), map_sources(excerpts), max_score)
            }
            RetrievalOutcome::Empty | RetrievalOutcome::Failed(_) => {
                tracing::info!(
                    documents = sources.len(),
                    limit = self.max_fallback_chars,
                    "Using full-text context"
                );
                (
                    fallback_context(sources, self.max_fallback_chars),
                    Vec::new(),
                    0.0,
                )
            }
        };

        let low_confidence = max_score < CONFIDENCE_THRESHOLD;
        tracing::info!(
            retrieval = outcome.label(),
            max_score,
            low_confidence,
            "Generating answer"
        );

        let request = LlmRequest::new(
            format!(
                "User question:\n{}\n\nRelevant context from documents:\n{}",
                question, context
            ),
            self.model.clone(),
        )
        .with_system(build_system_prompt(low_confidence))
        .with_temperature(0.3)
        .with_max_tokens(1000);

        let response = self.llm.complete(&request).await?;

        Ok(Answer {
            answer: response.content,
            sources: refs,
            retrieval: outcome.label(),
            max_score,
            model: response.model,
        })
    }
}

fn build_context(excerpts: &[SearchResult]) -> String {
    excerpts
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[Document {}]\n{}", i + 1, r.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Concatenate source texts, cut at `max_chars` characters.
fn fallback_context(sources: &[Document], max_chars: usize) -> String {
    let joined = sources
        .iter()
        .map(|d| format!("[{}]\n{}", d.title, d.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

fn build_system_prompt(low_confidence: bool) -> String {
    let mut prompt =
        String::from("You are a research assistant answering from the user's own sources.\n\n");

    if low_confidence {
        prompt.push_str(
            "Note: The provided material may not directly answer this question. \
             Be cautious and clear about what the sources do and do not state.\n\n",
        );
    }

    prompt.push_str(
        "Instructions:\n\
         - Answer clearly and directly, using only the material provided\n\
         - Do not refer to \"chunks\", \"embeddings\", \"context\" or document numbers\n\
         - If the material suggests but does not confirm something, say so\n\
         - If the material does not contain the answer, state: \"I could not find this information in the available sources.\"\n\
         - Keep the response concise and factual\n",
    );

    prompt
}

/// One reference per (title, chunk), in excerpt order.
fn map_sources(excerpts: &[SearchResult]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    excerpts
        .iter()
        .filter_map(|r| {
            let source = r
                .metadata
                .get("title")
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or(&r.chunk_id)
                .to_string();
            let location = match r.metadata.get("chunkIndex").and_then(|v| v.as_u64()) {
                Some(i) => format!("chunk {}", i),
                None => r.chunk_id.clone(),
            };
            seen.insert((source.clone(), location.clone()))
                .then(|| SourceRef {
                    source,
                    location,
                    snippet: truncate_snippet(&r.content, MAX_SNIPPET_LENGTH),
                })
        })
        .collect()
}

/// Cut at a word boundary within `max_chars` characters.
fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];
    match head.rfind(char::is_whitespace) {
        Some(space) => format!("{}...", &head[..space]),
        None => format!("{}...", head),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunker;
    use crate::embeddings::providers::TrigramEmbedder;
    use crate::embeddings::Embedder;
    use crate::error::{Result, RetrievalError};
    use crate::index::FlatIndex;
    use scribe_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    /// Records prompts and replies with a fixed answer.
    #[derive(Debug, Default)]
    struct CannedLlm {
        prompts: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedLlm {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.prompts.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: "Paris.".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    #[derive(Debug)]
    struct BrokenEmbedder;

    #[async_trait::async_trait]
    impl Embedder for BrokenEmbedder {
        fn name(&self) -> &str {
            "broken"
        }

        fn dimensions(&self) -> usize {
            8
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RetrievalError::EmbeddingUnavailable("connection refused".to_string()))
        }
    }

    fn service_with(embedder: Arc<dyn Embedder>) -> Arc<RetrievalService> {
        Arc::new(RetrievalService::new(
            embedder,
            Chunker::default(),
            Box::new(FlatIndex::new()),
        ))
    }

    fn atlas() -> Document {
        Document::new("atlas", "World Atlas", "The capital of France is Paris.")
    }

    #[tokio::test]
    async fn test_answer_uses_excerpts() {
        let service = service_with(Arc::new(TrigramEmbedder::new(256)));
        service.ingest(atlas()).await.unwrap();
        let llm = Arc::new(CannedLlm::default());
        let orchestrator = GenerationOrchestrator::new(service, llm.clone(), "llama3.2");

        let answer = orchestrator
            .answer("What is the capital of France?", &[atlas()])
            .await
            .unwrap();

        assert_eq!(answer.answer, "Paris.");
        assert_eq!(answer.retrieval, "excerpts");
        assert_eq!(answer.sources[0].source, "World Atlas");
        assert_eq!(answer.sources[0].location, "chunk 0");
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].prompt.contains("[Document 1]"));
        assert!(prompts[0].prompt.contains("Paris"));
    }

    #[tokio::test]
    async fn test_empty_collection_falls_back_to_full_text() {
        let service = service_with(Arc::new(TrigramEmbedder::new(256)));
        let llm = Arc::new(CannedLlm::default());
        let orchestrator = GenerationOrchestrator::new(service, llm.clone(), "llama3.2");

        let answer = orchestrator.answer("capital of France?", &[atlas()]).await.unwrap();

        assert_eq!(answer.retrieval, "empty");
        assert!(answer.sources.is_empty());
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].prompt.contains("[World Atlas]"));
        assert!(prompts[0].prompt.contains("The capital of France is Paris."));
    }

    #[tokio::test]
    async fn test_failed_retrieval_falls_back() {
        let service = service_with(Arc::new(BrokenEmbedder));
        let llm = Arc::new(CannedLlm::default());
        let orchestrator = GenerationOrchestrator::new(service, llm.clone(), "llama3.2");

        let outcome = orchestrator.retrieve("anything").await;
        assert!(matches!(outcome, RetrievalOutcome::Failed(ref m) if m.contains("connection refused")));

        let answer = orchestrator.answer("anything", &[atlas()]).await.unwrap();
        assert_eq!(answer.retrieval, "failed");
        assert!(llm.prompts.lock().unwrap()[0].prompt.contains("Paris"));
    }

    #[tokio::test]
    async fn test_irrelevant_excerpts_count_as_empty() {
        let service = service_with(Arc::new(TrigramEmbedder::new(256)));
        service.ingest(atlas()).await.unwrap();
        let orchestrator =
            GenerationOrchestrator::new(service, Arc::new(CannedLlm::default()), "m")
                .with_min_relevance(1.1);

        assert_eq!(orchestrator.retrieve("capital of France").await, RetrievalOutcome::Empty);
    }

    #[tokio::test]
    async fn test_fallback_respects_configured_budget() {
        let service = service_with(Arc::new(TrigramEmbedder::new(256)));
        let llm = Arc::new(CannedLlm::default());
        let orchestrator = GenerationOrchestrator::new(service, llm.clone(), "llama3.2")
            .with_max_fallback_chars(20);

        let long = Document::new("big", "Big", "lorem ipsum ".repeat(500));
        orchestrator.answer("anything", &[long]).await.unwrap();

        let prompts = llm.prompts.lock().unwrap();
        let context = prompts[0]
            .prompt
            .split("Relevant context from documents:\n")
            .nth(1)
            .unwrap();
        assert_eq!(context.chars().count(), 20);
    }

    #[test]
    fn test_fallback_context_is_bounded() {
        let long = Document::new("big", "Big", "word ".repeat(10_000));
        let context = fallback_context(&[long], 100);
        assert_eq!(context.chars().count(), 100);
        assert!(context.starts_with("[Big]\n"));
    }

    #[test]
    fn test_fallback_context_multibyte_safe() {
        let doc = Document::new("u", "Ünïcode", "çà va très bien");
        let context = fallback_context(&[doc], 10);
        assert_eq!(context.chars().count(), 10);
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("Short text", 100), "Short text");

        let result = truncate_snippet(
            "This is a very long text that needs to be truncated at some point",
            30,
        );
        assert!(result.ends_with("..."));
        assert!(result.chars().count() <= 33);
    }

    #[test]
    fn test_system_prompt_confidence() {
        assert!(!build_system_prompt(false).contains("may not directly answer"));
        assert!(build_system_prompt(true).contains("Be cautious"));
    }
}
