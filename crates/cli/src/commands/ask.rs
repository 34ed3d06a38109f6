//! Ask command handler.
//!
//! Answers a question from the given sources via retrieval and the LLM.

use super::build_collection;
use clap::Args;
use scribe_core::{config::AppConfig, AppResult};
use scribe_llm::create_client;
use scribe_retrieval::GenerationOrchestrator;
use std::path::PathBuf;

/// Answer a question grounded in the given sources
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Files or directories to answer from
    #[arg(long, required = true)]
    pub path: Vec<PathBuf>,

    /// Number of excerpts to retrieve (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let (service, documents) = build_collection(config, &self.path).await?;

        let client = create_client(&config.provider, config.endpoint.as_deref())?;

        let orchestrator = GenerationOrchestrator::new(service, client, config.model.clone())
            .with_top_k(self.top_k.unwrap_or(config.retrieval.top_k))
            .with_min_relevance(config.retrieval.min_relevance)
            .with_max_fallback_chars(config.retrieval.max_fallback_chars);

        let answer = orchestrator.answer(&self.question, &documents).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": answer.answer,
                "sources": answer.sources,
                "retrieval": answer.retrieval,
                "model": answer.model,
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer.answer);

            if !answer.sources.is_empty() {
                println!("\nSources:");
                for source in &answer.sources {
                    println!("  - {} ({})", source.source, source.location);
                }
            }
        }

        Ok(())
    }
}
