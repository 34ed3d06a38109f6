//! Search command handler.

use super::build_collection;
use clap::Args;
use scribe_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Rank chunks of the given sources against a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Files or directories to search
    #[arg(long, required = true)]
    pub path: Vec<PathBuf>,

    /// Number of results (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let (service, _) = build_collection(config, &self.path).await?;
        let limit = self.top_k.unwrap_or(config.retrieval.top_k);
        let results = service.query(&self.query, limit).await?;

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "results": results,
                "stats": service.stats().await,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No results.");
            return Ok(());
        }

        for (i, result) in results.iter().enumerate() {
            let title = result
                .metadata
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or(&result.chunk_id);
            println!("{}. {} (score {:.3})", i + 1, title, result.score);
            println!("   {}\n", result.content);
        }

        Ok(())
    }
}
