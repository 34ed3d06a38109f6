//! Chunk command handler.
//!
//! Shows how a file splits into overlapping word windows.

use crate::sources;
use clap::Args;
use scribe_core::{config::AppConfig, AppError, AppResult};
use scribe_retrieval::Chunker;
use std::path::PathBuf;

/// Split a file into chunks and print them
#[derive(Args, Debug)]
pub struct ChunkCommand {
    /// File to chunk
    pub file: PathBuf,

    /// Words per chunk (default: retrieval.windowSize)
    #[arg(long)]
    pub window: Option<usize>,

    /// Words shared by neighboring chunks (default: retrieval.overlap)
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunkCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chunk command for {}", self.file.display());

        let chunker = Chunker::new(
            self.window.unwrap_or(config.retrieval.window_size),
            self.overlap.unwrap_or(config.retrieval.overlap),
        )?;

        let document = sources::load_file(&self.file)?.ok_or_else(|| {
            AppError::Other(format!("{} is not a text file", self.file.display()))
        })?;
        let chunks = chunker.chunk_document(&document);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        } else {
            for chunk in &chunks {
                println!("[{}] {}", chunk.chunk_id, chunk.text);
            }
            println!(
                "\n{} chunks (window {}, overlap {})",
                chunks.len(),
                chunker.window_size(),
                chunker.overlap()
            );
        }

        Ok(())
    }
}
