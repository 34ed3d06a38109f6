//! LLM completion clients for Scribe.
//!
//! Answer generation only needs a single non-streaming completion call, so
//! this crate exposes the [`LlmClient`] trait, its request/response types and
//! the providers that implement it.
//!
//! # Example
//! ```no_run
//! use scribe_llm::{LlmClient, LlmRequest, OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new()?;
//! let request = LlmRequest::new("Summarize this notebook", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
