//! LLM provider factory.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use scribe_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client for the named provider.
///
/// `endpoint` overrides the provider's default URL.
pub fn create_client(provider: &str, endpoint: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url)?,
                None => OllamaClient::new()?,
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Llm(format!(
            "Unknown provider: {}. Supported: ollama",
            provider
        ))),
    }
}
