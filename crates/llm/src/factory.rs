//! Generation provider factory.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a chat client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai", "groq")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by OpenAI-compatible endpoints
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI-compatible provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => OpenAiClient::with_base_url(url, api_key),
                None => OpenAiClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
    }
}
