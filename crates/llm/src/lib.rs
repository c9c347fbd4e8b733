//! Generation capability for docqa.
//!
//! A provider-agnostic chat client abstraction, two HTTP providers, the
//! `LlmTool` capability wrapper used by pipeline steps, and the streaming
//! filter that strips private reasoning spans from model output.
//!
//! # Providers
//! - **Ollama**: local runtime, `/api/chat` (default)
//! - **OpenAI-compatible**: `/chat/completions` (OpenAI, Groq, vLLM, ...)
//!
//! # Example
//! ```no_run
//! use docqa_llm::{ChatMessage, LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new(vec![ChatMessage::user("Hello!")], "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod thinking;
pub mod tool;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk,
    LlmUsage,
};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use thinking::{strip_thinking, ThinkingFilter, ThinkingMarkers};
pub use tool::{LlmStreamTool, LlmTool, TokenStream};
pub use types::ProviderType;
