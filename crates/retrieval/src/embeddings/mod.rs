//! Embedding providers used by the local index.

pub mod ollama;
pub mod provider;
pub mod trigram;

pub use ollama::OllamaEmbeddingProvider;
pub use provider::{create_provider, EmbeddingProvider};
pub use trigram::TrigramProvider;
