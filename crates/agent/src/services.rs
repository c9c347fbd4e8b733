//! Capabilities shared by every step.

use docqa_core::{config::AppConfig, AppResult, RagConfig};
use docqa_llm::{create_client, ChatMessage, LlmClient, LlmStreamTool, LlmTool, ThinkingMarkers};
use docqa_prompt::{BuiltPrompt, PromptLibrary};
use docqa_retrieval::{
    create_provider, DocumentCatalog, DocumentDirectory, LocalIndex, Retriever, RetrieverTool,
};
use std::sync::Arc;

/// Tools, prompts and settings handed to steps.
///
/// Cheap to clone; every handle is shared and read-only.
#[derive(Clone)]
pub struct AgentServices {
    pub llm: LlmTool,
    pub llm_stream: LlmStreamTool,
    pub retriever: RetrieverTool,
    pub directory: Arc<dyn DocumentDirectory>,
    pub prompts: Arc<PromptLibrary>,
    pub rag: RagConfig,
    pub thinking: ThinkingMarkers,
}

impl AgentServices {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        retriever: Arc<dyn Retriever>,
        directory: Arc<dyn DocumentDirectory>,
        prompts: PromptLibrary,
    ) -> Self {
        let model = model.into();
        Self {
            llm: LlmTool::new(client.clone(), model.clone()),
            llm_stream: LlmStreamTool::new(client, model),
            retriever: RetrieverTool::new(retriever),
            directory,
            prompts: Arc::new(prompts),
            rag: RagConfig::default(),
            thinking: ThinkingMarkers::default(),
        }
    }

    pub fn with_rag(mut self, rag: RagConfig) -> Self {
        self.rag = rag;
        self
    }

    pub fn with_thinking(mut self, thinking: ThinkingMarkers) -> Self {
        self.thinking = thinking;
        self
    }

    /// Wire the workspace's local index, catalog, prompts and the
    /// configured generation provider.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let api_key = config.resolve_api_key(&config.provider);
        let client = create_client(
            &config.provider,
            config.resolve_endpoint(&config.provider),
            api_key.as_deref(),
        )?;

        let embedder = create_provider(&config.rag.embedding)?;
        let index = LocalIndex::new(&config.workspace, embedder);
        let catalog = DocumentCatalog::new(&config.workspace);
        let prompts = PromptLibrary::load(&config.workspace)?;

        tracing::debug!(
            provider = %config.provider,
            model = %config.model,
            embedding = %config.rag.embedding.provider,
            "Agent services ready"
        );

        Ok(Self::new(
            client,
            config.model.clone(),
            Arc::new(index),
            Arc::new(catalog),
            prompts,
        )
        .with_rag(config.rag.clone())
        .with_thinking(ThinkingMarkers::new(
            config.thinking.open.clone(),
            config.thinking.close.clone(),
        )))
    }

    /// Render prompt `id` as a system + user message pair.
    pub(crate) fn prompt_messages<I, K, V>(&self, id: &str, vars: I) -> AppResult<Vec<ChatMessage>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let built = self.prompts.render(id, vars)?;
        Ok(into_messages(built, &[]))
    }
}

/// System message, then `history`, then the rendered user message.
pub(crate) fn into_messages(built: BuiltPrompt, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = built.system {
        messages.push(ChatMessage::system(system));
    }
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(built.user));
    messages
}
