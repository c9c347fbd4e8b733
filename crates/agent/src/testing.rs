//! Fakes shared by the agent tests.

use crate::services::AgentServices;
use docqa_core::{AppError, AppResult, RagConfig};
use docqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use docqa_prompt::PromptLibrary;
use docqa_retrieval::{DocumentDirectory, DocumentRecord, RetrievedPassage, Retriever};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Generation client answering by system prompt.
///
/// A reply is chosen by the first rule whose needle occurs in the system
/// message. Streams replay `stream_chunks`, optionally ending in an error.
#[derive(Default)]
pub(crate) struct FakeLlm {
    pub rules: Vec<(String, Result<String, String>)>,
    pub stream_chunks: Vec<String>,
    pub stream_error: Option<String>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl FakeLlm {
    pub fn reply(mut self, needle: &str, text: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(text.to_string())));
        self
    }

    pub fn fail(mut self, needle: &str, message: &str) -> Self {
        self.rules.push((needle.to_string(), Err(message.to_string())));
        self
    }

    pub fn streaming(mut self, chunks: &[&str]) -> Self {
        self.stream_chunks = chunks.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Requests whose system message contains `needle`.
    pub fn requests_for(&self, needle: &str) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.messages.first().is_some_and(|m| m.content.contains(needle)))
            .cloned()
            .collect()
    }

    fn answer_for(&self, request: &LlmRequest) -> AppResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        let system = request
            .messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        self.rules
            .iter()
            .find(|(needle, _)| system.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone().map_err(AppError::Llm))
            .unwrap_or_else(|| Err(AppError::Llm("no scripted reply".into())))
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = self.answer_for(request)?;
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(1, 1),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        self.requests.lock().unwrap().push(request.clone());
        let mut items: Vec<AppResult<LlmStreamChunk>> = self
            .stream_chunks
            .iter()
            .map(|c| Ok(LlmStreamChunk::text(c.clone())))
            .collect();
        if let Some(message) = &self.stream_error {
            items.push(Err(AppError::Llm(message.clone())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Retriever keyed by namespace, recording every call.
#[derive(Default)]
pub(crate) struct FakeIndex {
    pub passages: HashMap<String, Vec<RetrievedPassage>>,
    pub failing: Vec<String>,
    pub calls: Mutex<Vec<(String, String, usize)>>,
}

impl FakeIndex {
    pub fn with(mut self, namespace: &str, texts: &[(&str, Option<u32>)]) -> Self {
        self.passages.insert(
            namespace.to_string(),
            texts
                .iter()
                .map(|(t, p)| RetrievedPassage::new(*t, *p))
                .collect(),
        );
        self
    }

    pub fn failing_on(mut self, namespace: &str) -> Self {
        self.failing.push(namespace.to_string());
        self
    }
}

#[async_trait::async_trait]
impl Retriever for FakeIndex {
    async fn search(
        &self,
        query: &str,
        namespace: &str,
        top_k: usize,
    ) -> AppResult<Vec<RetrievedPassage>> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), namespace.to_string(), top_k));
        if self.failing.iter().any(|n| n == namespace) {
            return Err(AppError::Retrieval(format!("{} offline", namespace)));
        }
        Ok(self
            .passages
            .get(namespace)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(top_k)
            .collect())
    }
}

/// In-memory document directory.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub documents: Vec<DocumentRecord>,
}

impl FakeDirectory {
    pub fn with(mut self, id: &str, name: &str, owner: &str) -> Self {
        self.documents
            .push(DocumentRecord::new(name, owner).with_id(id));
        self
    }
}

#[async_trait::async_trait]
impl DocumentDirectory for FakeDirectory {
    async fn documents_for(
        &self,
        owner: &str,
        subset: Option<&[String]>,
    ) -> AppResult<Vec<DocumentRecord>> {
        let owned = self.documents.iter().filter(|d| d.owner == owner);
        Ok(match subset {
            None => owned.cloned().collect(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| owned.clone().find(|d| &d.id == id).cloned())
                .collect(),
        })
    }

    async fn document(&self, id: &str) -> AppResult<Option<DocumentRecord>> {
        Ok(self.documents.iter().find(|d| d.id == id).cloned())
    }
}

/// Services over the given fakes with built-in prompts.
pub(crate) fn services(
    llm: Arc<FakeLlm>,
    index: Arc<FakeIndex>,
    directory: FakeDirectory,
) -> Arc<AgentServices> {
    Arc::new(
        AgentServices::new(
            llm,
            "test-model",
            index,
            Arc::new(directory),
            PromptLibrary::builtin().unwrap(),
        )
        .with_rag(RagConfig::default()),
    )
}

/// Distinctive fragments of the built-in system prompts.
pub(crate) mod needles {
    pub const QUERIES: &str = "search query generator";
    pub const ANSWER: &str = "expert document analyst";
    pub const LIBRARY: &str = "their document library";
    pub const SYNTHESIS: &str = "cross-document synthesis";
    pub const SUGGESTIONS: &str = "follow-up questions";
    pub const TITLE: &str = "descriptive title";
    pub const MINDMAP: &str = "structured mind maps";
}
