//! Chat facade: picks the pipeline for a request and adapts its output.

use crate::context::{ChatContext, ChatPatch, ChatRequest, Task};
use crate::services::AgentServices;
use crate::streaming::{StreamChunk, StreamingWorkflow};
use crate::workflow::Workflow;
use crate::workflows;
use docqa_core::AppResult;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Result of a blocking chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub suggestions: Vec<String>,
}

/// Caller-facing stream item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AgentChunk {
    Token { content: String },
    Suggestions { suggestions: Vec<String> },
    Error { error: String },
    Done,
}

impl AgentChunk {
    /// Map a workflow chunk; data without suggestions maps to nothing.
    fn from_chunk(chunk: StreamChunk<ChatPatch>) -> Option<Self> {
        match chunk {
            StreamChunk::Token(content) => Some(AgentChunk::Token { content }),
            StreamChunk::Data(patch) => patch
                .suggestions
                .map(|suggestions| AgentChunk::Suggestions { suggestions }),
            StreamChunk::Error(error) => Some(AgentChunk::Error { error }),
            StreamChunk::Done => Some(AgentChunk::Done),
        }
    }
}

/// Question answering over one document, a library or a selection.
pub struct ChatAgent {
    question: Workflow<ChatContext>,
    library: Workflow<ChatContext>,
    synthesis: Workflow<ChatContext>,
    question_stream: StreamingWorkflow<ChatContext>,
    library_stream: StreamingWorkflow<ChatContext>,
    synthesis_stream: StreamingWorkflow<ChatContext>,
}

impl ChatAgent {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self {
            question: workflows::answer_question(&services),
            library: workflows::answer_library(&services),
            synthesis: workflows::answer_synthesis(&services),
            question_stream: workflows::answer_question_stream(&services),
            library_stream: workflows::answer_library_stream(&services),
            synthesis_stream: workflows::answer_synthesis_stream(&services),
        }
    }

    fn workflow(&self, task: &Task) -> &Workflow<ChatContext> {
        match task {
            Task::SingleDocument { .. } => &self.question,
            Task::Library { .. } => &self.library,
            Task::Synthesis { .. } => &self.synthesis,
        }
    }

    fn streaming_workflow(&self, task: &Task) -> &StreamingWorkflow<ChatContext> {
        match task {
            Task::SingleDocument { .. } => &self.question_stream,
            Task::Library { .. } => &self.library_stream,
            Task::Synthesis { .. } => &self.synthesis_stream,
        }
    }

    /// Run the matching pipeline to completion.
    pub async fn answer(&self, request: ChatRequest) -> AppResult<ChatAnswer> {
        let ctx = ChatContext::from_request(request);
        tracing::info!(task = ctx.task.kind(), "Answering");

        let done = self.workflow(&ctx.task).execute(&ctx).await?;
        Ok(ChatAnswer {
            answer: done.answer.unwrap_or_default(),
            suggestions: done.suggestions.unwrap_or_default(),
        })
    }

    /// Stream the answer as tokens, then suggestions, then one terminal
    /// chunk. Dropping the stream stops the pipeline.
    pub fn stream(&self, request: ChatRequest) -> ReceiverStream<AgentChunk> {
        let ctx = ChatContext::from_request(request);
        tracing::info!(task = ctx.task.kind(), "Streaming answer");

        let mut chunks = self.streaming_workflow(&ctx.task).execute(&ctx);
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    next = chunks.next() => next,
                    _ = tx.closed() => break,
                };
                let Some(chunk) = next else { break };
                if let Some(out) = AgentChunk::from_chunk(chunk) {
                    if tx.send(out).await.is_err() {
                        break;
                    }
                }
            }
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::NO_EVIDENCE_ANSWER;
    use crate::testing::{needles, services, FakeDirectory, FakeIndex, FakeLlm};

    fn directory() -> FakeDirectory {
        FakeDirectory::default()
            .with("d1", "Alpha.pdf", "alice")
            .with("d2", "Beta.pdf", "alice")
    }

    fn index() -> FakeIndex {
        FakeIndex::default()
            .with("d1", &[("Alpha says the sky is blue.", Some(2))])
            .with("d2", &[("Beta says the sea is green.", Some(5))])
    }

    fn agent(llm: FakeLlm, index: FakeIndex) -> (ChatAgent, Arc<FakeLlm>) {
        let llm = Arc::new(llm);
        let services = services(llm.clone(), Arc::new(index), directory());
        (ChatAgent::new(services), llm)
    }

    fn scripted() -> FakeLlm {
        FakeLlm::default()
            .reply(needles::QUERIES, r#"["sky colour"]"#)
            .reply(needles::SUGGESTIONS, r#"["Why blue?","What else?"]"#)
            .reply(needles::ANSWER, "The sky is blue [Trang 2].")
            .streaming(&["The sky ", "<thinking>hmm</thinking>", "is blue [Trang 2]."])
    }

    #[test]
    fn test_chunk_json_shape() {
        let token = AgentChunk::Token { content: "hi".into() };
        assert_eq!(
            serde_json::to_string(&token).unwrap(),
            r#"{"type":"token","content":"hi"}"#
        );
        assert_eq!(serde_json::to_string(&AgentChunk::Done).unwrap(), r#"{"type":"done"}"#);
        let error = AgentChunk::Error { error: "x".into() };
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"type":"error","error":"x"}"#
        );
    }

    #[test]
    fn test_data_without_suggestions_is_dropped() {
        assert_eq!(AgentChunk::from_chunk(StreamChunk::Data(ChatPatch::answer("a"))), None);
        assert_eq!(
            AgentChunk::from_chunk(StreamChunk::Data(ChatPatch::suggestions(vec!["s".into()]))),
            Some(AgentChunk::Suggestions { suggestions: vec!["s".into()] })
        );
    }

    #[tokio::test]
    async fn test_single_document_answer_cites_pages() {
        let (agent, llm) = agent(scripted(), index());
        let out = agent
            .answer(ChatRequest::new("What colour is the sky?", "alice").with_document("d1"))
            .await
            .unwrap();

        assert_eq!(out.answer, "The sky is blue [Trang 2].");
        assert_eq!(out.suggestions, vec!["Why blue?", "What else?"]);

        let answer_call = &llm.requests_for(needles::ANSWER)[0];
        assert!(answer_call.messages.last().unwrap().content.contains("[Trang 2]\nAlpha says"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_gives_fallback() {
        let (agent, llm) = agent(scripted(), FakeIndex::default());
        let out = agent
            .answer(ChatRequest::new("Anything?", "alice").with_document("d1"))
            .await
            .unwrap();

        assert_eq!(out.answer, NO_EVIDENCE_ANSWER);
        assert!(out.suggestions.is_empty());
        assert!(llm.requests_for(needles::ANSWER).is_empty());
    }

    #[tokio::test]
    async fn test_library_request_searches_every_document() {
        let (agent, llm) = agent(scripted(), index());
        agent.answer(ChatRequest::new("Compare", "alice")).await.unwrap();

        let call = &llm.requests_for(needles::LIBRARY)[0];
        let user = &call.messages.last().unwrap().content;
        assert!(user.contains("[Alpha.pdf - Trang 2]"));
        assert!(user.contains("[Beta.pdf - Trang 5]"));
        assert!(llm.requests_for(needles::QUERIES).is_empty());
    }

    #[tokio::test]
    async fn test_blocking_failure_names_step() {
        let (agent, _) = agent(scripted(), index().failing_on("d1"));
        let err = agent
            .answer(ChatRequest::new("q", "alice").with_document("d1"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Workflow stopped at step 'RetrieveContextStep'"));
    }

    #[tokio::test]
    async fn test_stream_adapts_chunks() {
        let (agent, _) = agent(scripted(), index());
        let chunks: Vec<AgentChunk> = agent
            .stream(ChatRequest::new("Sky?", "alice").with_document("d1"))
            .collect()
            .await;

        let text: String = chunks
            .iter()
            .filter_map(|c| match c {
                AgentChunk::Token { content } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "The sky is blue [Trang 2].");
        assert_eq!(
            chunks[chunks.len() - 2],
            AgentChunk::Suggestions {
                suggestions: vec!["Why blue?".into(), "What else?".into()]
            }
        );
        assert_eq!(chunks.last(), Some(&AgentChunk::Done));
    }

    #[tokio::test]
    async fn test_stream_unknown_selection_falls_back() {
        let (agent, _) = agent(scripted(), index());
        let chunks: Vec<AgentChunk> = agent
            .stream(ChatRequest::new("q", "alice").with_documents(["nope"]))
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks[0],
            AgentChunk::Token { content: NO_EVIDENCE_ANSWER.into() }
        );
        assert_eq!(chunks[1], AgentChunk::Suggestions { suggestions: Vec::new() });
        assert_eq!(chunks[2], AgentChunk::Done);
    }

    #[tokio::test]
    async fn test_stream_preparation_failure_is_single_error() {
        let (agent, _) = agent(scripted(), index().failing_on("d1"));
        let chunks: Vec<AgentChunk> = agent
            .stream(ChatRequest::new("q", "alice").with_document("d1"))
            .collect()
            .await;

        assert_eq!(chunks.len(), 1);
        assert!(matches!(&chunks[0], AgentChunk::Error { error } if error.contains("RetrieveContextStep")));
    }
}
