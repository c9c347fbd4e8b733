//! Typed workflow contexts.
//!
//! Each pipeline family owns one context record. Steps never mutate the
//! context directly: they return a patch, and the driver applies it by
//! overwriting every field the patch sets. Fields are never cleared.

use docqa_llm::ChatMessage;
use docqa_retrieval::RetrievedPassage;
use serde::{Deserialize, Serialize};

/// State threaded through a workflow.
pub trait WorkflowContext: Clone + Send + Sync + 'static {
    /// Partial update produced by one step.
    type Patch: Clone + Send + Sync + std::fmt::Debug + 'static;

    /// Shallow merge: fields set in `patch` replace the current values.
    fn apply(&mut self, patch: Self::Patch);
}

/// Incoming chat request, as received at the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,

    /// Owner whose library is searched when no document is given
    pub owner: String,

    #[serde(default)]
    pub document_id: Option<String>,

    /// Explicit subset for cross-document synthesis
    #[serde(default)]
    pub document_ids: Vec<String>,

    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            owner: owner.into(),
            ..Default::default()
        }
    }

    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_documents<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// What a chat request asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    SingleDocument { document_id: String },
    Library { owner: String },
    Synthesis { owner: String, document_ids: Vec<String> },
}

impl Task {
    /// A non-empty subset wins, then a missing document means the whole
    /// library, otherwise the single document.
    pub fn from_request(request: &ChatRequest) -> Self {
        if !request.document_ids.is_empty() {
            return Task::Synthesis {
                owner: request.owner.clone(),
                document_ids: request.document_ids.clone(),
            };
        }

        match request.document_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => Task::SingleDocument {
                document_id: id.to_string(),
            },
            None => Task::Library {
                owner: request.owner.clone(),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Task::SingleDocument { .. } => "single",
            Task::Library { .. } => "library",
            Task::Synthesis { .. } => "synthesis",
        }
    }
}

/// Context of the question answering pipelines.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub user_query: String,
    pub task: Task,
    pub history: Vec<ChatMessage>,

    pub search_queries: Option<Vec<String>>,
    pub passages: Option<Vec<RetrievedPassage>>,
    pub context_string: Option<String>,

    pub answer: Option<String>,
    pub suggestions: Option<Vec<String>>,
}

impl ChatContext {
    pub fn new(user_query: impl Into<String>, task: Task, history: Vec<ChatMessage>) -> Self {
        Self {
            user_query: user_query.into(),
            task,
            history,
            search_queries: None,
            passages: None,
            context_string: None,
            answer: None,
            suggestions: None,
        }
    }

    pub fn from_request(request: ChatRequest) -> Self {
        let task = Task::from_request(&request);
        Self::new(request.message, task, request.history)
    }

    /// The first search query, or the user's own words.
    pub fn primary_query(&self) -> &str {
        self.search_queries
            .as_ref()
            .and_then(|q| q.first())
            .map(String::as_str)
            .unwrap_or(&self.user_query)
    }

    /// The last `turns` messages of the conversation.
    pub fn recent_history(&self, turns: usize) -> &[ChatMessage] {
        let start = self.history.len().saturating_sub(turns);
        &self.history[start..]
    }
}

/// Fields a chat step may write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatPatch {
    pub search_queries: Option<Vec<String>>,
    pub passages: Option<Vec<RetrievedPassage>>,
    pub context_string: Option<String>,
    pub answer: Option<String>,
    pub suggestions: Option<Vec<String>>,
}

impl ChatPatch {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Default::default()
        }
    }

    pub fn suggestions(suggestions: Vec<String>) -> Self {
        Self {
            suggestions: Some(suggestions),
            ..Default::default()
        }
    }

    pub fn retrieval(passages: Vec<RetrievedPassage>, context_string: String) -> Self {
        Self {
            passages: Some(passages),
            context_string: Some(context_string),
            ..Default::default()
        }
    }
}

impl WorkflowContext for ChatContext {
    type Patch = ChatPatch;

    fn apply(&mut self, patch: ChatPatch) {
        if let Some(v) = patch.search_queries {
            self.search_queries = Some(v);
        }
        if let Some(v) = patch.passages {
            self.passages = Some(v);
        }
        if let Some(v) = patch.context_string {
            self.context_string = Some(v);
        }
        if let Some(v) = patch.answer {
            self.answer = Some(v);
        }
        if let Some(v) = patch.suggestions {
            self.suggestions = Some(v);
        }
    }
}

/// Role of a node in a mind map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Topic,
    Subtopic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindmapNode {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl MindmapNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindmapEdge {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MindmapEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }
}

/// Context of the mind map pipeline.
#[derive(Debug, Clone)]
pub struct MindmapContext {
    pub document_id: String,
    pub document_name: String,
    pub chunks: Option<Vec<String>>,
    pub nodes: Option<Vec<MindmapNode>>,
    pub edges: Option<Vec<MindmapEdge>>,
}

impl MindmapContext {
    pub fn new(document_id: impl Into<String>, document_name: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            document_name: document_name.into(),
            chunks: None,
            nodes: None,
            edges: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MindmapPatch {
    pub chunks: Option<Vec<String>>,
    pub nodes: Option<Vec<MindmapNode>>,
    pub edges: Option<Vec<MindmapEdge>>,
}

impl WorkflowContext for MindmapContext {
    type Patch = MindmapPatch;

    fn apply(&mut self, patch: MindmapPatch) {
        if let Some(v) = patch.chunks {
            self.chunks = Some(v);
        }
        if let Some(v) = patch.nodes {
            self.nodes = Some(v);
        }
        if let Some(v) = patch.edges {
            self.edges = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_precedence() {
        let subset = ChatRequest::new("q", "alice")
            .with_document("d1")
            .with_documents(["d2", "d3"]);
        assert_eq!(
            Task::from_request(&subset),
            Task::Synthesis {
                owner: "alice".into(),
                document_ids: vec!["d2".into(), "d3".into()]
            }
        );

        let library = ChatRequest::new("q", "alice");
        assert_eq!(Task::from_request(&library), Task::Library { owner: "alice".into() });

        let blank = ChatRequest::new("q", "alice").with_document("");
        assert_eq!(Task::from_request(&blank).kind(), "library");

        let single = ChatRequest::new("q", "alice").with_document("d1");
        assert_eq!(
            Task::from_request(&single),
            Task::SingleDocument { document_id: "d1".into() }
        );
    }

    #[test]
    fn test_apply_overwrites_only_set_fields() {
        let mut ctx = ChatContext::new("q", Task::Library { owner: "a".into() }, Vec::new());
        ctx.apply(ChatPatch {
            search_queries: Some(vec!["x".into()]),
            answer: Some("first".into()),
            ..Default::default()
        });
        ctx.apply(ChatPatch::answer("second"));

        assert_eq!(ctx.search_queries, Some(vec!["x".to_string()]));
        assert_eq!(ctx.answer.as_deref(), Some("second"));
        assert!(ctx.suggestions.is_none());
    }

    #[test]
    fn test_primary_query_and_recent_history() {
        let history = vec![
            ChatMessage::user("one"),
            ChatMessage::assistant("two"),
            ChatMessage::user("three"),
        ];
        let mut ctx = ChatContext::new("original", Task::Library { owner: "a".into() }, history);
        assert_eq!(ctx.primary_query(), "original");
        assert_eq!(ctx.recent_history(2)[0].content, "two");
        assert_eq!(ctx.recent_history(10).len(), 3);

        ctx.search_queries = Some(vec!["rewritten".into()]);
        assert_eq!(ctx.primary_query(), "rewritten");
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","owner":"bob","documentIds":["a"],"history":[{"role":"user","content":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(request.document_ids, vec!["a"]);
        assert_eq!(request.history.len(), 1);
        assert!(request.document_id.is_none());
    }

    #[test]
    fn test_node_kind_serializes_as_type() {
        let node = MindmapNode::new("1", "Root", NodeKind::Root);
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r#"{"id":"1","label":"Root","type":"root"}"#
        );
    }
}
