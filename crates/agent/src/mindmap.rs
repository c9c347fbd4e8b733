//! Mind map facade.

use crate::context::{MindmapContext, MindmapEdge, MindmapNode};
use crate::services::AgentServices;
use crate::workflow::Workflow;
use crate::workflows;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Generated mind map of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mindmap {
    pub nodes: Vec<MindmapNode>,
    pub edges: Vec<MindmapEdge>,
}

pub struct MindmapAgent {
    services: Arc<AgentServices>,
    workflow: Workflow<MindmapContext>,
}

impl MindmapAgent {
    pub fn new(services: Arc<AgentServices>) -> Self {
        let workflow = workflows::generate_mindmap(&services);
        Self { services, workflow }
    }

    pub async fn generate(&self, document_id: &str, document_name: &str) -> AppResult<Mindmap> {
        tracing::info!(document = document_id, "Generating mind map");
        let ctx = MindmapContext::new(document_id, document_name);
        let done = self.workflow.execute(&ctx).await?;

        Ok(Mindmap {
            nodes: done.nodes.unwrap_or_default(),
            edges: done.edges.unwrap_or_default(),
        })
    }

    /// Look the document up by id and generate its map.
    pub async fn generate_for_document(&self, document_id: &str) -> AppResult<Mindmap> {
        let record = self
            .services
            .directory
            .document(document_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Unknown document: {}", document_id)))?;
        self.generate(&record.id, &record.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NodeKind;
    use crate::testing::{needles, services, FakeDirectory, FakeIndex, FakeLlm};

    fn agent(llm: FakeLlm, index: FakeIndex) -> MindmapAgent {
        let directory = FakeDirectory::default().with("doc", "Thesis.pdf", "alice");
        MindmapAgent::new(services(Arc::new(llm), Arc::new(index), directory))
    }

    #[tokio::test]
    async fn test_generate_end_to_end() {
        let llm = FakeLlm::default().reply(
            needles::MINDMAP,
            r#"{"nodes":[{"id":"1","label":"Thesis","type":"root"},{"id":"2","label":"Method","type":"topic"}],"edges":[{"source":"1","target":"2"}]}"#,
        );
        let index = FakeIndex::default().with("doc", &[("We use surveys.", Some(3))]);

        let map = agent(llm, index).generate_for_document("doc").await.unwrap();
        assert_eq!(map.nodes.len(), 2);
        assert_eq!(map.nodes[1].kind, NodeKind::Topic);
        assert_eq!(map.edges, vec![MindmapEdge::new("1", "2")]);
    }

    #[tokio::test]
    async fn test_unindexed_document_gets_root_only() {
        let map = agent(FakeLlm::default(), FakeIndex::default())
            .generate("doc", "Thesis.pdf")
            .await
            .unwrap();
        assert_eq!(map.nodes, vec![MindmapNode::new("1", "Thesis.pdf", NodeKind::Root)]);
        assert!(map.edges.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_fails_workflow() {
        let err = agent(FakeLlm::default(), FakeIndex::default().failing_on("doc"))
            .generate("doc", "Thesis.pdf")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("RetrieveChunksStep"));
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let result = agent(FakeLlm::default(), FakeIndex::default())
            .generate_for_document("missing")
            .await;
        assert!(result.is_err());
    }
}
