//! Mind map steps.

use super::{extract_json_object, truncate_chars};
use crate::context::{MindmapContext, MindmapEdge, MindmapNode, MindmapPatch, NodeKind};
use crate::services::AgentServices;
use crate::step::Step;
use docqa_core::{AppResult, Tool};
use docqa_prompt::builtin::MINDMAP_GENERATE;
use docqa_retrieval::citation::PASSAGE_SEPARATOR;
use docqa_retrieval::{Deduplicator, RetrievalQuery};
use serde_json::Value;
use std::sync::Arc;

/// Overview queries that pull broad, structural passages.
const OVERVIEW_QUERIES: [&str; 2] = [
    "main topics key concepts summary",
    "introduction conclusion methodology",
];
const PER_QUERY_TOP_K: usize = 6;
const CHUNK_FINGERPRINT_LEN: usize = 50;
const MAX_CHUNKS: usize = 8;
const MAX_CONTENT_CHARS: usize = 4000;

/// Collects distinct overview passages from the document.
pub struct RetrieveChunksStep {
    services: Arc<AgentServices>,
}

impl RetrieveChunksStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl Step<MindmapContext> for RetrieveChunksStep {
    fn name(&self) -> &str {
        "RetrieveChunksStep"
    }

    async fn run(&self, ctx: &MindmapContext) -> AppResult<MindmapPatch> {
        let mut dedup = Deduplicator::with_fingerprint_len(CHUNK_FINGERPRINT_LEN);
        for query in OVERVIEW_QUERIES {
            let passages = self
                .services
                .retriever
                .execute(RetrievalQuery::new(query, ctx.document_id.as_str(), PER_QUERY_TOP_K))
                .await?;
            dedup.extend(passages);
        }

        let chunks: Vec<String> = dedup
            .finish(MAX_CHUNKS)
            .into_iter()
            .map(|p| p.text)
            .collect();
        tracing::debug!(document = %ctx.document_id, chunks = chunks.len(), "Mind map chunks collected");

        Ok(MindmapPatch {
            chunks: Some(chunks),
            ..Default::default()
        })
    }
}

/// Asks the model for a node/edge structure. Always succeeds: a map that
/// cannot be generated or parsed is replaced by a fixed outline.
pub struct GenerateMindmapStep {
    services: Arc<AgentServices>,
}

impl GenerateMindmapStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn generate(
        &self,
        name: &str,
        content: &str,
    ) -> AppResult<Option<(Vec<MindmapNode>, Vec<MindmapEdge>)>> {
        let messages = self.services.prompt_messages(
            MINDMAP_GENERATE,
            [
                ("document_name", name),
                ("content", truncate_chars(content, MAX_CONTENT_CHARS)),
            ],
        )?;
        let reply = self.services.llm.execute(messages).await?;
        Ok(parse_mindmap(reply.trim()))
    }
}

#[async_trait::async_trait]
impl Step<MindmapContext> for GenerateMindmapStep {
    fn name(&self) -> &str {
        "GenerateMindmapStep"
    }

    async fn run(&self, ctx: &MindmapContext) -> AppResult<MindmapPatch> {
        let content = ctx
            .chunks
            .as_deref()
            .unwrap_or_default()
            .join(PASSAGE_SEPARATOR);

        if content.trim().is_empty() {
            return Ok(patch(
                vec![MindmapNode::new("1", ctx.document_name.as_str(), NodeKind::Root)],
                Vec::new(),
            ));
        }

        let (nodes, edges) = match self.generate(&ctx.document_name, &content).await {
            Ok(Some(map)) => map,
            Ok(None) => {
                tracing::warn!(document = %ctx.document_id, "Unusable mind map output, using outline");
                fallback_outline(&ctx.document_name)
            }
            Err(e) => {
                tracing::warn!(document = %ctx.document_id, error = %e, "Mind map generation failed, using outline");
                fallback_outline(&ctx.document_name)
            }
        };
        Ok(patch(nodes, edges))
    }
}

fn patch(nodes: Vec<MindmapNode>, edges: Vec<MindmapEdge>) -> MindmapPatch {
    MindmapPatch {
        nodes: Some(nodes),
        edges: Some(edges),
        ..Default::default()
    }
}

fn fallback_outline(name: &str) -> (Vec<MindmapNode>, Vec<MindmapEdge>) {
    (
        vec![
            MindmapNode::new("1", name, NodeKind::Root),
            MindmapNode::new("2", "Content Analysis", NodeKind::Topic),
            MindmapNode::new("3", "Key Topics", NodeKind::Topic),
        ],
        vec![MindmapEdge::new("1", "2"), MindmapEdge::new("1", "3")],
    )
}

/// Ids may come back as strings or numbers.
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse `{nodes, edges}` out of model output, filling node defaults.
///
/// Returns `None` when there is no object or `nodes` is not an array.
/// A missing `edges` array means no edges; edges without both endpoints
/// are dropped.
pub(crate) fn parse_mindmap(text: &str) -> Option<(Vec<MindmapNode>, Vec<MindmapEdge>)> {
    let value = extract_json_object(text)?;
    let raw_nodes = value.get("nodes")?.as_array()?;

    let nodes = raw_nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let default_kind = if index == 0 {
                NodeKind::Root
            } else {
                NodeKind::Topic
            };
            let kind = match node.get("type").and_then(Value::as_str) {
                Some("root") => NodeKind::Root,
                Some("topic") => NodeKind::Topic,
                Some("subtopic") => NodeKind::Subtopic,
                _ => default_kind,
            };
            MindmapNode {
                id: id_string(node.get("id")).unwrap_or_else(|| (index + 1).to_string()),
                label: text_field(node, "label").unwrap_or_else(|| "Unknown".to_string()),
                description: text_field(node, "description"),
                kind,
            }
        })
        .collect();

    let edges = value
        .get("edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| {
                    Some(MindmapEdge {
                        source: id_string(edge.get("source"))?,
                        target: id_string(edge.get("target"))?,
                        label: text_field(edge, "label"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some((nodes, edges))
}
