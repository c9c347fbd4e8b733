//! File-backed vector index, one JSONL file per namespace.

use crate::embeddings::EmbeddingProvider;
use crate::retriever::Retriever;
use crate::types::{IndexedPassage, RetrievedPassage};
use docqa_core::{AppError, AppResult};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Local `Retriever` over `.docqa/index/<namespace>.jsonl`.
///
/// Search embeds the query, scores every stored passage by cosine
/// similarity and returns the best `top_k`. Equal scores keep ingestion
/// order. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct LocalIndex {
    root: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl LocalIndex {
    pub fn new(workspace: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            root: workspace.join(".docqa").join("index"),
            embedder,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    fn namespace_path(&self, namespace: &str) -> AppResult<PathBuf> {
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::Validation(format!(
                "Invalid namespace: '{}'",
                namespace
            )));
        }
        Ok(self.root.join(format!("{}.jsonl", namespace)))
    }

    /// Replace the contents of `namespace`.
    pub async fn write_namespace(
        &self,
        namespace: &str,
        passages: &[IndexedPassage],
    ) -> AppResult<()> {
        let path = self.namespace_path(namespace)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let mut body = String::new();
        for passage in passages {
            body.push_str(&serde_json::to_string(passage)?);
            body.push('\n');
        }
        tokio::fs::write(&path, body).await?;

        tracing::debug!(namespace, passages = passages.len(), "Namespace written");
        Ok(())
    }

    /// Stored passages of `namespace`; an unknown namespace is an error.
    pub async fn load_namespace(&self, namespace: &str) -> AppResult<Vec<IndexedPassage>> {
        let path = self.namespace_path(namespace)?;
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::Retrieval(format!(
                    "Namespace '{}' is not indexed",
                    namespace
                )))
            }
            Err(e) => return Err(e.into()),
        };

        body.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AppError::from))
            .collect()
    }
}

/// Cosine similarity; zero when either vector has no length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait::async_trait]
impl Retriever for LocalIndex {
    async fn search(
        &self,
        query: &str,
        namespace: &str,
        top_k: usize,
    ) -> AppResult<Vec<RetrievedPassage>> {
        let stored = self.load_namespace(namespace).await?;
        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(f32, IndexedPassage)> = stored
            .into_iter()
            .map(|p| (cosine_similarity(&query_embedding, &p.embedding), p))
            .collect();
        // Stable sort keeps ingestion order among equal scores
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, p)| {
                let mut passage = RetrievedPassage::new(p.text, p.page_number);
                passage.source_id = Some(namespace.to_string());
                passage
            })
            .collect())
    }
}
