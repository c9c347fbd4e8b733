//! Retrieval capability.

use crate::types::RetrievedPassage;
use docqa_core::{AppResult, Tool};
use std::sync::Arc;

/// Given a query and a namespace, return the top-K scored passages.
///
/// Failures are surfaced as errors, never as empty results. A single
/// instance is shared by concurrent requests.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn search(
        &self,
        query: &str,
        namespace: &str,
        top_k: usize,
    ) -> AppResult<Vec<RetrievedPassage>>;
}

/// Input of one retrieval call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub query: String,
    pub namespace: String,
    pub top_k: usize,
}

impl RetrievalQuery {
    pub fn new(query: impl Into<String>, namespace: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            namespace: namespace.into(),
            top_k,
        }
    }
}

/// `Tool` wrapper around a shared `Retriever`.
#[derive(Clone)]
pub struct RetrieverTool {
    retriever: Arc<dyn Retriever>,
}

impl RetrieverTool {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait::async_trait]
impl Tool for RetrieverTool {
    type Input = RetrievalQuery;
    type Output = Vec<RetrievedPassage>;

    fn name(&self) -> &str {
        "RetrieverTool"
    }

    async fn run(&self, input: RetrievalQuery) -> AppResult<Vec<RetrievedPassage>> {
        let passages = self
            .retriever
            .search(&input.query, &input.namespace, input.top_k)
            .await?;

        tracing::debug!(
            namespace = %input.namespace,
            top_k = input.top_k,
            found = passages.len(),
            "Retrieval finished"
        );
        Ok(passages)
    }
}
