//! Multi-query retrieval against one namespace.

use crate::dedup::Deduplicator;
use crate::retriever::{RetrievalQuery, RetrieverTool};
use crate::types::RetrievedPassage;
use docqa_core::{AppResult, Tool};

/// Run `queries` one after another against `namespace`, merge with
/// first-wins deduplication and keep the first `top_k` passages.
///
/// Queries are issued strictly in order so that earlier queries decide
/// which duplicate survives. A failing call aborts the whole retrieval.
pub async fn retrieve_multi_query(
    tool: &RetrieverTool,
    queries: &[String],
    namespace: &str,
    per_query_k: usize,
    top_k: usize,
) -> AppResult<Vec<RetrievedPassage>> {
    let mut dedup = Deduplicator::new();

    for query in queries {
        let passages = tool
            .execute(RetrievalQuery::new(query.as_str(), namespace, per_query_k))
            .await?;
        dedup.extend(passages);
    }

    let unique = dedup.len();
    let kept = dedup.finish(top_k);
    tracing::debug!(
        namespace,
        queries = queries.len(),
        unique,
        kept = kept.len(),
        "Multi-query retrieval merged"
    );
    Ok(kept)
}
