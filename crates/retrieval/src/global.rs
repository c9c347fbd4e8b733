//! Fan-out retrieval across many document namespaces.

use crate::dedup::Deduplicator;
use crate::retriever::{RetrievalQuery, RetrieverTool};
use crate::types::{DocumentRecord, RetrievedPassage};
use docqa_core::Tool;
use futures::future::join_all;

/// Search every document in `documents` concurrently with the same query.
///
/// All calls are dispatched before any is awaited. A namespace whose call
/// fails contributes nothing. Results are merged in `documents` order with
/// first-wins deduplication, then truncated to `top_k`. Every passage is
/// stamped with the id and name of its document.
///
/// Never fails: the worst case is an empty result.
pub async fn retrieve_global(
    tool: &RetrieverTool,
    query: &str,
    documents: &[DocumentRecord],
    per_document_k: usize,
    top_k: usize,
) -> Vec<RetrievedPassage> {
    if documents.is_empty() {
        tracing::warn!("No documents to search");
        return Vec::new();
    }

    let searches = documents.iter().map(|doc| async move {
        match tool
            .execute(RetrievalQuery::new(query, doc.id.as_str(), per_document_k))
            .await
        {
            Ok(passages) => passages
                .into_iter()
                .map(|p| p.with_source(doc.id.as_str(), doc.name.as_str()))
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(document = %doc.id, error = %e, "Skipping document after failed search");
                Vec::new()
            }
        }
    });

    let per_document: Vec<Vec<RetrievedPassage>> = join_all(searches).await;
    let contributing = per_document.iter().filter(|r| !r.is_empty()).count();

    let mut dedup = Deduplicator::new();
    for passages in per_document {
        dedup.extend(passages);
    }

    let merged = dedup.finish(top_k);
    tracing::info!(
        documents = documents.len(),
        contributing,
        returned = merged.len(),
        "Global retrieval finished"
    );
    merged
}
