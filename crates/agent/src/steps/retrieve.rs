//! Retrieval steps for the three task scopes.

use crate::context::{ChatContext, ChatPatch, Task};
use crate::services::AgentServices;
use crate::step::Step;
use docqa_core::{AppError, AppResult};
use docqa_retrieval::{build_context, retrieve_global, retrieve_multi_query, CitationScope};
use std::sync::Arc;

/// Multi-query retrieval over the one requested document.
pub struct RetrieveContextStep {
    services: Arc<AgentServices>,
}

impl RetrieveContextStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl Step<ChatContext> for RetrieveContextStep {
    fn name(&self) -> &str {
        "RetrieveContextStep"
    }

    async fn run(&self, ctx: &ChatContext) -> AppResult<ChatPatch> {
        let Task::SingleDocument { document_id } = &ctx.task else {
            return Err(AppError::Validation(
                "document id is required for document retrieval".to_string(),
            ));
        };

        let queries = match &ctx.search_queries {
            Some(queries) if !queries.is_empty() => queries.clone(),
            _ => vec![ctx.user_query.clone()],
        };

        let rag = &self.services.rag;
        let passages = retrieve_multi_query(
            &self.services.retriever,
            &queries,
            document_id,
            rag.per_query_top_k,
            rag.top_k,
        )
        .await?;

        let context = build_context(&passages, CitationScope::Single);
        Ok(ChatPatch::retrieval(passages, context))
    }
}

/// Fan-out retrieval over every document the owner has.
pub struct GlobalRetrieveContextStep {
    services: Arc<AgentServices>,
}

impl GlobalRetrieveContextStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl Step<ChatContext> for GlobalRetrieveContextStep {
    fn name(&self) -> &str {
        "GlobalRetrieveContextStep"
    }

    async fn run(&self, ctx: &ChatContext) -> AppResult<ChatPatch> {
        let Task::Library { owner } = &ctx.task else {
            return Err(AppError::Validation(
                "library retrieval requires a library request".to_string(),
            ));
        };

        let documents = self.services.directory.documents_for(owner, None).await?;
        tracing::info!(owner = %owner, documents = documents.len(), "Searching library");

        let rag = &self.services.rag;
        let passages = retrieve_global(
            &self.services.retriever,
            ctx.primary_query(),
            &documents,
            rag.per_document_top_k,
            rag.global_top_k(),
        )
        .await;

        let context = build_context(&passages, CitationScope::Multi);
        Ok(ChatPatch::retrieval(passages, context))
    }
}

/// Fan-out retrieval restricted to an explicit document subset.
pub struct SynthesisRetrieveContextStep {
    services: Arc<AgentServices>,
}

impl SynthesisRetrieveContextStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl Step<ChatContext> for SynthesisRetrieveContextStep {
    fn name(&self) -> &str {
        "SynthesisRetrieveContextStep"
    }

    async fn run(&self, ctx: &ChatContext) -> AppResult<ChatPatch> {
        let (owner, document_ids) = match &ctx.task {
            Task::Synthesis {
                owner,
                document_ids,
            } if !document_ids.is_empty() => (owner, document_ids),
            _ => {
                return Err(AppError::Validation(
                    "at least one document is required for synthesis".to_string(),
                ))
            }
        };

        let documents = self
            .services
            .directory
            .documents_for(owner, Some(document_ids.as_slice()))
            .await?;
        tracing::info!(
            requested = document_ids.len(),
            found = documents.len(),
            "Searching selected documents"
        );

        let rag = &self.services.rag;
        let passages = retrieve_global(
            &self.services.retriever,
            ctx.primary_query(),
            &documents,
            rag.per_document_top_k,
            rag.global_top_k(),
        )
        .await;

        let context = build_context(&passages, CitationScope::Multi);
        Ok(ChatPatch::retrieval(passages, context))
    }
}
