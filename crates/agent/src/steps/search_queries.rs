//! Search query rewriting.

use super::extract_string_array;
use crate::context::{ChatContext, ChatPatch};
use crate::services::AgentServices;
use crate::step::Step;
use docqa_core::{AppResult, Tool};
use docqa_llm::ChatMessage;
use docqa_prompt::builtin::CHAT_SEARCH_QUERIES;
use std::sync::Arc;

/// Rewrites the question into standalone search queries using recent
/// conversation turns. Never fails: any problem falls back to the user's
/// own question.
pub struct GenerateSearchQueriesStep {
    services: Arc<AgentServices>,
}

impl GenerateSearchQueriesStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn generate(&self, ctx: &ChatContext) -> AppResult<Vec<String>> {
        let rag = &self.services.rag;
        let query_count = if rag.multi_query {
            "2-3 diverse"
        } else {
            "1 focused"
        };

        let messages = self.services.prompt_messages(
            CHAT_SEARCH_QUERIES,
            [
                ("query_count", query_count.to_string()),
                (
                    "history",
                    format_history(ctx.recent_history(rag.query_history_turns)),
                ),
                ("question", ctx.user_query.clone()),
            ],
        )?;

        let reply = self.services.llm.execute(messages).await?;
        Ok(extract_string_array(&reply)
            .unwrap_or_default()
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect())
    }
}

fn format_history(turns: &[ChatMessage]) -> String {
    if turns.is_empty() {
        return "(No previous messages)".to_string();
    }
    turns
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait::async_trait]
impl Step<ChatContext> for GenerateSearchQueriesStep {
    fn name(&self) -> &str {
        "GenerateSearchQueriesStep"
    }

    async fn run(&self, ctx: &ChatContext) -> AppResult<ChatPatch> {
        let queries = match self.generate(ctx).await {
            Ok(queries) if !queries.is_empty() => queries,
            Ok(_) => {
                tracing::debug!("No usable search queries, using the question");
                vec![ctx.user_query.clone()]
            }
            Err(e) => {
                tracing::warn!(error = %e, "Search query generation failed, using the question");
                vec![ctx.user_query.clone()]
            }
        };

        tracing::info!(count = queries.len(), "Search queries ready");
        Ok(ChatPatch {
            search_queries: Some(queries),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Task;
    use crate::testing::{needles, services, FakeDirectory, FakeIndex, FakeLlm};

    fn ctx(history: Vec<ChatMessage>) -> ChatContext {
        ChatContext::new(
            "What about its cost?",
            Task::SingleDocument { document_id: "d1".into() },
            history,
        )
    }

    async fn run_with(llm: FakeLlm, history: Vec<ChatMessage>) -> (Vec<String>, Arc<FakeLlm>) {
        let llm = Arc::new(llm);
        let step = GenerateSearchQueriesStep::new(services(
            llm.clone(),
            Arc::new(FakeIndex::default()),
            FakeDirectory::default(),
        ));
        let patch = step.run(&ctx(history)).await.unwrap();
        (patch.search_queries.unwrap(), llm)
    }

    #[tokio::test]
    async fn test_queries_parsed_from_reply() {
        let llm = FakeLlm::default().reply(needles::QUERIES, "Here: [\"solar panel cost\"]");
        let (queries, _) = run_with(llm, Vec::new()).await;
        assert_eq!(queries, vec!["solar panel cost"]);
    }

    #[tokio::test]
    async fn test_prompt_carries_recent_history_and_count() {
        let history: Vec<ChatMessage> = (0..6)
            .map(|i| ChatMessage::user(format!("turn {}", i)))
            .collect();
        let llm = FakeLlm::default().reply(needles::QUERIES, "[\"q\"]");
        let (_, llm) = run_with(llm, history).await;

        let request = &llm.requests_for(needles::QUERIES)[0];
        assert!(request.messages[0].content.contains("Generate 1 focused search queries"));
        let user = &request.messages[1].content;
        assert!(user.contains("user: turn 2\nuser: turn 3\nuser: turn 4\nuser: turn 5"));
        assert!(!user.contains("turn 1"));
        assert!(user.contains("Current question: \"What about its cost?\""));
    }

    #[tokio::test]
    async fn test_empty_history_placeholder() {
        let llm = FakeLlm::default().reply(needles::QUERIES, "[\"q\"]");
        let (_, llm) = run_with(llm, Vec::new()).await;
        assert!(llm.requests_for(needles::QUERIES)[0].messages[1]
            .content
            .contains("(No previous messages)"));
    }

    #[tokio::test]
    async fn test_falls_back_to_question() {
        for llm in [
            FakeLlm::default().reply(needles::QUERIES, "I cannot help"),
            FakeLlm::default().reply(needles::QUERIES, "[]"),
            FakeLlm::default().reply(needles::QUERIES, "[\"  \"]"),
            FakeLlm::default().fail(needles::QUERIES, "timeout"),
        ] {
            let (queries, _) = run_with(llm, Vec::new()).await;
            assert_eq!(queries, vec!["What about its cost?"]);
        }
    }
}
