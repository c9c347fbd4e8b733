//! Blocking answer generation.

use crate::context::{ChatContext, ChatPatch, Task};
use crate::services::{into_messages, AgentServices};
use crate::step::Step;
use docqa_core::{AppResult, Tool};
use docqa_llm::{ChatMessage, ThinkingFilter};
use docqa_prompt::builtin::{CHAT_ANSWER, LIBRARY_ANSWER, SYNTHESIS_ANSWER};
use std::sync::Arc;

/// Answer given when retrieval found nothing to ground on.
pub const NO_EVIDENCE_ANSWER: &str =
    "Tôi không tìm thấy thông tin liên quan trong tài liệu. Vui lòng thử hỏi theo cách khác.";

/// Messages for the answer call, or `None` when there is no evidence and
/// the model must not be asked.
pub(crate) fn answer_messages(
    services: &AgentServices,
    ctx: &ChatContext,
) -> AppResult<Option<Vec<ChatMessage>>> {
    let context = ctx.context_string.as_deref().unwrap_or_default();
    let has_passages = ctx.passages.as_ref().is_some_and(|p| !p.is_empty());
    if context.is_empty() || !has_passages {
        return Ok(None);
    }

    let question = ctx.user_query.clone();
    let built = match &ctx.task {
        Task::SingleDocument { .. } => services.prompts.render(
            CHAT_ANSWER,
            [("context", context.to_string()), ("question", question)],
        )?,
        Task::Library { .. } => services.prompts.render(
            LIBRARY_ANSWER,
            [("context", context.to_string()), ("question", question)],
        )?,
        Task::Synthesis { document_ids, .. } => services.prompts.render(
            SYNTHESIS_ANSWER,
            [
                ("context", context.to_string()),
                ("question", question),
                ("document_count", document_ids.len().to_string()),
            ],
        )?,
    };

    let history = ctx.recent_history(services.rag.answer_history_turns);
    Ok(Some(into_messages(built, history)))
}

/// Produces the full answer in one call.
pub struct GenerateAnswerStep {
    services: Arc<AgentServices>,
}

impl GenerateAnswerStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl Step<ChatContext> for GenerateAnswerStep {
    fn name(&self) -> &str {
        "GenerateAnswerStep"
    }

    async fn run(&self, ctx: &ChatContext) -> AppResult<ChatPatch> {
        let Some(messages) = answer_messages(&self.services, ctx)? else {
            tracing::info!(task = ctx.task.kind(), "No evidence retrieved, answering with fallback");
            return Ok(ChatPatch::answer(NO_EVIDENCE_ANSWER));
        };

        let raw = self.services.llm.execute(messages).await?;

        let mut filter = ThinkingFilter::new(self.services.thinking.clone());
        let mut answer = filter.filter(&raw);
        answer.push_str(&filter.finalize());

        Ok(ChatPatch::answer(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{needles, services, FakeDirectory, FakeIndex, FakeLlm};
    use docqa_llm::ChatRole;
    use docqa_retrieval::RetrievedPassage;

    fn grounded(task: Task, history: Vec<ChatMessage>) -> ChatContext {
        let mut ctx = ChatContext::new("What is it?", task, history);
        ctx.passages = Some(vec![RetrievedPassage::new("text", Some(4))]);
        ctx.context_string = Some("[Trang 4]\ntext".to_string());
        ctx
    }

    fn wire(llm: FakeLlm) -> (GenerateAnswerStep, Arc<FakeLlm>) {
        let llm = Arc::new(llm);
        let services = services(
            llm.clone(),
            Arc::new(FakeIndex::default()),
            FakeDirectory::default(),
        );
        (GenerateAnswerStep::new(services), llm)
    }

    #[tokio::test]
    async fn test_fallback_without_evidence_skips_model() {
        let (step, llm) = wire(FakeLlm::default().reply(needles::ANSWER, "should not be used"));

        let mut empty = ChatContext::new("q", Task::Library { owner: "a".into() }, Vec::new());
        empty.passages = Some(Vec::new());
        empty.context_string = Some(String::new());

        let patch = step.run(&empty).await.unwrap();
        assert_eq!(patch.answer.as_deref(), Some(NO_EVIDENCE_ANSWER));
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_document_messages() {
        let history: Vec<ChatMessage> = (0..8)
            .map(|i| ChatMessage::assistant(format!("h{}", i)))
            .collect();
        let (step, llm) = wire(FakeLlm::default().reply(needles::ANSWER, "It is X [Trang 4]."));

        let ctx = grounded(Task::SingleDocument { document_id: "d".into() }, history);
        let patch = step.run(&ctx).await.unwrap();
        assert_eq!(patch.answer.as_deref(), Some("It is X [Trang 4]."));

        let request = &llm.requests_for(needles::ANSWER)[0];
        assert_eq!(request.messages.len(), 8);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[1].content, "h2");
        assert_eq!(request.messages[6].content, "h7");
        assert!(request.messages[7].content.starts_with("## Document Context:\n[Trang 4]\ntext"));
    }

    #[tokio::test]
    async fn test_prompt_follows_task() {
        let (step, llm) = wire(
            FakeLlm::default()
                .reply(needles::SYNTHESIS, "synthesized")
                .reply(needles::LIBRARY, "library"),
        );

        let library = grounded(Task::Library { owner: "a".into() }, Vec::new());
        assert_eq!(step.run(&library).await.unwrap().answer.as_deref(), Some("library"));

        let synthesis = grounded(
            Task::Synthesis {
                owner: "a".into(),
                document_ids: vec!["x".into(), "y".into(), "z".into()],
            },
            Vec::new(),
        );
        assert_eq!(
            step.run(&synthesis).await.unwrap().answer.as_deref(),
            Some("synthesized")
        );
        let request = &llm.requests_for(needles::SYNTHESIS)[0];
        assert!(request.messages[1]
            .content
            .starts_with("## Selected Documents Context (3 documents):"));
    }

    #[tokio::test]
    async fn test_thinking_removed_from_answer() {
        let (step, _) = wire(
            FakeLlm::default().reply(needles::ANSWER, "<thinking>plan</thinking>Final answer"),
        );
        let ctx = grounded(Task::SingleDocument { document_id: "d".into() }, Vec::new());
        assert_eq!(step.run(&ctx).await.unwrap().answer.as_deref(), Some("Final answer"));
    }

    #[tokio::test]
    async fn test_model_failure_fails_step() {
        let (step, _) = wire(FakeLlm::default().fail(needles::ANSWER, "quota"));
        let ctx = grounded(Task::SingleDocument { document_id: "d".into() }, Vec::new());
        assert!(!step.execute(&ctx).await.success);
    }
}
