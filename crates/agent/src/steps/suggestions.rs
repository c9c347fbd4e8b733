//! Follow-up question suggestions.

use super::{extract_string_array, truncate_chars};
use crate::context::{ChatContext, ChatPatch};
use crate::services::AgentServices;
use crate::step::Step;
use docqa_core::{AppResult, Tool};
use docqa_prompt::builtin::CHAT_SUGGESTIONS;
use std::sync::Arc;

const MAX_SUGGESTIONS: usize = 3;
const ANSWER_EXCERPT: usize = 500;
const CONTEXT_EXCERPT: usize = 1000;

/// Suggests up to three follow-up questions. Best effort: every failure
/// yields an empty list.
pub struct GenerateSuggestionsStep {
    services: Arc<AgentServices>,
}

impl GenerateSuggestionsStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn suggest(&self, ctx: &ChatContext, answer: &str, context: &str) -> AppResult<Vec<String>> {
        let messages = self.services.prompt_messages(
            CHAT_SUGGESTIONS,
            [
                ("question", ctx.user_query.as_str()),
                ("answer", truncate_chars(answer, ANSWER_EXCERPT)),
                ("context", truncate_chars(context, CONTEXT_EXCERPT)),
            ],
        )?;

        let reply = self.services.llm.execute(messages).await?;
        Ok(extract_string_array(&reply)
            .unwrap_or_default()
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .collect())
    }
}

#[async_trait::async_trait]
impl Step<ChatContext> for GenerateSuggestionsStep {
    fn name(&self) -> &str {
        "GenerateSuggestionsStep"
    }

    async fn run(&self, ctx: &ChatContext) -> AppResult<ChatPatch> {
        let answer = ctx.answer.as_deref().filter(|a| !a.is_empty());
        let context = ctx.context_string.as_deref().filter(|c| !c.is_empty());
        let (Some(answer), Some(context)) = (answer, context) else {
            return Ok(ChatPatch::suggestions(Vec::new()));
        };

        let suggestions = self.suggest(ctx, answer, context).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Suggestion generation failed");
            Vec::new()
        });
        Ok(ChatPatch::suggestions(suggestions))
    }
}
