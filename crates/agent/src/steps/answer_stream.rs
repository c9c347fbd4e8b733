//! Streaming answer generation.

use super::answer::{answer_messages, NO_EVIDENCE_ANSWER};
use crate::context::{ChatContext, ChatPatch};
use crate::services::AgentServices;
use crate::streaming::{ChunkStream, StreamChunk, StreamingStep};
use docqa_core::{AppResult, Tool};
use docqa_llm::{strip_thinking, TokenStream};
use futures::{stream, StreamExt};
use std::sync::Arc;

/// Streams answer tokens with thinking spans removed, then one data chunk
/// carrying the whole visible answer.
pub struct GenerateAnswerStreamStep {
    services: Arc<AgentServices>,
}

impl GenerateAnswerStreamStep {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }
}

/// Forward tokens, accumulating them; an error ends the stream.
fn relay(tokens: TokenStream) -> ChunkStream<ChatPatch> {
    let chunks = stream::unfold(Some((tokens, String::new())), |state| async move {
        let (mut tokens, mut answer) = state?;
        match tokens.next().await {
            Some(Ok(text)) => {
                answer.push_str(&text);
                Some((StreamChunk::Token(text), Some((tokens, answer))))
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Answer stream broke off");
                Some((StreamChunk::Error(e.to_string()), None))
            }
            None => Some((StreamChunk::Data(ChatPatch::answer(answer)), None)),
        }
    });
    Box::pin(chunks)
}

#[async_trait::async_trait]
impl StreamingStep<ChatContext> for GenerateAnswerStreamStep {
    fn name(&self) -> &str {
        "GenerateAnswerStreamStep"
    }

    async fn stream(&self, ctx: &ChatContext) -> AppResult<ChunkStream<ChatPatch>> {
        let Some(messages) = answer_messages(&self.services, ctx)? else {
            tracing::info!(task = ctx.task.kind(), "No evidence retrieved, streaming fallback");
            return Ok(Box::pin(stream::iter([
                StreamChunk::Token(NO_EVIDENCE_ANSWER.to_string()),
                StreamChunk::Data(ChatPatch::answer(NO_EVIDENCE_ANSWER)),
            ])));
        };

        let tokens = self.services.llm_stream.execute(messages).await?;
        Ok(relay(strip_thinking(tokens, self.services.thinking.clone())))
    }
}
