//! Conversation titles.

use crate::services::AgentServices;
use crate::steps::truncate_chars;
use docqa_core::{AppResult, Tool};
use docqa_prompt::builtin::CHAT_TITLE;

const MAX_TITLE_CHARS: usize = 100;
const FALLBACK_TITLE_CHARS: usize = 50;

/// Short title for a conversation opened with `message`.
///
/// Never fails. When the model cannot produce one, the title is the start
/// of the message itself.
pub async fn generate_title(
    services: &AgentServices,
    message: &str,
    document_name: Option<&str>,
) -> String {
    match ask_model(services, message, document_name).await {
        Ok(title) if !title.is_empty() => title,
        Ok(_) => fallback_title(message),
        Err(e) => {
            tracing::warn!(error = %e, "Title generation failed");
            fallback_title(message)
        }
    }
}

async fn ask_model(
    services: &AgentServices,
    message: &str,
    document_name: Option<&str>,
) -> AppResult<String> {
    let messages = services.prompt_messages(
        CHAT_TITLE,
        [
            ("document_name", document_name.unwrap_or("Document")),
            ("message", message),
        ],
    )?;
    let reply = services.llm.execute(messages).await?;
    Ok(truncate_chars(reply.trim(), MAX_TITLE_CHARS).to_string())
}

fn fallback_title(message: &str) -> String {
    let head = truncate_chars(message, FALLBACK_TITLE_CHARS);
    if head.len() < message.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}
