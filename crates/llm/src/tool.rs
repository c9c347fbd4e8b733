//! Generation capabilities as `Tool`s.
//!
//! `LlmTool` performs one full completion; `LlmStreamTool` yields the text
//! fragments of a streamed completion. Both share one client handle.

use crate::client::{ChatMessage, LlmClient, LlmRequest};
use docqa_core::{AppResult, Tool};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;

/// Stream of text fragments from a generation call.
pub type TokenStream = Pin<Box<dyn Stream<Item = AppResult<String>> + Send>>;

/// Single-shot completion capability.
#[derive(Clone)]
pub struct LlmTool {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: Option<f32>,
}

impl LlmTool {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, messages: Vec<ChatMessage>) -> LlmRequest {
        let request = LlmRequest::new(messages, self.model.clone());
        match self.temperature {
            Some(t) => request.with_temperature(t),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl Tool for LlmTool {
    type Input = Vec<ChatMessage>;
    type Output = String;

    fn name(&self) -> &str {
        "LLMTool"
    }

    async fn run(&self, messages: Vec<ChatMessage>) -> AppResult<String> {
        let response = self.client.complete(&self.request(messages)).await?;
        tracing::debug!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            "Completion finished"
        );
        Ok(response.content)
    }
}

/// Streaming completion capability.
#[derive(Clone)]
pub struct LlmStreamTool {
    inner: LlmTool,
}

impl LlmStreamTool {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            inner: LlmTool::new(client, model),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.inner = self.inner.with_temperature(temperature);
        self
    }
}

#[async_trait::async_trait]
impl Tool for LlmStreamTool {
    type Input = Vec<ChatMessage>;
    type Output = TokenStream;

    fn name(&self) -> &str {
        "LLMStreamTool"
    }

    async fn run(&self, messages: Vec<ChatMessage>) -> AppResult<TokenStream> {
        let chunks = self.inner.client.stream(&self.inner.request(messages)).await?;

        // Stop at the provider's done marker; drop empty fragments.
        let tokens = chunks
            .scan(false, |finished, chunk| {
                if *finished {
                    return futures::future::ready(None);
                }
                let item = match chunk {
                    Ok(chunk) => {
                        *finished = chunk.done;
                        Ok(chunk.content)
                    }
                    Err(e) => {
                        *finished = true;
                        Err(e)
                    }
                };
                futures::future::ready(Some(item))
            })
            .filter(|item| {
                futures::future::ready(!matches!(item, Ok(text) if text.is_empty()))
            });

        Ok(Box::pin(tokens))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::{LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
    use docqa_core::AppError;
    use std::sync::Mutex;

    /// Client that replays canned output and records the requests it saw.
    pub(crate) struct ScriptedClient {
        pub reply: AppResult<String>,
        pub chunks: Vec<String>,
        pub seen: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedClient {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                chunks: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(1, 1),
                }),
                Err(e) => Err(AppError::Llm(e.to_string())),
            }
        }

        async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
            self.seen.lock().unwrap().push(request.clone());
            let mut items: Vec<AppResult<LlmStreamChunk>> = self
                .chunks
                .iter()
                .map(|c| Ok(LlmStreamChunk::text(c.clone())))
                .collect();
            items.push(Ok(LlmStreamChunk {
                content: String::new(),
                done: true,
                usage: None,
            }));
            items.push(Ok(LlmStreamChunk::text("after done")));
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    #[tokio::test]
    async fn test_llm_tool_returns_content() {
        let client = Arc::new(ScriptedClient::replying("Xin chào"));
        let tool = LlmTool::new(client.clone(), "llama3.2").with_temperature(0.2);

        let out = tool.execute(vec![ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(out, "Xin chào");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].model, "llama3.2");
        assert_eq!(seen[0].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_llm_tool_propagates_failure() {
        let client = Arc::new(ScriptedClient {
            reply: Err(AppError::Llm("quota exceeded".to_string())),
            chunks: Vec::new(),
            seen: Mutex::new(Vec::new()),
        });
        let tool = LlmTool::new(client, "m");
        let err = tool.execute(vec![ChatMessage::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_stream_tool_stops_at_done_and_skips_empty() {
        let client = Arc::new(ScriptedClient {
            reply: Ok(String::new()),
            chunks: vec!["Hel".to_string(), String::new(), "lo".to_string()],
            seen: Mutex::new(Vec::new()),
        });
        let tool = LlmStreamTool::new(client, "m");

        let tokens: Vec<String> = tool
            .execute(vec![ChatMessage::user("hi")])
            .await
            .unwrap()
            .map(|t| t.unwrap())
            .collect()
            .await;
        assert_eq!(tokens, vec!["Hel", "lo"]);
    }
}
