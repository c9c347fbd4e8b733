//! Ask command handler.
//!
//! Answers a question over one document, a selection, or the whole library
//! of the configured user.

use super::print_json;
use clap::Args;
use docqa_agent::{AgentChunk, AgentServices, ChatAgent, ChatRequest};
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_llm::ChatMessage;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ask a question about your documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Answer from this document only
    #[arg(long, conflicts_with = "docs")]
    pub doc: Option<String>,

    /// Synthesize across these documents (comma separated ids)
    #[arg(long, value_delimiter = ',')]
    pub docs: Vec<String>,

    /// JSON file with earlier turns: [{"role": "user", "content": "..."}]
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Wait for the full answer instead of streaming tokens
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let request = self.request(&config.user)?;
        let agent = ChatAgent::new(Arc::new(AgentServices::from_config(config)?));

        if self.json || self.no_stream {
            self.handle_blocking(&agent, request).await
        } else {
            self.handle_streaming(&agent, request).await
        }
    }

    fn request(&self, owner: &str) -> AppResult<ChatRequest> {
        let mut request = ChatRequest::new(self.question.as_str(), owner);
        if let Some(doc) = &self.doc {
            request = request.with_document(doc.as_str());
        }
        if !self.docs.is_empty() {
            request = request.with_documents(self.docs.iter().cloned());
        }
        if let Some(path) = &self.history {
            request = request.with_history(load_history(path)?);
        }
        Ok(request)
    }

    async fn handle_blocking(&self, agent: &ChatAgent, request: ChatRequest) -> AppResult<()> {
        let answer = agent.answer(request).await?;

        if self.json {
            print_json(&serde_json::json!({
                "answer": answer.answer,
                "suggestions": answer.suggestions,
            }))
        } else {
            println!("{}", answer.answer);
            print_suggestions(&answer.suggestions);
            Ok(())
        }
    }

    async fn handle_streaming(&self, agent: &ChatAgent, request: ChatRequest) -> AppResult<()> {
        let mut stream = agent.stream(request);
        let mut stdout = std::io::stdout();

        while let Some(chunk) = stream.next().await {
            match chunk {
                AgentChunk::Token { content } => {
                    print!("{}", content);
                    stdout.flush().ok();
                }
                AgentChunk::Suggestions { suggestions } => {
                    println!();
                    print_suggestions(&suggestions);
                }
                AgentChunk::Error { error } => {
                    println!();
                    return Err(AppError::Other(error));
                }
                AgentChunk::Done => break,
            }
        }

        Ok(())
    }
}

fn print_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    println!();
    println!("Suggestions:");
    for suggestion in suggestions {
        println!("- {}", suggestion);
    }
}

/// Read earlier conversation turns from a JSON file.
fn load_history(path: &Path) -> AppResult<Vec<ChatMessage>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read history file {:?}: {}", path, e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use docqa_llm::ChatRole;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        ask: AskCommand,
    }

    fn parse(args: &[&str]) -> AskCommand {
        let mut argv = vec!["docqa"];
        argv.extend_from_slice(args);
        Wrapper::parse_from(argv).ask
    }

    #[test]
    fn test_docs_are_comma_separated() {
        let cmd = parse(&["compare them", "--docs", "a,b"]);
        let request = cmd.request("alice").unwrap();
        assert_eq!(request.document_ids, vec!["a", "b"]);
        assert_eq!(request.owner, "alice");
        assert!(request.document_id.is_none());
    }

    #[test]
    fn test_doc_and_docs_conflict() {
        let parsed = Wrapper::try_parse_from(["docqa", "q", "--doc", "a", "--docs", "b"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_history_file_loaded() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#,
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let request = parse(&["next?", "--doc", "d1", "--history", &path])
            .request("alice")
            .unwrap();
        assert_eq!(request.document_id.as_deref(), Some("d1"));
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[1].role, ChatRole::Assistant);
    }

    #[test]
    fn test_bad_history_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not json").unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert!(parse(&["q", "--history", &path]).request("alice").is_err());
    }
}
