//! Title command handler.

use clap::Args;
use docqa_agent::{generate_title, AgentServices};
use docqa_core::{config::AppConfig, AppResult};

/// Suggest a conversation title for a first message
#[derive(Args, Debug)]
pub struct TitleCommand {
    /// The first message of the conversation
    pub message: String,

    /// Document the conversation is about
    #[arg(long)]
    pub doc: Option<String>,
}

impl TitleCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing title command");

        let services = AgentServices::from_config(config)?;
        let document_name = match &self.doc {
            Some(id) => services.directory.document(id).await?.map(|d| d.name),
            None => None,
        };
        if self.doc.is_some() && document_name.is_none() {
            tracing::warn!(document = ?self.doc, "Unknown document, titling without its name");
        }

        let title = generate_title(&services, &self.message, document_name.as_deref()).await;
        println!("{}", title);
        Ok(())
    }
}
