//! Docs command handler.
//!
//! Adds extracted document text to the workspace index and lists what is
//! registered.

use super::print_json;
use clap::{Args, Subcommand};
use docqa_core::{config::AppConfig, AppResult};
use docqa_retrieval::{create_provider, DocumentCatalog, DocumentRecord, Ingestor, LocalIndex};
use std::path::PathBuf;

/// Document management
#[derive(Args, Debug)]
pub struct DocsCommand {
    #[command(subcommand)]
    pub action: DocsAction,
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// Index a text file (pages separated by form feeds)
    Add(DocsAddCommand),
    /// List the documents of the configured user
    List(DocsListCommand),
}

impl DocsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            DocsAction::Add(cmd) => cmd.execute(config).await,
            DocsAction::List(cmd) => cmd.execute(config),
        }
    }
}

/// Index a document
#[derive(Args, Debug)]
pub struct DocsAddCommand {
    /// Path to the extracted text
    pub path: PathBuf,

    /// Display name used in citations (default: file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsAddCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing docs add command for {:?}", self.path);

        let embedder = create_provider(&config.rag.embedding)?;
        let ingestor = Ingestor::new(
            DocumentCatalog::new(&config.workspace),
            LocalIndex::new(&config.workspace, embedder),
            config.rag.chunk_size,
            config.rag.chunk_overlap,
        )?;

        let record = ingestor
            .ingest_file(&self.path, self.name.as_deref(), &config.user)
            .await?;

        if self.json {
            print_json(&serde_json::to_value(&record)?)
        } else {
            println!(
                "Added {} as {} ({} pages, {} passages)",
                record.name, record.id, record.pages, record.chunks
            );
            Ok(())
        }
    }
}

/// List documents
#[derive(Args, Debug)]
pub struct DocsListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsListCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing docs list command");

        let records = DocumentCatalog::new(&config.workspace).list_for_owner(&config.user, None)?;

        if self.json {
            return print_json(&serde_json::to_value(&records)?);
        }

        if records.is_empty() {
            println!("No documents. Add one with 'docqa docs add <path>'.");
            return Ok(());
        }
        for record in &records {
            println!("{}", summary_line(record));
        }
        Ok(())
    }
}

fn summary_line(record: &DocumentRecord) -> String {
    format!(
        "{}  {}  {} pages, {} passages, added {}",
        record.id,
        record.name,
        record.pages,
        record.chunks,
        record.added_at.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let mut record = DocumentRecord::new("Budget.pdf", "alice").with_id("d1");
        record.pages = 12;
        record.chunks = 40;

        let line = summary_line(&record);
        assert!(line.starts_with("d1  Budget.pdf  12 pages, 40 passages, added "));
    }
}
