//! docqa CLI
//!
//! Main entry point for the docqa command-line tool: grounded question
//! answering over a local library of documents.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, DocsCommand, MindmapCommand, TitleCommand};
use docqa_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// docqa - ask questions about your documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Grounded question answering over your documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOCQA_MODEL")]
    model: Option<String>,

    /// Owner whose library is searched
    #[arg(short, long, global = true, env = "DOCQA_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question about one document, a selection or your library
    Ask(AskCommand),

    /// Add and list documents
    Docs(DocsCommand),

    /// Generate a mind map of a document
    Mindmap(MindmapCommand),

    /// Suggest a conversation title
    Title(TitleCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.user,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("docqa starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_docqa_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Docs(_) => "docs",
        Commands::Mindmap(_) => "mindmap",
        Commands::Title(_) => "title",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Docs(cmd) => cmd.execute(&config).await,
        Commands::Mindmap(cmd) => cmd.execute(&config).await,
        Commands::Title(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
