//! Command handlers for the docqa CLI.

pub mod ask;
pub mod docs;
pub mod mindmap;
pub mod title;

pub use ask::AskCommand;
pub use docs::DocsCommand;
pub use mindmap::MindmapCommand;
pub use title::TitleCommand;

use docqa_core::AppResult;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
