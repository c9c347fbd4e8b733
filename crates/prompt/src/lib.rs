//! Prompt system for docqa.
//!
//! Prompts are YAML definitions with a system message and a Handlebars
//! user template. A fixed set ships inside the binary; a workspace can
//! replace any of them with `.docqa/prompts/<id>.yml`.

pub mod builder;
pub mod builtin;
pub mod library;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use library::PromptLibrary;
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
