//! docqa core library
//!
//! This crate provides the foundations shared by every docqa crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - The `Tool` capability wrapper

pub mod config;
pub mod error;
pub mod logging;
pub mod tool;

// Re-export commonly used types
pub use config::{AppConfig, RagConfig, ThinkingConfig};
pub use error::{AppError, AppResult};
pub use tool::Tool;
