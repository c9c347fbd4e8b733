//! Resolved set of prompts for one workspace.

use crate::builder::build_prompt;
use crate::builtin::{builtin_source, BUILTIN_PROMPTS};
use crate::loader::{list_prompts, load_prompt, parse_prompt};
use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// Every built-in prompt, with workspace overrides applied.
///
/// Definitions are resolved once up front so a broken override fails at
/// startup rather than in the middle of a request.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    definitions: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library containing only the compiled-in prompts.
    pub fn builtin() -> AppResult<Self> {
        let mut definitions = HashMap::new();
        for (id, source) in BUILTIN_PROMPTS {
            definitions.insert(id.to_string(), parse_prompt(source, "built-in")?);
        }
        Ok(Self { definitions })
    }

    /// Library for a workspace: built-ins, each replaced by
    /// `.docqa/prompts/<id>.yml` when present. Override files that match
    /// no built-in id are ignored with a warning.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        for id in list_prompts(workspace_path)? {
            if builtin_source(&id).is_none() {
                tracing::warn!(prompt = %id, "Ignoring prompt file that overrides nothing");
            }
        }

        let mut definitions = HashMap::new();
        for (id, _) in BUILTIN_PROMPTS {
            definitions.insert(id.to_string(), load_prompt(workspace_path, id)?);
        }
        tracing::debug!(count = definitions.len(), "Prompt library loaded");
        Ok(Self { definitions })
    }

    pub fn get(&self, id: &str) -> Option<&PromptDefinition> {
        self.definitions.get(id)
    }

    /// Render prompt `id` with the given variables.
    pub fn render<I, K, V>(&self, id: &str, vars: I) -> AppResult<BuiltPrompt>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let definition = self
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", id)))?;

        let variables = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        build_prompt(definition, variables)
    }
}
