//! Prompt builder: renders definitions into messages.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system message and the user template are rendered with the
/// same variables. Missing variables render as empty strings.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is chapter 2 about?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = match &definition.system {
        Some(template) => Some(render_template(template, &variables)?),
        None => None,
    };
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(system, user, definition.id.clone(), variables))
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text; document content must pass through untouched
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptOutputSpec;

    fn definition(system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: "Question: {{question}}".to_string(),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "a < b && \"c\"".to_string());

        let rendered = render_template("Q: {{question}}", &vars).unwrap();
        assert_eq!(rendered, "Q: a < b && \"c\"");
    }

    #[test]
    fn test_build_renders_system_and_user() {
        let def = definition(Some("Generate {{count}} queries."));
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Test question".to_string());
        vars.insert("count".to_string(), "2-3 diverse".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.system.as_deref(), Some("Generate 2-3 diverse queries."));
        assert_eq!(built.user, "Question: Test question");
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let built = build_prompt(&definition(None), HashMap::new()).unwrap();
        assert_eq!(built.user, "Question: ");
        assert!(built.system.is_none());
    }
}
