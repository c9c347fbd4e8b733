//! Fail-fast sequential composition of steps.

use crate::context::WorkflowContext;
use crate::step::Step;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Ordered list of steps run against a private copy of the context.
pub struct Workflow<C: WorkflowContext> {
    name: String,
    steps: Vec<Arc<dyn Step<C>>>,
}

impl<C: WorkflowContext> Clone for Workflow<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            steps: self.steps.clone(),
        }
    }
}

impl<C: WorkflowContext> Workflow<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, step: impl Step<C> + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub(crate) fn steps(&self) -> &[Arc<dyn Step<C>>] {
        &self.steps
    }

    /// Run every step in order and return the final context.
    ///
    /// The caller's context is cloned first. The first failing step stops
    /// the run with `AppError::Workflow` naming that step; later steps are
    /// never started.
    pub async fn execute(&self, initial: &C) -> AppResult<C> {
        let mut ctx = initial.clone();
        tracing::info!(workflow = %self.name, steps = self.steps.len(), "Workflow started");

        for step in &self.steps {
            let result = step.execute(&ctx).await;
            if !result.success {
                let message = result.error_message();
                tracing::error!(workflow = %self.name, step = step.name(), error = %message, "Workflow aborted");
                return Err(AppError::Workflow {
                    step: step.name().to_string(),
                    message,
                });
            }
            if let Some(patch) = result.data {
                ctx.apply(patch);
            }
        }

        tracing::info!(workflow = %self.name, "Workflow finished");
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ChatPatch;
    use crate::step::tests::{library_ctx, ScriptedStep};

    #[tokio::test]
    async fn test_patches_applied_in_order() {
        let workflow = Workflow::new("Test")
            .step(ScriptedStep::writing(
                "Queries",
                ChatPatch {
                    search_queries: Some(vec!["a".into()]),
                    answer: Some("draft".into()),
                    ..Default::default()
                },
            ))
            .step(ScriptedStep::writing("Answer", ChatPatch::answer("final")));

        let initial = library_ctx("q");
        let out = workflow.execute(&initial).await.unwrap();
        assert_eq!(out.answer.as_deref(), Some("final"));
        assert_eq!(out.search_queries, Some(vec!["a".to_string()]));
        assert!(initial.answer.is_none());
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let first = ScriptedStep::writing("First", ChatPatch::answer("x"));
        let broken = ScriptedStep::failing("Broken");
        let never = ScriptedStep::writing("Never", ChatPatch::answer("y"));
        let (first_calls, never_calls) = (first.calls.clone(), never.calls.clone());

        let workflow = Workflow::new("Test").step(first).step(broken).step(never);
        assert_eq!(workflow.step_names(), ["First", "Broken", "Never"]);

        let err = workflow.execute(&library_ctx("q")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Workflow stopped at step 'Broken': Broken exploded"
        );
        assert_eq!(first_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(never_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_workflow_returns_copy() {
        let workflow: Workflow<crate::context::ChatContext> = Workflow::new("Empty");
        let out = workflow.execute(&library_ctx("q")).await.unwrap();
        assert_eq!(out.user_query, "q");
    }
}
