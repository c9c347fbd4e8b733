//! Pipeline step abstraction.

use crate::context::WorkflowContext;
use docqa_core::{AppError, AppResult};
use std::time::Instant;

/// Outcome of one step execution.
#[derive(Debug)]
pub struct StepResult<P> {
    pub success: bool,
    pub data: Option<P>,
    pub error: Option<AppError>,
    pub duration_ms: u64,
}

impl<P> StepResult<P> {
    pub fn ok(data: P, duration_ms: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            duration_ms,
        }
    }

    pub fn failed(error: AppError, duration_ms: u64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            duration_ms,
        }
    }

    /// Error text, empty when the step succeeded.
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }
}

/// One unit of work in a workflow.
///
/// `run` reads the context and returns the fields it writes. Steps keep no
/// state between calls.
#[async_trait::async_trait]
pub trait Step<C: WorkflowContext>: Send + Sync {
    /// Name used in logs and workflow errors.
    fn name(&self) -> &str;

    async fn run(&self, ctx: &C) -> AppResult<C::Patch>;

    /// Run the step, turning an error into a failed `StepResult`.
    async fn execute(&self, ctx: &C) -> StepResult<C::Patch> {
        let started = Instant::now();
        tracing::debug!(step = self.name(), "Step started");

        let result = self.run(ctx).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(patch) => {
                tracing::debug!(step = self.name(), duration_ms, "Step completed");
                StepResult::ok(patch, duration_ms)
            }
            Err(err) => {
                tracing::warn!(step = self.name(), duration_ms, error = %err, "Step failed");
                StepResult::failed(err, duration_ms)
            }
        }
    }
}
