//! Capability wrapper for external calls.
//!
//! Every call that leaves the process (generation, retrieval, embedding)
//! goes through a `Tool`. `execute` logs a failure with the tool's name and
//! hands the very same error back. It never retries and never swallows.

use crate::error::AppResult;

/// A named wrapper around one external capability.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Name used in log entries.
    fn name(&self) -> &str;

    /// Perform the wrapped call.
    async fn run(&self, input: Self::Input) -> AppResult<Self::Output>;

    /// Run the call, logging and re-raising any failure.
    async fn execute(&self, input: Self::Input) -> AppResult<Self::Output> {
        match self.run(input).await {
            Ok(output) => Ok(output),
            Err(err) => {
                tracing::error!(tool = self.name(), error = %err, "Tool call failed");
                Err(err)
            }
        }
    }
}
