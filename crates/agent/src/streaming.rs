//! Three-phase streaming composition.
//!
//! Preparation steps run fail-fast, one streaming step produces chunks,
//! then best-effort post steps add data. The driver runs in its own task
//! and talks to the consumer over a bounded channel; it checks at every
//! await whether the consumer has gone away and stops if so.

use crate::context::WorkflowContext;
use crate::step::Step;
use crate::workflow::Workflow;
use docqa_core::AppResult;
use futures::{FutureExt, Stream, StreamExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const CHANNEL_CAPACITY: usize = 32;

/// Item of a workflow stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk<P> {
    Token(String),
    Data(P),
    Error(String),
    Done,
}

impl<P> StreamChunk<P> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamChunk::Error(_) | StreamChunk::Done)
    }
}

/// Chunks produced by a streaming step.
pub type ChunkStream<P> = Pin<Box<dyn Stream<Item = StreamChunk<P>> + Send>>;

/// Step that yields its output progressively.
#[async_trait::async_trait]
pub trait StreamingStep<C: WorkflowContext>: Send + Sync {
    fn name(&self) -> &str;

    /// Start producing chunks for `ctx`. The returned stream must not
    /// borrow the context.
    async fn stream(&self, ctx: &C) -> AppResult<ChunkStream<C::Patch>>;
}

/// Preparation steps, one streaming step, optional post steps.
pub struct StreamingWorkflow<C: WorkflowContext> {
    preparation: Workflow<C>,
    streaming: Arc<dyn StreamingStep<C>>,
    post: Vec<Arc<dyn Step<C>>>,
}

impl<C: WorkflowContext> Clone for StreamingWorkflow<C> {
    fn clone(&self) -> Self {
        Self {
            preparation: self.preparation.clone(),
            streaming: self.streaming.clone(),
            post: self.post.clone(),
        }
    }
}

type ChunkSender<P> = mpsc::Sender<StreamChunk<P>>;

/// Await `fut` unless the receiver is dropped first.
async fn unless_closed<P, F: Future>(tx: &ChunkSender<P>, fut: F) -> Option<F::Output> {
    tokio::select! {
        out = fut => Some(out),
        _ = tx.closed() => None,
    }
}

impl<C: WorkflowContext> StreamingWorkflow<C> {
    pub fn new(preparation: Workflow<C>, streaming: impl StreamingStep<C> + 'static) -> Self {
        Self {
            preparation,
            streaming: Arc::new(streaming),
            post: Vec::new(),
        }
    }

    /// Append a post-processing step.
    pub fn post_step(mut self, step: impl Step<C> + 'static) -> Self {
        self.post.push(Arc::new(step));
        self
    }

    pub fn name(&self) -> &str {
        self.preparation.name()
    }

    /// Start the workflow on a private copy of `initial`.
    ///
    /// The stream always ends with exactly one `Done` or `Error` chunk.
    /// Dropping it cancels the run at its next suspension point.
    pub fn execute(&self, initial: &C) -> ReceiverStream<StreamChunk<C::Patch>> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let workflow = self.clone();
        let ctx = initial.clone();

        tokio::spawn(async move {
            let name = workflow.name().to_string();
            let guard = tx.clone();
            // drive returns right after any terminal send, so a panic means
            // none went out yet.
            if let Err(panic) = AssertUnwindSafe(workflow.drive(ctx, tx)).catch_unwind().await {
                let message = format!("Workflow '{}' aborted: {}", name, panic_message(&*panic));
                tracing::error!(workflow = %name, error = %message, "Streaming workflow panicked");
                let _ = guard.send(StreamChunk::Error(message)).await;
            }
        });

        ReceiverStream::new(rx)
    }

    async fn drive(self, mut ctx: C, tx: ChunkSender<C::Patch>) {
        let name = self.preparation.name().to_string();
        tracing::info!(workflow = %name, "Streaming workflow started");

        // Preparation
        for step in self.preparation.steps() {
            let Some(result) = unless_closed(&tx, step.execute(&ctx)).await else {
                tracing::debug!(workflow = %name, step = step.name(), "Consumer gone, stopping");
                return;
            };
            if !result.success {
                let message = format!(
                    "Workflow stopped at step '{}': {}",
                    step.name(),
                    result.error_message()
                );
                tracing::error!(workflow = %name, error = %message, "Preparation failed");
                let _ = tx.send(StreamChunk::Error(message)).await;
                return;
            }
            if let Some(patch) = result.data {
                ctx.apply(patch);
            }
        }

        // Streaming
        let started = unless_closed(&tx, self.streaming.stream(&ctx)).await;
        let mut chunks = match started {
            None => return,
            Some(Ok(chunks)) => chunks,
            Some(Err(err)) => {
                tracing::error!(workflow = %name, step = self.streaming.name(), error = %err, "Streaming step failed to start");
                let _ = tx.send(StreamChunk::Error(err.to_string())).await;
                return;
            }
        };

        loop {
            let Some(next) = unless_closed(&tx, chunks.next()).await else {
                tracing::debug!(workflow = %name, "Consumer gone during streaming");
                return;
            };
            let chunk = match next {
                None | Some(StreamChunk::Done) => break,
                Some(StreamChunk::Error(message)) => {
                    tracing::error!(workflow = %name, step = self.streaming.name(), error = %message, "Streaming step failed");
                    let _ = tx.send(StreamChunk::Error(message)).await;
                    return;
                }
                Some(StreamChunk::Data(patch)) => {
                    ctx.apply(patch.clone());
                    StreamChunk::Data(patch)
                }
                Some(token) => token,
            };
            if tx.send(chunk).await.is_err() {
                return;
            }
        }

        // Post-processing, best effort
        for step in &self.post {
            let Some(result) = unless_closed(&tx, step.execute(&ctx)).await else {
                return;
            };
            if !result.success {
                tracing::warn!(
                    workflow = %name,
                    step = step.name(),
                    error = %result.error_message(),
                    "Post step failed, skipping"
                );
                continue;
            }
            if let Some(patch) = result.data {
                ctx.apply(patch.clone());
                if tx.send(StreamChunk::Data(patch)).await.is_err() {
                    return;
                }
            }
        }

        let _ = tx.send(StreamChunk::Done).await;
        tracing::info!(workflow = %name, "Streaming workflow finished");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "step panicked".to_string()
    }
}
