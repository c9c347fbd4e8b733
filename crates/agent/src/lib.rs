//! Document question answering agent.
//!
//! Typed step pipelines over the generation and retrieval capabilities:
//! - Blocking and streaming answers for one document, a whole library or
//!   an explicit selection of documents
//! - Follow-up suggestions, conversation titles and mind maps
//!
//! A pipeline is a list of [`Step`]s run in order by a [`Workflow`]; each
//! step returns a patch that is merged into the context. Streaming
//! pipelines add one [`StreamingStep`] and run post steps after it.

pub mod chat_agent;
pub mod context;
pub mod mindmap;
pub mod services;
pub mod step;
pub mod steps;
pub mod streaming;
pub mod title;
pub mod workflow;
pub mod workflows;

#[cfg(test)]
mod testing;

pub use chat_agent::{AgentChunk, ChatAgent, ChatAnswer};
pub use context::{
    ChatContext, ChatPatch, ChatRequest, MindmapContext, MindmapEdge, MindmapNode, MindmapPatch,
    NodeKind, Task, WorkflowContext,
};
pub use mindmap::{Mindmap, MindmapAgent};
pub use services::AgentServices;
pub use step::{Step, StepResult};
pub use steps::NO_EVIDENCE_ANSWER;
pub use streaming::{ChunkStream, StreamChunk, StreamingStep, StreamingWorkflow};
pub use title::generate_title;
pub use workflow::Workflow;
