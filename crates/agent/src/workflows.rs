//! Pipeline definitions.

use crate::context::{ChatContext, MindmapContext};
use crate::services::AgentServices;
use crate::steps::{
    GenerateAnswerStep, GenerateAnswerStreamStep, GenerateMindmapStep, GenerateSearchQueriesStep,
    GenerateSuggestionsStep, GlobalRetrieveContextStep, RetrieveChunksStep, RetrieveContextStep,
    SynthesisRetrieveContextStep,
};
use crate::streaming::StreamingWorkflow;
use crate::workflow::Workflow;
use std::sync::Arc;

/// Single document: rewrite, retrieve, answer, suggest.
pub fn answer_question(services: &Arc<AgentServices>) -> Workflow<ChatContext> {
    Workflow::new("AnswerQuestion")
        .step(GenerateSearchQueriesStep::new(services.clone()))
        .step(RetrieveContextStep::new(services.clone()))
        .step(GenerateAnswerStep::new(services.clone()))
        .step(GenerateSuggestionsStep::new(services.clone()))
}

/// Whole library of one owner.
pub fn answer_library(services: &Arc<AgentServices>) -> Workflow<ChatContext> {
    Workflow::new("AnswerLibrary")
        .step(GlobalRetrieveContextStep::new(services.clone()))
        .step(GenerateAnswerStep::new(services.clone()))
        .step(GenerateSuggestionsStep::new(services.clone()))
}

/// Explicit document subset.
pub fn answer_synthesis(services: &Arc<AgentServices>) -> Workflow<ChatContext> {
    Workflow::new("AnswerSynthesis")
        .step(SynthesisRetrieveContextStep::new(services.clone()))
        .step(GenerateAnswerStep::new(services.clone()))
        .step(GenerateSuggestionsStep::new(services.clone()))
}

pub fn answer_question_stream(services: &Arc<AgentServices>) -> StreamingWorkflow<ChatContext> {
    let preparation = Workflow::new("AnswerQuestionStream")
        .step(GenerateSearchQueriesStep::new(services.clone()))
        .step(RetrieveContextStep::new(services.clone()));
    streamed(preparation, services)
}

pub fn answer_library_stream(services: &Arc<AgentServices>) -> StreamingWorkflow<ChatContext> {
    let preparation =
        Workflow::new("AnswerLibraryStream").step(GlobalRetrieveContextStep::new(services.clone()));
    streamed(preparation, services)
}

pub fn answer_synthesis_stream(services: &Arc<AgentServices>) -> StreamingWorkflow<ChatContext> {
    let preparation = Workflow::new("AnswerSynthesisStream")
        .step(SynthesisRetrieveContextStep::new(services.clone()));
    streamed(preparation, services)
}

fn streamed(
    preparation: Workflow<ChatContext>,
    services: &Arc<AgentServices>,
) -> StreamingWorkflow<ChatContext> {
    StreamingWorkflow::new(preparation, GenerateAnswerStreamStep::new(services.clone()))
        .post_step(GenerateSuggestionsStep::new(services.clone()))
}

pub fn generate_mindmap(services: &Arc<AgentServices>) -> Workflow<MindmapContext> {
    Workflow::new("GenerateMindmap")
        .step(RetrieveChunksStep::new(services.clone()))
        .step(GenerateMindmapStep::new(services.clone()))
}
