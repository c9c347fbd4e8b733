//! Prompt definitions compiled into the binary.

pub const CHAT_ANSWER: &str = "chat.answer";
pub const LIBRARY_ANSWER: &str = "library.answer";
pub const SYNTHESIS_ANSWER: &str = "synthesis.answer";
pub const CHAT_SUGGESTIONS: &str = "chat.suggestions";
pub const CHAT_SEARCH_QUERIES: &str = "chat.search-queries";
pub const CHAT_TITLE: &str = "chat.title";
pub const MINDMAP_GENERATE: &str = "mindmap.generate";

/// `(id, yaml)` pairs for every built-in prompt.
pub const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (CHAT_ANSWER, include_str!("../prompts/chat.answer.yml")),
    (LIBRARY_ANSWER, include_str!("../prompts/library.answer.yml")),
    (SYNTHESIS_ANSWER, include_str!("../prompts/synthesis.answer.yml")),
    (CHAT_SUGGESTIONS, include_str!("../prompts/chat.suggestions.yml")),
    (CHAT_SEARCH_QUERIES, include_str!("../prompts/chat.search-queries.yml")),
    (CHAT_TITLE, include_str!("../prompts/chat.title.yml")),
    (MINDMAP_GENERATE, include_str!("../prompts/mindmap.generate.yml")),
];

/// Raw YAML of a built-in prompt.
pub fn builtin_source(id: &str) -> Option<&'static str> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(builtin_id, _)| *builtin_id == id)
        .map(|(_, yaml)| *yaml)
}
