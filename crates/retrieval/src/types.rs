//! Retrieval type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A passage returned by a retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedPassage {
    /// Passage text
    pub text: String,

    /// 1-based page the passage was taken from, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    /// Document (namespace) the passage belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    /// Display name of that document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl RetrievedPassage {
    pub fn new(text: impl Into<String>, page_number: Option<u32>) -> Self {
        Self {
            text: text.into(),
            page_number,
            source_id: None,
            source_name: None,
        }
    }

    /// Attach the identity of the document the passage came from.
    pub fn with_source(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self.source_name = Some(name.into());
        self
    }
}

/// A registered document (one line of `documents.jsonl`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Document identifier, also its index namespace
    pub id: String,

    /// Display name used in citations
    pub name: String,

    /// Owner identity (library scope)
    pub owner: String,

    /// Path the text was ingested from
    #[serde(default)]
    pub path: String,

    /// Number of pages found in the source text
    #[serde(default)]
    pub pages: u32,

    /// Number of indexed passages
    #[serde(default)]
    pub chunks: u32,

    /// When the document was ingested
    pub added_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Record with a fresh identifier and no content yet.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            owner: owner.into(),
            path: String::new(),
            pages: 0,
            chunks: 0,
            added_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// A passage stored in the local index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedPassage {
    /// Position within the document, in ingestion order
    pub position: u32,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    pub embedding: Vec<f32>,
}
