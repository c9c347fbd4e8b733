//! Retrieval for docqa.
//!
//! This crate turns a question into grounding material:
//! - `Retriever` capability and its `RetrieverTool` wrapper
//! - Multi-query retrieval over one document namespace
//! - Concurrent fan-out across many namespaces (library and synthesis scope)
//! - Citation-annotated context strings
//! - A file-backed local index, document catalog and ingestion pipeline

pub mod catalog;
pub mod citation;
pub mod dedup;
pub mod embeddings;
pub mod global;
pub mod index;
pub mod ingest;
pub mod multi_query;
pub mod retriever;
pub mod types;

// Re-export main types
pub use catalog::{DocumentCatalog, DocumentDirectory};
pub use citation::{build_context, citation_tag, CitationScope};
pub use dedup::{fingerprint, Deduplicator, FINGERPRINT_LEN};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use global::retrieve_global;
pub use index::LocalIndex;
pub use ingest::{split_pages, Ingestor};
pub use multi_query::retrieve_multi_query;
pub use retriever::{RetrievalQuery, Retriever, RetrieverTool};
pub use types::{DocumentRecord, IndexedPassage, RetrievedPassage};
