//! Ingestion: text file to indexed, registered document.

use crate::catalog::DocumentCatalog;
use crate::index::LocalIndex;
use crate::types::{DocumentRecord, IndexedPassage};
use docqa_core::{AppError, AppResult};
use std::path::Path;
use text_splitter::{ChunkConfig, TextSplitter};

/// Page separator emitted by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

/// Split extracted text into `(page_number, text)` pairs, 1-based,
/// skipping blank pages.
pub fn split_pages(text: &str) -> Vec<(u32, &str)> {
    text.split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| (i as u32 + 1, page))
        .collect()
}

/// Chunks, embeds, stores and registers documents.
pub struct Ingestor {
    catalog: DocumentCatalog,
    index: LocalIndex,
    splitter: TextSplitter<text_splitter::Characters>,
}

impl Ingestor {
    pub fn new(
        catalog: DocumentCatalog,
        index: LocalIndex,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> AppResult<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunking settings: {}", e)))?;

        Ok(Self {
            catalog,
            index,
            splitter: TextSplitter::new(config),
        })
    }

    /// Split every page into passages that keep their page number.
    pub fn chunk_pages(&self, text: &str) -> Vec<(u32, String)> {
        split_pages(text)
            .into_iter()
            .flat_map(|(page, page_text)| {
                self.splitter
                    .chunks(page_text)
                    .filter(|chunk| !chunk.trim().is_empty())
                    .map(move |chunk| (page, chunk.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Ingest the text file at `path` for `owner`.
    ///
    /// The display name defaults to the file name. Returns the registered
    /// record, whose id is the document's index namespace.
    pub async fn ingest_file(
        &self,
        path: &Path,
        name: Option<&str>,
        owner: &str,
    ) -> AppResult<DocumentRecord> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Retrieval(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "Document".to_string()),
        };

        let mut record = DocumentRecord::new(name, owner);
        record.path = path.display().to_string();
        self.ingest_text(record, &text).await
    }

    /// Index `text` under `record.id` and register the record.
    pub async fn ingest_text(&self, mut record: DocumentRecord, text: &str) -> AppResult<DocumentRecord> {
        let chunks = self.chunk_pages(text);
        if chunks.is_empty() {
            return Err(AppError::Validation(format!(
                "Document '{}' contains no text",
                record.name
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|(_, t)| t.clone()).collect();
        let embeddings = self.index.embedder().embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(AppError::Retrieval(format!(
                "Embedding provider returned {} vectors for {} passages",
                embeddings.len(),
                texts.len()
            )));
        }

        let passages: Vec<IndexedPassage> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, ((page, text), embedding))| IndexedPassage {
                position: position as u32,
                text,
                page_number: Some(page),
                embedding,
            })
            .collect();

        self.index.write_namespace(&record.id, &passages).await?;

        record.pages = text.split(PAGE_BREAK).count() as u32;
        record.chunks = passages.len() as u32;
        self.catalog.register(&record)?;

        tracing::info!(
            id = %record.id,
            name = %record.name,
            pages = record.pages,
            chunks = record.chunks,
            "Document ingested"
        );
        Ok(record)
    }
}
