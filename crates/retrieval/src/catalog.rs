//! Document registry.
//!
//! Registered documents live in `.docqa/documents.jsonl`, one
//! `DocumentRecord` per line, appended on ingestion.

use crate::types::DocumentRecord;
use docqa_core::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Lookup of documents by owner, used by library and synthesis retrieval.
#[async_trait::async_trait]
pub trait DocumentDirectory: Send + Sync {
    /// Documents owned by `owner`. With a subset, only those ids, in
    /// subset order; ids that are unknown or owned by someone else are
    /// left out.
    async fn documents_for(
        &self,
        owner: &str,
        subset: Option<&[String]>,
    ) -> AppResult<Vec<DocumentRecord>>;

    async fn document(&self, id: &str) -> AppResult<Option<DocumentRecord>>;
}

/// JSONL-backed document catalog.
#[derive(Debug, Clone)]
pub struct DocumentCatalog {
    path: PathBuf,
}

impl DocumentCatalog {
    /// Catalog of the workspace at `workspace`.
    pub fn new(workspace: &Path) -> Self {
        Self::at(workspace.join(".docqa").join("documents.jsonl"))
    }

    /// Catalog stored in an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record.
    pub fn register(&self, record: &DocumentRecord) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Retrieval(format!("Failed to open documents.jsonl: {}", e)))?;

        let json_line = serde_json::to_string(record)?;
        writeln!(file, "{}", json_line).map_err(|e| {
            AppError::Retrieval(format!("Failed to write to documents.jsonl: {}", e))
        })?;
        file.sync_all()?;

        tracing::debug!(id = %record.id, name = %record.name, "Registered document");
        Ok(())
    }

    /// All records. When an id was registered more than once, the last
    /// registration replaces the earlier one in place.
    pub fn list(&self) -> AppResult<Vec<DocumentRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| AppError::Retrieval(format!("Failed to open documents.jsonl: {}", e)))?;

        let mut records: Vec<DocumentRecord> = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record: DocumentRecord = serde_json::from_str(&line).map_err(|e| {
                AppError::Retrieval(format!(
                    "Failed to parse line {} in documents.jsonl: {}",
                    line_num + 1,
                    e
                ))
            })?;

            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }

        Ok(records)
    }

    pub fn get(&self, id: &str) -> AppResult<Option<DocumentRecord>> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    /// Records owned by `owner`, optionally restricted to `subset` (in
    /// subset order).
    pub fn list_for_owner(
        &self,
        owner: &str,
        subset: Option<&[String]>,
    ) -> AppResult<Vec<DocumentRecord>> {
        let owned: Vec<DocumentRecord> = self
            .list()?
            .into_iter()
            .filter(|r| r.owner == owner)
            .collect();

        let Some(ids) = subset else {
            return Ok(owned);
        };

        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            match owned.iter().find(|r| &r.id == id) {
                Some(record) if !selected.iter().any(|s: &DocumentRecord| &s.id == id) => {
                    selected.push(record.clone())
                }
                Some(_) => {}
                None => tracing::warn!(document = %id, owner, "Requested document not found for owner"),
            }
        }
        Ok(selected)
    }
}

#[async_trait::async_trait]
impl DocumentDirectory for DocumentCatalog {
    async fn documents_for(
        &self,
        owner: &str,
        subset: Option<&[String]>,
    ) -> AppResult<Vec<DocumentRecord>> {
        self.list_for_owner(owner, subset)
    }

    async fn document(&self, id: &str) -> AppResult<Option<DocumentRecord>> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, owner: &str) -> DocumentRecord {
        DocumentRecord::new(format!("{}.pdf", id), owner).with_id(id)
    }

    #[test]
    fn test_register_creates_jsonl() {
        let temp = TempDir::new().unwrap();
        let catalog = DocumentCatalog::new(temp.path());

        catalog.register(&record("d1", "alice")).unwrap();
        assert!(temp.path().join(".docqa/documents.jsonl").exists());
    }

    #[test]
    fn test_list_empty_when_no_file() {
        let temp = TempDir::new().unwrap();
        assert!(DocumentCatalog::new(temp.path()).list().unwrap().is_empty());
    }

    #[test]
    fn test_reregistration_replaces_in_place() {
        let temp = TempDir::new().unwrap();
        let catalog = DocumentCatalog::new(temp.path());

        catalog.register(&record("d1", "alice")).unwrap();
        catalog.register(&record("d2", "alice")).unwrap();
        let mut updated = record("d1", "alice");
        updated.chunks = 42;
        catalog.register(&updated).unwrap();

        let all = catalog.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "d1");
        assert_eq!(all[0].chunks, 42);
        assert_eq!(catalog.get("d2").unwrap().unwrap().owner, "alice");
        assert!(catalog.get("zzz").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_scope_and_subset_order() {
        let temp = TempDir::new().unwrap();
        let catalog = DocumentCatalog::new(temp.path());
        for (id, owner) in [("d1", "alice"), ("d2", "bob"), ("d3", "alice"), ("d4", "alice")] {
            catalog.register(&record(id, owner)).unwrap();
        }

        let library = catalog.documents_for("alice", None).await.unwrap();
        assert_eq!(library.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["d1", "d3", "d4"]);

        let subset = vec!["d4".to_string(), "d2".to_string(), "d1".to_string(), "d4".to_string()];
        let picked = catalog.documents_for("alice", Some(&subset)).await.unwrap();
        assert_eq!(picked.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["d4", "d1"]);
    }

    #[test]
    fn test_corrupt_line_is_an_error() {
        let temp = TempDir::new().unwrap();
        let catalog = DocumentCatalog::new(temp.path());
        std::fs::create_dir_all(temp.path().join(".docqa")).unwrap();
        std::fs::write(catalog.path(), "{not json}\n").unwrap();
        assert!(catalog.list().is_err());
    }
}
