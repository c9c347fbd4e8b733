//! Content fingerprints and first-wins deduplication.

use crate::types::RetrievedPassage;
use std::collections::HashSet;

/// Characters of passage text that make up a fingerprint.
pub const FINGERPRINT_LEN: usize = 100;

/// Lower-cased prefix of `text`, `len` characters long.
pub fn fingerprint_with_len(text: &str, len: usize) -> String {
    text.chars().take(len).collect::<String>().to_lowercase()
}

/// Deduplication key of a passage.
pub fn fingerprint(text: &str) -> String {
    fingerprint_with_len(text, FINGERPRINT_LEN)
}

/// Accumulates passages, keeping the first one for each fingerprint.
#[derive(Debug)]
pub struct Deduplicator {
    len: usize,
    seen: HashSet<String>,
    kept: Vec<RetrievedPassage>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::with_fingerprint_len(FINGERPRINT_LEN)
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fingerprint_len(len: usize) -> Self {
        Self {
            len,
            seen: HashSet::new(),
            kept: Vec::new(),
        }
    }

    /// Keep `passage` unless its fingerprint was already seen.
    /// Returns whether it was kept.
    pub fn push(&mut self, passage: RetrievedPassage) -> bool {
        if self.seen.insert(fingerprint_with_len(&passage.text, self.len)) {
            self.kept.push(passage);
            true
        } else {
            false
        }
    }

    pub fn extend(&mut self, passages: impl IntoIterator<Item = RetrievedPassage>) {
        for passage in passages {
            self.push(passage);
        }
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Kept passages in first-seen order, truncated to `top_k`.
    pub fn finish(mut self, top_k: usize) -> Vec<RetrievedPassage> {
        self.kept.truncate(top_k);
        self.kept
    }
}
