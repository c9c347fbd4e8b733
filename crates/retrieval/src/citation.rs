//! Citation-annotated context strings.

use crate::types::RetrievedPassage;

/// Separator placed between tagged passages.
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Attribution style for citation tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationScope {
    /// One document: tags carry the page only.
    Single,
    /// Many documents: tags carry the document name and page.
    Multi,
}

/// Citation tag for one passage.
///
/// `Single` yields `[Trang N]`, or an empty tag when the page is unknown.
/// `Multi` yields `[Name - Trang N]`, or `[Name]`. Pages are 1-based, so
/// page 0 counts as unknown.
pub fn citation_tag(passage: &RetrievedPassage, scope: CitationScope) -> String {
    let page = passage.page_number.filter(|&page| page > 0);
    match scope {
        CitationScope::Single => match page {
            Some(page) => format!("[Trang {}]", page),
            None => String::new(),
        },
        CitationScope::Multi => {
            let name = passage.source_name.as_deref().unwrap_or_default();
            match page {
                Some(page) => format!("[{} - Trang {}]", name, page),
                None => format!("[{}]", name),
            }
        }
    }
}

/// Render every passage as `"{tag}\n{text}"` and join them with
/// [`PASSAGE_SEPARATOR`]. No passages yields an empty string.
pub fn build_context(passages: &[RetrievedPassage], scope: CitationScope) -> String {
    passages
        .iter()
        .map(|p| format!("{}\n{}", citation_tag(p, scope), p.text))
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_scope() {
        let passages = vec![
            RetrievedPassage::new("first", Some(3)),
            RetrievedPassage::new("second", None),
        ];
        assert_eq!(
            build_context(&passages, CitationScope::Single),
            "[Trang 3]\nfirst\n\n---\n\n\nsecond"
        );
    }

    #[test]
    fn test_multi_scope() {
        let passages = vec![
            RetrievedPassage::new("x", Some(7)).with_source("d1", "Luận văn.pdf"),
            RetrievedPassage::new("y", None).with_source("d2", "Notes"),
        ];
        assert_eq!(
            build_context(&passages, CitationScope::Multi),
            "[Luận văn.pdf - Trang 7]\nx\n\n---\n\n[Notes]\ny"
        );
    }

    #[test]
    fn test_page_zero_has_no_page_tag() {
        let passage = RetrievedPassage::new("z", Some(0)).with_source("d1", "Notes");
        assert_eq!(citation_tag(&passage, CitationScope::Single), "");
        assert_eq!(citation_tag(&passage, CitationScope::Multi), "[Notes]");
    }

    #[test]
    fn test_empty() {
        assert_eq!(build_context(&[], CitationScope::Multi), "");
    }
}
