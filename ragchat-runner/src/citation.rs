//! Source citations for an answer.

use std::collections::HashSet;
use std::fmt;

use ragchat_retrieval::RetrievedDocument;
use serde::{Deserialize, Serialize};

/// A numbered reference to one distinct document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based position among the turn's citations.
    pub index: usize,
    pub source: String,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[[{}]]({})", self.index, self.source)
    }
}

/// One citation per distinct source, in first-seen order.
///
/// Documents without a source (or with an empty one) are skipped.
pub fn extract_citations(documents: &[RetrievedDocument]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    documents
        .iter()
        .filter_map(RetrievedDocument::source)
        .filter(|source| !source.is_empty() && seen.insert(*source))
        .enumerate()
        .map(|(n, source)| Citation { index: n + 1, source: source.to_string() })
        .collect()
}

/// Render citations as `[[1]](a) [[2]](b)`.
pub fn render_citations(citations: &[Citation]) -> String {
    citations.iter().map(Citation::to_string).collect::<Vec<_>>().join(" ")
}
