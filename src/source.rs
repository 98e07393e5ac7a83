//! Source records: provenance carried inside every cluster.
//!
//! Each evidence item that joins a cluster leaves a [`SourceRecord`] behind,
//! so a cluster can always answer "which pages said this, and what did each
//! contribute?".

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceItem;

/// Provenance of one evidence item inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub domain: String,

    /// `field:value` strings this source contributed.
    #[serde(default)]
    pub evidence_contributed: Vec<String>,

    /// Per-source relevance, 0-100.
    pub relevance_score: u8,

    /// Position of the item in the caller's evidence list.
    pub evidence_index: usize,

    /// The domain is only known through its search-result snippet.
    #[serde(default)]
    pub snippet_only: bool,
}

impl SourceRecord {
    /// Builds the record for an evidence item.
    #[must_use]
    pub fn from_evidence(item: &EvidenceItem, relevance_score: u8, evidence_index: usize) -> Self {
        Self {
            url: item.url.clone(),
            title: item.title.clone(),
            snippet: item.snippet.clone(),
            domain: item.effective_domain(),
            evidence_contributed: item.attributes.contributions(),
            relevance_score: relevance_score.min(100),
            evidence_index,
            snippet_only: false,
        }
    }

    /// Flags the record as snippet-only.
    #[must_use]
    pub fn with_snippet_only(mut self, snippet_only: bool) -> Self {
        self.snippet_only = snippet_only;
        self
    }
}
