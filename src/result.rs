//! Resolution result types.
//!
//! A [`ClusteringResult`] is built fresh for every resolution and never
//! mutated afterwards. It serializes to camelCase JSON for export layers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::biography::BiographySummary;
use crate::cluster::{ClusteringDiagnostics, PersonCluster};
use crate::conflict::{IdentityConflict, PairAssessment};
use crate::identity::TargetIdentity;

/// Why the evidence may describe more than one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MultiplePeopleReason {
    MultipleClusters { count: usize },
    MultipleHighConfidence { count: usize },
    DivergentEmails { emails: Vec<String> },
    DivergentCompanies { companies: Vec<String> },
}

impl fmt::Display for MultiplePeopleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleClusters { count } => write!(f, "{count} distinct identity clusters found"),
            Self::MultipleHighConfidence { count } => write!(f, "{count} clusters have high confidence"),
            Self::DivergentEmails { emails } => write!(f, "different emails: {}", emails.join(", ")),
            Self::DivergentCompanies { companies } => write!(f, "different companies: {}", companies.join(", ")),
        }
    }
}

/// Follow-up the caller should consider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendedAction {
    LowConfidence { top_confidence: u8 },
    TooManyClusters { count: usize },
    SingleSourceClusters { count: usize },
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowConfidence { top_confidence } => {
                write!(f, "top confidence is only {top_confidence}; gather more evidence")
            }
            Self::TooManyClusters { count } => write!(f, "{count} clusters; review manually"),
            Self::SingleSourceClusters { count } => {
                write!(f, "{count} clusters rest on a single source; seek corroboration")
            }
        }
    }
}

/// Global interpretation of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeAnalysis {
    pub likely_same_person: bool,
    pub main_person_confidence: u8,
    pub reasons_for_multiple_people: Vec<MultiplePeopleReason>,
    pub recommended_actions: Vec<RecommendedAction>,
}

/// Number of included sources from one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Aggregate counts over a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    /// Sources that reached clustering.
    pub total_sources: usize,
    pub total_clusters: usize,
    /// Items dropped by the source policy.
    pub excluded_sources: usize,
    /// Confidence above 70.
    pub high_confidence_clusters: usize,
    /// Confidence in 40..=70.
    pub medium_confidence_clusters: usize,
    /// Confidence below 40.
    pub low_confidence_clusters: usize,
    pub top_domains: Vec<DomainCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<BiographySummary>,
}

/// Output of one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringResult {
    pub target: TargetIdentity,
    /// Name of the strategy that built the clusters.
    pub strategy: String,
    /// Sorted by confidence, then source count, then first evidence index.
    pub clusters: Vec<PersonCluster>,
    pub summary: ResultSummary,
    pub analysis: NarrativeAnalysis,
    pub conflicts: Vec<IdentityConflict>,
    pub pairs: Vec<PairAssessment>,
    pub diagnostics: ClusteringDiagnostics,
}

impl ClusteringResult {
    /// Serializes to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; plain data never fails in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
