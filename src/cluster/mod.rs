//! Identity clusters and the clustering strategies that build them.
//!
//! Two strategies implement [`ClusteringStrategy`] with the same contract:
//! an ordered slice of scored evidence in, [`PersonCluster`]s out. Merging,
//! confidence scoring and relationship analysis never need to know which
//! strategy produced a cluster.

pub mod features;
pub mod incremental;
pub mod kmeans;
pub mod vector;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::biography::BiographicalProfile;
use crate::config::ResolverConfig;
use crate::confidence::ConfidenceBreakdown;
use crate::conflict::ClusterRelationship;
use crate::evidence::{EvidenceItem, PersonAttributes};
use crate::identity::TargetIdentity;
use crate::merge::{merge, push_name_variation};
use crate::source::SourceRecord;
use crate::trust::TrustModel;

pub use incremental::IncrementalClusterer;
pub use vector::{ClusterAnalytics, FeatureVectorClusterer};

/// Stable identifier of a cluster.
///
/// Derived (UUID v5) from the target email and the cluster's founding
/// evidence, so the same input always yields the same identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(Uuid);

impl ClusterId {
    /// Derives the identifier of a cluster founded by `evidence`.
    #[must_use]
    pub fn derive(target: &TargetIdentity, evidence: &ScoredEvidence<'_>) -> Self {
        let mut key = Vec::with_capacity(96);
        key.extend_from_slice(target.email.to_lowercase().as_bytes());
        key.push(0);
        key.extend_from_slice(evidence.item.fingerprint().as_bytes());
        key.extend_from_slice(&(evidence.index as u64).to_be_bytes());
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, &key))
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An evidence item paired with its relevance and original position.
#[derive(Debug, Clone, Copy)]
pub struct ScoredEvidence<'a> {
    /// Position in the caller's evidence list.
    pub index: usize,
    pub item: &'a EvidenceItem,
    /// Relevance score, 0-100.
    pub relevance: u8,
    /// The source domain is snippet-only under the active policy.
    pub snippet_only: bool,
}

/// Orders evidence for clustering: descending relevance, then original index.
///
/// Greedy clustering is order-dependent, so every run must see the same
/// sequence for the same input.
pub fn stable_order(evidence: &mut [ScoredEvidence<'_>]) {
    evidence.sort_by(|a, b| b.relevance.cmp(&a.relevance).then(a.index.cmp(&b.index)));
}

/// A set of evidence items hypothesized to describe one real person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonCluster {
    pub id: ClusterId,

    /// Confidence, 0-100. Zero until scored.
    pub confidence: u8,

    pub merged_evidence: PersonAttributes,

    pub sources: Vec<SourceRecord>,

    /// Distinct extracted names, first spelling kept.
    pub name_variations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<ClusterRelationship>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<BiographicalProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_breakdown: Option<ConfidenceBreakdown>,

    /// Vector-space statistics; only the feature-vector strategy sets these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<ClusterAnalytics>,
}

impl PersonCluster {
    /// Founds a singleton cluster.
    #[must_use]
    pub fn found(target: &TargetIdentity, evidence: &ScoredEvidence<'_>) -> Self {
        let mut cluster = Self {
            id: ClusterId::derive(target, evidence),
            confidence: 0,
            merged_evidence: PersonAttributes::default(),
            sources: Vec::new(),
            name_variations: Vec::new(),
            relationships: Vec::new(),
            biography: None,
            confidence_breakdown: None,
            analytics: None,
        };
        cluster.absorb(evidence);
        cluster
    }

    /// Merges an evidence item into the cluster and records its source.
    pub fn absorb(&mut self, evidence: &ScoredEvidence<'_>) {
        let attrs = &evidence.item.attributes;
        merge(&mut self.merged_evidence, attrs);
        if let Some(name) = attrs.name() {
            push_name_variation(&mut self.name_variations, name);
        }
        self.sources.push(
            SourceRecord::from_evidence(evidence.item, evidence.relevance, evidence.index)
                .with_snippet_only(evidence.snippet_only),
        );
    }

    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Smallest original evidence index among the cluster's sources.
    #[must_use]
    pub fn first_evidence_index(&self) -> usize {
        self.sources
            .iter()
            .map(|s| s.evidence_index)
            .min()
            .unwrap_or(usize::MAX)
    }

    /// Distinct non-empty source domains.
    #[must_use]
    pub fn unique_domains(&self) -> BTreeSet<&str> {
        self.sources
            .iter()
            .map(|s| s.domain.as_str())
            .filter(|d| !d.is_empty())
            .collect()
    }

    /// Mean relevance of all sources.
    #[must_use]
    pub fn mean_relevance(&self) -> f64 {
        if self.sources.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.sources.iter().map(|s| f64::from(s.relevance_score)).sum();
        sum / self.sources.len() as f64
    }
}

/// Inputs shared by every strategy during one run.
#[derive(Clone, Copy)]
pub struct ClusteringContext<'a> {
    pub target: &'a TargetIdentity,
    pub config: &'a ResolverConfig,
    pub trust: &'a dyn TrustModel,
    /// Reference time for temporal features. Never read from the clock.
    pub as_of: Option<DateTime<Utc>>,
}

/// What a strategy did, beyond the clusters themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringDiagnostics {
    pub strategy: String,

    /// Pairwise membership / distance tests performed. Grows quadratically.
    pub comparisons: u64,

    /// Cluster count chosen by the feature-vector strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_k: Option<usize>,

    /// WCSS per candidate k (index 0 is k = 1).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wcss_by_k: Vec<f64>,

    /// Times the fixed-centroid fallback replaced a failed k-means run.
    pub fallbacks: u32,
}

/// Clusters plus diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ClusterOutput {
    pub clusters: Vec<PersonCluster>,
    pub diagnostics: ClusteringDiagnostics,
}

/// Shared clustering capability.
pub trait ClusteringStrategy: Send + Sync {
    /// Stable name for diagnostics and logs.
    fn name(&self) -> &'static str;

    /// Partitions `evidence` (already in [`stable_order`]) into clusters.
    ///
    /// Every item lands in exactly one cluster.
    fn cluster(&self, ctx: &ClusteringContext<'_>, evidence: &[ScoredEvidence<'_>]) -> ClusterOutput;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::evidence::PersonAttributes;

    pub fn jane() -> TargetIdentity {
        TargetIdentity::new("Jane", "Doe", "jane@acme.com").unwrap()
    }

    pub fn item(url: &str, attrs: PersonAttributes) -> EvidenceItem {
        EvidenceItem::new(url, "", "", attrs)
    }

    pub fn scored(items: &[EvidenceItem]) -> Vec<ScoredEvidence<'_>> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| ScoredEvidence {
                index,
                item,
                relevance: 50,
                snippet_only: false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn stable_order_sorts_by_relevance_then_index() {
        let items: Vec<EvidenceItem> = (0..4)
            .map(|i| item(&format!("https://s{i}.test"), PersonAttributes::default()))
            .collect();
        let mut evidence = scored(&items);
        evidence[0].relevance = 10;
        evidence[1].relevance = 80;
        evidence[2].relevance = 10;
        evidence[3].relevance = 80;
        stable_order(&mut evidence);
        let order: Vec<usize> = evidence.iter().map(|e| e.index).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn cluster_ids_are_deterministic() {
        let target = jane();
        let items = vec![item("https://a.test", PersonAttributes::default())];
        let evidence = scored(&items);
        assert_eq!(ClusterId::derive(&target, &evidence[0]), ClusterId::derive(&target, &evidence[0]));

        let mut moved = evidence[0];
        moved.index = 9;
        assert_ne!(ClusterId::derive(&target, &evidence[0]), ClusterId::derive(&target, &moved));
    }

    #[test]
    fn absorb_tracks_sources_and_names() {
        let target = jane();
        let items = vec![
            item(
                "https://a.test",
                PersonAttributes {
                    name: Some("Jane Doe".into()),
                    ..PersonAttributes::default()
                },
            ),
            item(
                "https://www.b.test/x",
                PersonAttributes {
                    name: Some("jane doe".into()),
                    ..PersonAttributes::default()
                },
            ),
        ];
        let evidence = scored(&items);
        let mut cluster = PersonCluster::found(&target, &evidence[0]);
        cluster.absorb(&evidence[1]);
        assert_eq!(cluster.source_count(), 2);
        assert_eq!(cluster.name_variations, vec!["Jane Doe"]);
        assert_eq!(cluster.unique_domains().len(), 2);
        assert_eq!(cluster.first_evidence_index(), 0);
        assert!((cluster.mean_relevance() - 50.0).abs() < f64::EPSILON);
    }
}
