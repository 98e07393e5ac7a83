//! Feature-vector clustering strategy.
//!
//! Builds one [`FeatureVector`] per item, chooses a cluster count, partitions
//! with k-means and turns each partition into a [`PersonCluster`]. Any
//! numerical failure is replaced by the fixed-centroid fallback; the
//! replacement is counted in the diagnostics and logged, never raised.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::KMeansConfig;
use crate::error::ClusteringError;

use super::features::{FeatureDimension, FeatureExtractor, FeatureVector, FEATURE_DIM};
use super::kmeans::{elbow, euclidean_distance, fixed_centroid_assignment, kmeans, KMeansOutcome};
use super::{ClusterOutput, ClusteringContext, ClusteringDiagnostics, ClusteringStrategy, PersonCluster, ScoredEvidence};

/// Centroid dimensions above this are reported as distinguishing.
const DISTINGUISHING_THRESHOLD: f64 = 0.7;

/// Vector-space statistics of one feature-vector cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAnalytics {
    pub centroid: Vec<f64>,
    pub size: usize,
    /// Mean of `1 / (1 + distance)` over member pairs; 1.0 for a singleton.
    pub intra_similarity: f64,
    pub distinguishing_features: Vec<FeatureDimension>,
}

impl ClusterAnalytics {
    /// Computes analytics for a set of member vectors.
    #[must_use]
    pub fn from_members(members: &[FeatureVector]) -> Self {
        let size = members.len();
        let mut centroid = [0.0f64; FEATURE_DIM];
        for member in members {
            for (acc, value) in centroid.iter_mut().zip(member) {
                *acc += value;
            }
        }
        if size > 0 {
            for value in &mut centroid {
                *value /= size as f64;
            }
        }

        let intra_similarity = if size < 2 {
            1.0
        } else {
            let mut total = 0.0;
            let mut pairs = 0usize;
            for i in 0..size {
                for j in (i + 1)..size {
                    total += 1.0 / (1.0 + euclidean_distance(&members[i], &members[j]));
                    pairs += 1;
                }
            }
            total / pairs as f64
        };

        let distinguishing_features = centroid
            .iter()
            .enumerate()
            .filter(|(_, value)| **value > DISTINGUISHING_THRESHOLD)
            .filter_map(|(idx, _)| FeatureDimension::from_index(idx))
            .collect();

        Self {
            centroid: centroid.to_vec(),
            size,
            intra_similarity,
            distinguishing_features,
        }
    }
}

/// Chosen partition plus the bookkeeping that produced it.
#[derive(Debug, Clone)]
pub struct Partition {
    pub outcome: KMeansOutcome,
    pub k: usize,
    pub wcss_by_k: Vec<f64>,
    pub fallbacks: u32,
    pub comparisons: u64,
}

/// The feature-vector strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureVectorClusterer;

impl FeatureVectorClusterer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn run_or_fallback(vectors: &[FeatureVector], k: usize, config: &KMeansConfig, fallbacks: &mut u32) -> KMeansOutcome {
        match kmeans(vectors, k, config) {
            Ok(outcome) => outcome,
            Err(err) => {
                *fallbacks += 1;
                log_fallback(&err, k);
                fixed_centroid_assignment(vectors, k)
            }
        }
    }

    /// Chooses k and partitions the vectors.
    ///
    /// `n <= 2` uses one cluster, `n <= 4` two; otherwise k comes from the
    /// elbow of the WCSS curve over `1..=min(max_k, n / 2)`. No vectors
    /// give an empty partition with `k == 0`.
    #[must_use]
    pub fn partition(vectors: &[FeatureVector], config: &KMeansConfig) -> Partition {
        let n = vectors.len();
        if n == 0 {
            return Partition {
                outcome: KMeansOutcome {
                    assignments: Vec::new(),
                    centroids: Vec::new(),
                    wcss: 0.0,
                    iterations: 0,
                    converged: true,
                    distance_evaluations: 0,
                },
                k: 0,
                wcss_by_k: Vec::new(),
                fallbacks: 0,
                comparisons: 0,
            };
        }
        let mut fallbacks = 0;
        let mut comparisons = 0;
        let mut wcss_by_k = Vec::new();

        let k = if n <= 2 {
            1
        } else if n <= 4 {
            2
        } else {
            let max_k = config.max_k.min(n / 2).max(1);
            for k in 1..=max_k {
                let outcome = Self::run_or_fallback(vectors, k, config, &mut fallbacks);
                comparisons += outcome.distance_evaluations;
                wcss_by_k.push(outcome.wcss);
            }
            elbow(&wcss_by_k, config.elbow_cap)
        };

        let outcome = Self::run_or_fallback(vectors, k.min(n), config, &mut fallbacks);
        comparisons += outcome.distance_evaluations;

        Partition {
            outcome,
            k,
            wcss_by_k,
            fallbacks,
            comparisons,
        }
    }

    /// Clusters evidence whose vectors were already extracted.
    ///
    /// `vectors` must be parallel to `evidence`.
    #[must_use]
    pub fn cluster_vectors(
        &self,
        ctx: &ClusteringContext<'_>,
        evidence: &[ScoredEvidence<'_>],
        vectors: &[FeatureVector],
    ) -> ClusterOutput {
        let mut diagnostics = ClusteringDiagnostics {
            strategy: self.name().to_string(),
            ..ClusteringDiagnostics::default()
        };
        if evidence.is_empty() {
            return ClusterOutput {
                clusters: Vec::new(),
                diagnostics,
            };
        }

        let partition = Self::partition(vectors, &ctx.config.kmeans);
        debug!(k = partition.k, fallbacks = partition.fallbacks, "feature-vector partition chosen");

        // Group members in evidence order; groups ordered by first member.
        let mut group_of_label: Vec<Option<usize>> = vec![None; partition.outcome.centroids.len().max(1)];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (pos, &label) in partition.outcome.assignments.iter().enumerate() {
            let slot = match group_of_label.get(label).copied().flatten() {
                Some(slot) => slot,
                None => {
                    groups.push(Vec::new());
                    let slot = groups.len() - 1;
                    if let Some(entry) = group_of_label.get_mut(label) {
                        *entry = Some(slot);
                    }
                    slot
                }
            };
            groups[slot].push(pos);
        }

        let mut comparisons = partition.comparisons;
        let mut clusters = Vec::with_capacity(groups.len());
        for members in groups {
            let Some((&first, rest)) = members.split_first() else {
                continue;
            };
            let mut cluster = PersonCluster::found(ctx.target, &evidence[first]);
            for &pos in rest {
                cluster.absorb(&evidence[pos]);
            }
            let member_vectors: Vec<FeatureVector> = members.iter().map(|&pos| vectors[pos]).collect();
            comparisons += (members.len() * members.len().saturating_sub(1) / 2) as u64;
            cluster.analytics = Some(ClusterAnalytics::from_members(&member_vectors));
            clusters.push(cluster);
        }

        diagnostics.comparisons = comparisons;
        diagnostics.chosen_k = Some(partition.k);
        diagnostics.wcss_by_k = partition.wcss_by_k;
        diagnostics.fallbacks = partition.fallbacks;

        ClusterOutput { clusters, diagnostics }
    }
}

fn log_fallback(err: &ClusteringError, k: usize) {
    warn!(error = %err, k, "k-means failed; using fixed-centroid assignment");
}

impl ClusteringStrategy for FeatureVectorClusterer {
    fn name(&self) -> &'static str {
        "feature_vector"
    }

    fn cluster(&self, ctx: &ClusteringContext<'_>, evidence: &[ScoredEvidence<'_>]) -> ClusterOutput {
        let extractor = FeatureExtractor::new(ctx.target, ctx.trust, ctx.as_of);
        let vectors: Vec<FeatureVector> = evidence.iter().map(|e| extractor.extract(e.item)).collect();
        self.cluster_vectors(ctx, evidence, &vectors)
    }
}
