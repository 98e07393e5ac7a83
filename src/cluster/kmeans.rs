//! K-means over feature vectors.
//!
//! # Algorithm
//!
//! 1. First centroid: vector at `seed % n`; the rest by farthest-point
//!    selection (deterministic k-means++ approximation, ties to lowest index).
//! 2. Assign each vector to its nearest centroid (Euclidean).
//! 3. Recompute centroids as member means; an empty cluster keeps its centroid.
//! 4. Stop when the largest centroid movement falls below the tolerance, or
//!    after `max_iterations`.
//!
//! Numerical failures are reported as [`ClusteringError`]; callers substitute
//! [`fixed_centroid_assignment`].

use crate::config::KMeansConfig;
use crate::error::ClusteringError;

use super::features::{FeatureVector, FEATURE_DIM};

/// Improvements at or below this are treated as no improvement.
const ELBOW_EPSILON: f64 = 1e-12;

/// Result of one partitioning.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansOutcome {
    /// Cluster index per input vector.
    pub assignments: Vec<usize>,
    pub centroids: Vec<FeatureVector>,
    /// Within-cluster sum of squares.
    pub wcss: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Distance evaluations performed.
    pub distance_evaluations: u64,
}

#[inline]
pub(crate) fn squared_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[inline]
pub(crate) fn euclidean_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    squared_distance(a, b).sqrt()
}

fn nearest(vector: &FeatureVector, centroids: &[FeatureVector]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(vector, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

fn wcss(vectors: &[FeatureVector], assignments: &[usize], centroids: &[FeatureVector]) -> f64 {
    vectors
        .iter()
        .zip(assignments)
        .map(|(v, &c)| squared_distance(v, &centroids[c]))
        .sum()
}

fn validate(vectors: &[FeatureVector], k: usize) -> Result<(), ClusteringError> {
    if k == 0 || k > vectors.len() {
        return Err(ClusteringError::InvalidClusterCount { k, items: vectors.len() });
    }
    for (item, vector) in vectors.iter().enumerate() {
        if let Some(dimension) = vector.iter().position(|x| !x.is_finite()) {
            return Err(ClusteringError::NonFiniteFeature { item, dimension });
        }
    }
    Ok(())
}

fn initial_centroids(vectors: &[FeatureVector], k: usize, seed: u64) -> Vec<FeatureVector> {
    let n = vectors.len();
    let first = (seed % n as u64) as usize;
    let mut centroids = Vec::with_capacity(k);
    centroids.push(vectors[first]);

    let mut min_distances = vec![f64::INFINITY; n];
    while centroids.len() < k {
        if let Some(last) = centroids.last() {
            for (i, vector) in vectors.iter().enumerate() {
                min_distances[i] = min_distances[i].min(squared_distance(vector, last));
            }
        }
        let mut far_idx = 0;
        let mut far_dist = f64::NEG_INFINITY;
        for (i, &d) in min_distances.iter().enumerate() {
            if d > far_dist {
                far_dist = d;
                far_idx = i;
            }
        }
        // All remaining points coincide with a centroid; duplicates are harmless.
        centroids.push(vectors[far_idx]);
    }
    centroids
}

fn recompute(vectors: &[FeatureVector], assignments: &[usize], previous: &[FeatureVector]) -> Vec<FeatureVector> {
    let k = previous.len();
    let mut sums = vec![[0.0f64; FEATURE_DIM]; k];
    let mut counts = vec![0usize; k];
    for (vector, &cluster) in vectors.iter().zip(assignments) {
        counts[cluster] += 1;
        for d in 0..FEATURE_DIM {
            sums[cluster][d] += vector[d];
        }
    }
    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((mut sum, count), old)| {
            if count == 0 {
                return *old;
            }
            for value in &mut sum {
                *value /= count as f64;
            }
            sum
        })
        .collect()
}

/// Runs Lloyd's k-means.
///
/// # Errors
///
/// - `InvalidClusterCount` if `k` is 0 or exceeds the number of vectors.
/// - `NonFiniteFeature` if any input value is NaN or infinite.
/// - `Diverged` if centroids become non-finite.
pub fn kmeans(vectors: &[FeatureVector], k: usize, config: &KMeansConfig) -> Result<KMeansOutcome, ClusteringError> {
    validate(vectors, k)?;

    let mut centroids = initial_centroids(vectors, k, config.seed);
    let mut assignments = vec![0usize; vectors.len()];
    let mut iterations = 0;
    let mut converged = false;
    let mut distance_evaluations: u64 = 0;

    for iter in 0..config.max_iterations {
        iterations = iter + 1;

        for (i, vector) in vectors.iter().enumerate() {
            assignments[i] = nearest(vector, &centroids);
        }
        distance_evaluations += (vectors.len() * centroids.len()) as u64;

        let updated = recompute(vectors, &assignments, &centroids);
        if updated.iter().flatten().any(|x| !x.is_finite()) {
            return Err(ClusteringError::Diverged { iterations });
        }

        let movement = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| euclidean_distance(old, new))
            .fold(0.0f64, f64::max);
        centroids = updated;

        if movement < config.tolerance {
            converged = true;
            break;
        }
    }

    // Final assignment against the settled centroids.
    for (i, vector) in vectors.iter().enumerate() {
        assignments[i] = nearest(vector, &centroids);
    }
    distance_evaluations += (vectors.len() * centroids.len()) as u64;

    let wcss = wcss(vectors, &assignments, &centroids);
    if !wcss.is_finite() {
        return Err(ClusteringError::Diverged { iterations });
    }

    Ok(KMeansOutcome {
        assignments,
        centroids,
        wcss,
        iterations,
        converged,
        distance_evaluations,
    })
}

/// Nearest-fixed-centroid assignment seeded from the first `k` vectors.
///
/// Never fails. `k` is clamped to `[1, n]`; non-finite distances leave an
/// item on centroid 0.
#[must_use]
pub fn fixed_centroid_assignment(vectors: &[FeatureVector], k: usize) -> KMeansOutcome {
    let k = k.clamp(1, vectors.len().max(1));
    let centroids: Vec<FeatureVector> = vectors.iter().take(k).copied().collect();
    let assignments: Vec<usize> = vectors.iter().map(|v| nearest(v, &centroids)).collect();
    let wcss = if centroids.is_empty() {
        0.0
    } else {
        wcss(vectors, &assignments, &centroids)
    };
    KMeansOutcome {
        assignments,
        wcss,
        iterations: 0,
        converged: false,
        distance_evaluations: (vectors.len() * centroids.len()) as u64,
        centroids,
    }
}

/// Picks k from a WCSS curve (index 0 is k = 1).
///
/// Chooses the k right after the single largest improvement step, capped at
/// `cap`. A flat or empty curve yields 1.
#[must_use]
pub fn elbow(wcss_by_k: &[f64], cap: usize) -> usize {
    let mut best_step: Option<(usize, f64)> = None;
    for (i, pair) in wcss_by_k.windows(2).enumerate() {
        let improvement = pair[0] - pair[1];
        if !improvement.is_finite() {
            continue;
        }
        if best_step.map_or(true, |(_, best)| improvement > best) {
            best_step = Some((i, improvement));
        }
    }
    let k = match best_step {
        Some((i, improvement)) if improvement > ELBOW_EPSILON => i + 2,
        _ => 1,
    };
    k.min(cap.max(1))
}
