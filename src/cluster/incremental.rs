//! Greedy, single-pass, rule-based clustering.
//!
//! Each incoming item is scored against every existing cluster with a small
//! set of weighted checks. A cluster accepts the item when the accumulated
//! weight reaches half the applicable checks (rounded up) or when a single
//! strong signal (weight >= 2) fired. The item joins the accepting cluster
//! with the highest weight (earliest cluster on ties); if none accepts, it
//! founds a new singleton.
//!
//! The result depends on input order. Callers pass evidence in
//! [`super::stable_order`].

use tracing::trace;

use crate::evidence::PersonAttributes;
use crate::identity::{emails_equal, loosely_similar, phones_equal, TargetIdentity};

use super::{ClusterOutput, ClusteringContext, ClusteringDiagnostics, ClusteringStrategy, PersonCluster, ScoredEvidence};

const W_EMAIL: u32 = 3;
const W_NAME: u32 = 2;
const W_PHONE: u32 = 2;
const W_COMPANY: u32 = 1;
const W_TITLE: u32 = 1;
const W_SOCIAL: u32 = 2;

/// A single strong signal is enough on its own.
const STRONG_SIGNAL: u32 = 2;

/// Outcome of testing one item against one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchScore {
    /// Accumulated weight of the checks that matched.
    pub weight: u32,
    /// Checks where both sides carried the field.
    pub applicable: u32,
    /// Names of the checks that matched.
    pub matched: Vec<&'static str>,
    /// Both sides carry different emails and the veto is enabled.
    pub vetoed: bool,
}

impl MatchScore {
    /// Whether the cluster accepts the item.
    #[must_use]
    pub fn accepts(&self) -> bool {
        if self.vetoed || self.weight == 0 {
            return false;
        }
        self.weight >= self.applicable.div_ceil(2) || self.weight >= STRONG_SIGNAL
    }

    fn check(&mut self, name: &'static str, weight: u32, outcome: Option<bool>) {
        if let Some(matched) = outcome {
            self.applicable += 1;
            if matched {
                self.weight += weight;
                self.matched.push(name);
            }
        }
    }
}

/// Applies `f` when both sides are present.
fn both<T: ?Sized, U: ?Sized>(a: Option<&T>, b: Option<&U>, f: impl FnOnce(&T, &U) -> bool) -> Option<bool> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    }
}

/// Scores an item's attributes against a cluster.
#[must_use]
pub fn match_score(
    target: &TargetIdentity,
    cluster: &PersonCluster,
    incoming: &PersonAttributes,
    email_conflict_veto: bool,
) -> MatchScore {
    let merged = &cluster.merged_evidence;
    let mut score = MatchScore::default();

    let email = both(merged.email(), incoming.email(), emails_equal);
    if email == Some(false) && email_conflict_veto {
        score.vetoed = true;
    }
    score.check("email", W_EMAIL, email);

    let name = incoming.name().and_then(|name| {
        if cluster.name_variations.is_empty() {
            None
        } else {
            Some(
                cluster
                    .name_variations
                    .iter()
                    .any(|existing| target.names_similar(existing, name)),
            )
        }
    });
    score.check("name", W_NAME, name);

    score.check("phone", W_PHONE, both(merged.phone(), incoming.phone(), phones_equal));
    score.check("company", W_COMPANY, both(merged.company(), incoming.company(), loosely_similar));
    score.check("title", W_TITLE, both(merged.title(), incoming.title(), loosely_similar));

    let cluster_accounts: Vec<(String, String)> = merged
        .social_profiles
        .iter()
        .filter_map(|p| p.account_key())
        .collect();
    let incoming_accounts: Vec<(String, String)> = incoming
        .social_profiles
        .iter()
        .filter_map(|p| p.account_key())
        .collect();
    let social = if cluster_accounts.is_empty() || incoming_accounts.is_empty() {
        None
    } else {
        Some(incoming_accounts.iter().any(|a| cluster_accounts.contains(a)))
    };
    score.check("social", W_SOCIAL, social);

    score
}

/// The rule-based strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalClusterer;

impl IncrementalClusterer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ClusteringStrategy for IncrementalClusterer {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn cluster(&self, ctx: &ClusteringContext<'_>, evidence: &[ScoredEvidence<'_>]) -> ClusterOutput {
        let mut clusters: Vec<PersonCluster> = Vec::new();
        let mut comparisons: u64 = 0;

        for scored in evidence {
            let mut best: Option<(usize, u32)> = None;
            for (idx, cluster) in clusters.iter().enumerate() {
                comparisons += 1;
                let score = match_score(ctx.target, cluster, &scored.item.attributes, ctx.config.email_conflict_veto);
                if score.accepts() && best.map_or(true, |(_, weight)| score.weight > weight) {
                    best = Some((idx, score.weight));
                }
            }

            match best {
                Some((idx, weight)) => {
                    trace!(evidence = scored.index, cluster = idx, weight, "evidence joined cluster");
                    clusters[idx].absorb(scored);
                }
                None => {
                    trace!(evidence = scored.index, "evidence founded cluster");
                    clusters.push(PersonCluster::found(ctx.target, scored));
                }
            }
        }

        ClusterOutput {
            clusters,
            diagnostics: ClusteringDiagnostics {
                strategy: self.name().to_string(),
                comparisons,
                ..ClusteringDiagnostics::default()
            },
        }
    }
}
