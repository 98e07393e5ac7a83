//! Relationships and conflicts between final clusters.
//!
//! Every unordered pair of clusters gets a symmetric weight from the fields
//! they share, which classifies the pair as the same person, a related
//! person or unrelated. Pairs whose values disagree produce explicit
//! [`IdentityConflict`] records instead of being silently ignored.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{ClusterId, PersonCluster};
use crate::identity::{emails_equal, normalize, normalize_phone, phones_equal};
use crate::result::{MultiplePeopleReason, NarrativeAnalysis, RecommendedAction};

const W_EMAIL: f64 = 0.8;
const W_PHONE: f64 = 0.7;
const W_NAME: f64 = 0.6;
const W_COMPANY: f64 = 0.3;

/// Weight above which two clusters are the same person.
pub const SAME_PERSON_THRESHOLD: f64 = 0.6;
/// Weight above which two clusters are related.
pub const RELATED_THRESHOLD: f64 = 0.2;

/// Confidence above which a cluster counts as high.
pub const HIGH_CONFIDENCE: u8 = 70;
/// Lower bound of the medium band.
pub const MEDIUM_CONFIDENCE: u8 = 40;
/// Top confidence below this asks for more evidence.
pub const LOW_TOP_CONFIDENCE: u8 = 50;
/// More clusters than this asks for manual review.
pub const MAX_COMFORTABLE_CLUSTERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    SamePerson,
    RelatedPerson,
    Unrelated,
}

impl RelationshipType {
    /// Classifies a pair weight.
    #[must_use]
    pub fn classify(weight: f64) -> Self {
        if weight > SAME_PERSON_THRESHOLD {
            Self::SamePerson
        } else if weight > RELATED_THRESHOLD {
            Self::RelatedPerson
        } else {
            Self::Unrelated
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamePerson => write!(f, "same_person"),
            Self::RelatedPerson => write!(f, "related_person"),
            Self::Unrelated => write!(f, "unrelated"),
        }
    }
}

/// A relationship as seen from one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRelationship {
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub target_cluster_id: ClusterId,
    /// Pair weight, capped at 1.0.
    pub confidence: f64,
    pub evidence_reasons: Vec<String>,
}

/// Classification of one unordered cluster pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairAssessment {
    pub first: ClusterId,
    pub second: ClusterId,
    /// Accumulated, uncapped weight.
    pub weight: f64,
    pub relationship_type: RelationshipType,
    pub matched_fields: Vec<String>,
}

/// The field two clusters disagree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    EmailDivergence,
    CompanyDivergence,
    PhoneDivergence,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailDivergence => write!(f, "email_divergence"),
            Self::CompanyDivergence => write!(f, "company_divergence"),
            Self::PhoneDivergence => write!(f, "phone_divergence"),
        }
    }
}

/// Two clusters carrying different non-empty values for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConflict {
    pub conflict_type: ConflictType,
    pub first: ClusterId,
    pub second: ClusterId,
    pub first_value: String,
    pub second_value: String,
}

impl fmt::Display for IdentityConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}) vs {} ({})",
            self.conflict_type, self.first, self.first_value, self.second, self.second_value
        )
    }
}

/// Everything the pairwise pass found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipReport {
    pub pairs: Vec<PairAssessment>,
    pub conflicts: Vec<IdentityConflict>,
}

fn shared_name(a: &PersonCluster, b: &PersonCluster) -> bool {
    let left: BTreeSet<String> = a.name_variations.iter().map(|n| normalize(n)).collect();
    b.name_variations
        .iter()
        .map(|n| normalize(n))
        .any(|n| !n.is_empty() && left.contains(&n))
}

/// Pairwise relationship and conflict analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipAnalyzer;

impl RelationshipAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Assesses one pair.
    #[must_use]
    pub fn assess(&self, a: &PersonCluster, b: &PersonCluster) -> (PairAssessment, Vec<IdentityConflict>) {
        let (ea, eb) = (&a.merged_evidence, &b.merged_evidence);
        let mut weight = 0.0;
        let mut matched = Vec::new();
        let mut conflicts = Vec::new();

        let mut conflict = |conflict_type, first_value: &str, second_value: &str| {
            conflicts.push(IdentityConflict {
                conflict_type,
                first: a.id,
                second: b.id,
                first_value: first_value.to_string(),
                second_value: second_value.to_string(),
            });
        };

        if let (Some(x), Some(y)) = (ea.email(), eb.email()) {
            if emails_equal(x, y) {
                weight += W_EMAIL;
                matched.push("email".to_string());
            } else {
                conflict(ConflictType::EmailDivergence, x, y);
            }
        }
        if let (Some(x), Some(y)) = (ea.phone(), eb.phone()) {
            if phones_equal(x, y) {
                weight += W_PHONE;
                matched.push("phone".to_string());
            } else if !normalize_phone(x).is_empty() && !normalize_phone(y).is_empty() {
                conflict(ConflictType::PhoneDivergence, x, y);
            }
        }
        if shared_name(a, b) {
            weight += W_NAME;
            matched.push("name".to_string());
        }
        if let (Some(x), Some(y)) = (ea.company(), eb.company()) {
            if normalize(x) == normalize(y) {
                weight += W_COMPANY;
                matched.push("company".to_string());
            } else {
                conflict(ConflictType::CompanyDivergence, x, y);
            }
        }

        let assessment = PairAssessment {
            first: a.id,
            second: b.id,
            weight,
            relationship_type: RelationshipType::classify(weight),
            matched_fields: matched,
        };
        (assessment, conflicts)
    }

    /// Assesses every unordered pair and attaches non-trivial relationships
    /// to both clusters of the pair.
    pub fn analyze(&self, clusters: &mut [PersonCluster]) -> RelationshipReport {
        let mut report = RelationshipReport::default();
        let n = clusters.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (pair, conflicts) = self.assess(&clusters[i], &clusters[j]);
                report.conflicts.extend(conflicts);
                if pair.relationship_type != RelationshipType::Unrelated {
                    let reasons: Vec<String> = pair.matched_fields.iter().map(|f| format!("shared {f}")).collect();
                    let confidence = pair.weight.min(1.0);
                    clusters[i].relationships.push(ClusterRelationship {
                        relationship_type: pair.relationship_type,
                        target_cluster_id: clusters[j].id,
                        confidence,
                        evidence_reasons: reasons.clone(),
                    });
                    clusters[j].relationships.push(ClusterRelationship {
                        relationship_type: pair.relationship_type,
                        target_cluster_id: clusters[i].id,
                        confidence,
                        evidence_reasons: reasons,
                    });
                }
                report.pairs.push(pair);
            }
        }
        debug!(
            pairs = report.pairs.len(),
            conflicts = report.conflicts.len(),
            "relationship analysis complete"
        );
        report
    }
}

fn distinct_values<'a>(clusters: &'a [PersonCluster], field: impl Fn(&'a PersonCluster) -> Option<&'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for cluster in clusters {
        if let Some(value) = field(cluster) {
            if seen.insert(normalize(value)) {
                out.push(value.to_string());
            }
        }
    }
    out
}

/// Builds the narrative for clusters already sorted by confidence.
#[must_use]
pub fn narrative(clusters: &[PersonCluster]) -> NarrativeAnalysis {
    let high = clusters.iter().filter(|c| c.confidence > HIGH_CONFIDENCE).count();
    let medium = clusters
        .iter()
        .filter(|c| (MEDIUM_CONFIDENCE..=HIGH_CONFIDENCE).contains(&c.confidence))
        .count();
    let main_person_confidence = clusters.first().map_or(0, |c| c.confidence);

    let mut reasons = Vec::new();
    if clusters.len() > 1 {
        reasons.push(MultiplePeopleReason::MultipleClusters { count: clusters.len() });
    }
    if high > 1 {
        reasons.push(MultiplePeopleReason::MultipleHighConfidence { count: high });
    }
    let emails = distinct_values(clusters, |c| c.merged_evidence.email());
    if emails.len() > 1 {
        reasons.push(MultiplePeopleReason::DivergentEmails { emails });
    }
    let companies = distinct_values(clusters, |c| c.merged_evidence.company());
    if companies.len() > 1 {
        reasons.push(MultiplePeopleReason::DivergentCompanies { companies });
    }

    let mut actions = Vec::new();
    if !clusters.is_empty() && main_person_confidence < LOW_TOP_CONFIDENCE {
        actions.push(RecommendedAction::LowConfidence {
            top_confidence: main_person_confidence,
        });
    }
    if clusters.len() > MAX_COMFORTABLE_CLUSTERS {
        actions.push(RecommendedAction::TooManyClusters { count: clusters.len() });
    }
    let single_source = clusters.iter().filter(|c| c.source_count() == 1).count();
    if single_source > 0 {
        actions.push(RecommendedAction::SingleSourceClusters { count: single_source });
    }

    NarrativeAnalysis {
        likely_same_person: high == 1 && medium == 0,
        main_person_confidence,
        reasons_for_multiple_people: reasons,
        recommended_actions: actions,
    }
}
