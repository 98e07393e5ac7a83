//! Cluster confidence scoring.
//!
//! Confidence is an additive heuristic: every term rewards one kind of
//! corroboration and has its own ceiling. The terms are kept separately in a
//! [`ConfidenceBreakdown`] so a score can be explained after the fact; the
//! cluster stores only the clamped integer total.
//!
//! An optional [`BiographicalProfile`] adds up to
//! [`MAX_BIOGRAPHY_BONUS`](crate::biography::MAX_BIOGRAPHY_BONUS) on top;
//! without one the baseline is exactly the sum of the other terms.

use serde::{Deserialize, Serialize};

use crate::biography::BiographicalProfile;
use crate::cluster::PersonCluster;
use crate::identity::{has_keyword, TargetIdentity};
use crate::trust::TrustModel;

const PER_SOURCE: u32 = 15;
const MAX_SOURCE_BASE: u32 = 45;

const EMAIL_BONUS: u32 = 25;
const NAME_BONUS: u32 = 20;

const PHONE_BONUS: u32 = 10;
const COMPANY_BONUS: u32 = 8;
const TITLE_BONUS: u32 = 8;
const LOCATION_BONUS: u32 = 6;

const PROFESSIONAL_PLATFORM_BONUS: u32 = 8;
const CATEGORIZED_SKILL_BONUS: u32 = 5;
const INSTITUTION_BONUS: u32 = 6;
const MIXED_AFFILIATION_BONUS: u32 = 5;

const RELEVANCE_WEIGHT: f64 = 0.2;
/// Sources contributing to the relevance term.
const RELEVANCE_TOP_N: usize = 3;

const PER_DOMAIN: u32 = 3;
const MAX_DOMAIN_DIVERSITY: u32 = 12;

/// Skill vocabulary; a skill that names any of these is "categorized".
const SKILL_TAXONOMY: &[&str] = &[
    // technical
    "rust", "python", "java", "javascript", "typescript", "go", "c++", "sql", "kubernetes", "aws", "docker",
    "machine learning", "data science", "devops", "react", "linux",
    // management
    "leadership", "management", "strategy", "product management", "project management", "agile",
    // business
    "sales", "marketing", "finance", "accounting", "negotiation", "consulting",
    // research
    "research", "statistics", "writing", "teaching",
];

const INSTITUTION_KEYWORDS: &[&str] = &["university", "college", "institute", "school", "academy"];

const CORPORATE_KEYWORDS: &[&str] = &["inc", "corp", "corporation", "ltd", "llc", "gmbh", "company", "co."];
const ACADEMIC_KEYWORDS: &[&str] = &["university", "college", "institute", "academy", "laboratory", "lab"];

/// Each additive term of a confidence score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceBreakdown {
    pub source_base: u32,
    pub identity: u32,
    pub secondary_fields: u32,
    pub social: u32,
    pub skills: u32,
    pub education: u32,
    pub achievements: u32,
    pub affiliations: u32,
    pub websites: u32,
    pub relevance: f64,
    pub domain_diversity: u32,
    pub completeness: u32,
    /// Zero unless a biographical profile was supplied.
    pub biography: u32,
}

impl ConfidenceBreakdown {
    /// Unclamped sum of all terms.
    #[must_use]
    pub fn raw(&self) -> f64 {
        let integral = self.source_base
            + self.identity
            + self.secondary_fields
            + self.social
            + self.skills
            + self.education
            + self.achievements
            + self.affiliations
            + self.websites
            + self.domain_diversity
            + self.completeness
            + self.biography;
        f64::from(integral) + self.relevance
    }

    /// Rounded total clamped to `[0, 100]`.
    #[must_use]
    pub fn total(&self) -> u8 {
        let raw = self.raw();
        if !raw.is_finite() {
            return 0;
        }
        raw.round().clamp(0.0, 100.0) as u8
    }
}

/// Whether a skill falls into the known taxonomy.
#[must_use]
pub fn is_categorized_skill(skill: &str) -> bool {
    has_keyword(skill, SKILL_TAXONOMY)
}

/// Whether an education entry names an institution.
#[must_use]
pub fn is_institution_qualified(entry: &str) -> bool {
    has_keyword(entry, INSTITUTION_KEYWORDS)
}

fn capped(count: usize, per_item: u32, cap: u32) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX).saturating_mul(per_item).min(cap)
}

/// Scores clusters against one target identity.
pub struct ConfidenceScorer<'a> {
    target: &'a TargetIdentity,
    trust: &'a dyn TrustModel,
}

impl<'a> ConfidenceScorer<'a> {
    #[must_use]
    pub fn new(target: &'a TargetIdentity, trust: &'a dyn TrustModel) -> Self {
        Self { target, trust }
    }

    /// Computes every term for a cluster.
    #[must_use]
    pub fn score(&self, cluster: &PersonCluster, biography: Option<&BiographicalProfile>) -> ConfidenceBreakdown {
        let attrs = &cluster.merged_evidence;
        let mut b = ConfidenceBreakdown {
            source_base: capped(cluster.source_count(), PER_SOURCE, MAX_SOURCE_BASE),
            ..ConfidenceBreakdown::default()
        };

        if attrs.email().is_some_and(|e| self.target.matches_email(e)) {
            b.identity += EMAIL_BONUS;
        }
        let name_matched = attrs.name().is_some_and(|n| self.target.matches_name(n))
            || cluster.name_variations.iter().any(|n| self.target.matches_name(n));
        if name_matched {
            b.identity += NAME_BONUS;
        }

        for (present, bonus) in [
            (attrs.phone().is_some(), PHONE_BONUS),
            (attrs.company().is_some(), COMPANY_BONUS),
            (attrs.title().is_some(), TITLE_BONUS),
            (attrs.location().is_some(), LOCATION_BONUS),
        ] {
            if present {
                b.secondary_fields += bonus;
            }
        }

        b.social = capped(attrs.social_profiles.len(), 5, 15);
        if attrs
            .social_profiles
            .iter()
            .any(|p| self.trust.is_professional_platform(&p.platform))
        {
            b.social += PROFESSIONAL_PLATFORM_BONUS;
        }

        b.skills = capped(attrs.skills.len(), 2, 12);
        if attrs.skills.iter().any(|s| is_categorized_skill(s)) {
            b.skills += CATEGORIZED_SKILL_BONUS;
        }

        b.education = capped(attrs.education.len(), 4, 15);
        if attrs.education.iter().any(|e| is_institution_qualified(e)) {
            b.education += INSTITUTION_BONUS;
        }

        b.achievements = capped(attrs.achievements.len(), 3, 12);

        b.affiliations = capped(attrs.affiliations.len(), 2, 10);
        let corporate = attrs.affiliations.iter().any(|a| has_keyword(a, CORPORATE_KEYWORDS));
        let academic = attrs.affiliations.iter().any(|a| has_keyword(a, ACADEMIC_KEYWORDS));
        if corporate && academic {
            b.affiliations += MIXED_AFFILIATION_BONUS;
        }

        b.websites = capped(attrs.websites.len(), 3, 8);

        b.relevance = Self::top_relevance_mean(cluster) * RELEVANCE_WEIGHT;
        b.domain_diversity = capped(cluster.unique_domains().len(), PER_DOMAIN, MAX_DOMAIN_DIVERSITY);

        b.completeness = match attrs.populated_field_types() {
            n if n >= 8 => 10,
            n if n >= 6 => 6,
            n if n >= 4 => 3,
            _ => 0,
        };

        if let Some(profile) = biography {
            b.biography = u32::from(profile.confidence_bonus());
        }

        b
    }

    /// Scores a cluster and stores the result on it, using the cluster's own
    /// biographical profile if one is attached.
    pub fn apply(&self, cluster: &mut PersonCluster) {
        let breakdown = self.score(cluster, cluster.biography.as_ref());
        cluster.confidence = breakdown.total();
        cluster.confidence_breakdown = Some(breakdown);
    }

    /// Mean relevance of the strongest sources.
    ///
    /// Equals the plain mean for up to three sources. Beyond that, weaker
    /// corroborating sources cannot drag the score down.
    fn top_relevance_mean(cluster: &PersonCluster) -> f64 {
        let mut scores: Vec<u8> = cluster.sources.iter().map(|s| s.relevance_score).collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.sort_unstable_by(|a, b| b.cmp(a));
        let top = &scores[..scores.len().min(RELEVANCE_TOP_N)];
        let sum: f64 = top.iter().map(|&s| f64::from(s)).sum();
        sum / top.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biography::{CareerStage, EducationLevel, Industry, Seniority};
    use crate::cluster::test_support::*;
    use crate::evidence::{EvidenceItem, PersonAttributes, SocialProfile};
    use crate::trust::DomainTrustTable;

    fn cluster_of(items: &[EvidenceItem], relevance: u8) -> PersonCluster {
        let mut evidence = scored(items);
        for e in &mut evidence {
            e.relevance = relevance;
        }
        let mut cluster = PersonCluster::found(&jane(), &evidence[0]);
        for e in &evidence[1..] {
            cluster.absorb(e);
        }
        cluster
    }

    #[test]
    fn scenario_a_terms() {
        let attrs = PersonAttributes {
            email: Some("jane@acme.com".into()),
            company: Some("Acme Corp".into()),
            ..PersonAttributes::default()
        };
        let items = vec![item("https://a.test", attrs.clone()), item("https://b.test", attrs)];
        let target = jane();
        let trust = DomainTrustTable::default();
        let b = ConfidenceScorer::new(&target, &trust).score(&cluster_of(&items, 50), None);

        assert_eq!(b.source_base, 30);
        assert_eq!(b.identity, 25);
        assert_eq!(b.secondary_fields, 8);
        assert_eq!(b.domain_diversity, 6);
        assert!((b.relevance - 10.0).abs() < 1e-9);
        assert_eq!(b.total(), 79);
    }

    #[test]
    fn name_only_singleton_is_low() {
        let items = vec![item(
            "https://a.test",
            PersonAttributes {
                name: Some("Jane Doe".into()),
                ..PersonAttributes::default()
            },
        )];
        let target = jane();
        let trust = DomainTrustTable::default();
        let b = ConfidenceScorer::new(&target, &trust).score(&cluster_of(&items, 30), None);
        assert_eq!(b.source_base, 15);
        assert_eq!(b.identity, 20);
        assert_eq!(b.total(), 44);
    }

    #[test]
    fn collection_terms_and_qualifiers() {
        let attrs = PersonAttributes {
            social_profiles: vec![
                SocialProfile::new("LinkedIn", "https://linkedin.com/in/jd", "jd"),
                SocialProfile::new("twitter", "https://twitter.com/jd", "jd"),
            ],
            skills: vec!["Rust".into(), "Underwater basket weaving".into()],
            education: vec!["BSc, Stanford University".into()],
            achievements: vec!["Award".into(), "Patent".into()],
            affiliations: vec!["Acme Inc".into(), "MIT Media Lab".into()],
            websites: vec!["https://jane.dev".into(), "https://blog.jane.dev".into(), "https://x.dev".into()],
            ..PersonAttributes::default()
        };
        let items = vec![item("https://a.test", attrs)];
        let target = jane();
        let trust = DomainTrustTable::default();
        let b = ConfidenceScorer::new(&target, &trust).score(&cluster_of(&items, 0), None);

        assert_eq!(b.social, 10 + 8);
        assert_eq!(b.skills, 4 + 5);
        assert_eq!(b.education, 4 + 6);
        assert_eq!(b.achievements, 6);
        assert_eq!(b.affiliations, 4 + 5);
        assert_eq!(b.websites, 8);
        assert_eq!(b.completeness, 6);
    }

    #[test]
    fn completeness_tiers_follow_field_type_count() {
        let target = jane();
        let trust = DomainTrustTable::default();
        let scorer = ConfidenceScorer::new(&target, &trust);
        let fill: [fn(&mut PersonAttributes); 8] = [
            |a| a.name = Some("Jane Doe".into()),
            |a| a.email = Some("jane@acme.com".into()),
            |a| a.phone = Some("+1 555 0100".into()),
            |a| a.title = Some("Engineer".into()),
            |a| a.company = Some("Acme".into()),
            |a| a.location = Some("Berlin".into()),
            |a| a.skills = vec!["Rust".into()],
            |a| a.websites = vec!["https://jane.dev".into()],
        ];
        let expected = [0, 0, 0, 3, 3, 6, 6, 10];

        let mut attrs = PersonAttributes::default();
        for (step, (apply, want)) in fill.iter().zip(expected).enumerate() {
            apply(&mut attrs);
            assert_eq!(attrs.populated_field_types(), step + 1);
            let items = vec![item("https://a.test", attrs.clone())];
            let b = scorer.score(&cluster_of(&items, 0), None);
            assert_eq!(b.completeness, want, "{} field types", step + 1);
        }
    }

    #[test]
    fn biography_is_additive_only() {
        let items = vec![item(
            "https://a.test",
            PersonAttributes {
                title: Some("CTO".into()),
                ..PersonAttributes::default()
            },
        )];
        let target = jane();
        let trust = DomainTrustTable::default();
        let scorer = ConfidenceScorer::new(&target, &trust);
        let cluster = cluster_of(&items, 40);
        let baseline = scorer.score(&cluster, None);
        assert_eq!(baseline.biography, 0);

        let profile = BiographicalProfile {
            career_stage: CareerStage::Established,
            seniority: Seniority::Executive,
            industry: Some(Industry::Technology),
            education_level: EducationLevel::Unknown,
            thought_leadership: 0,
            signals: Vec::new(),
        };
        let enhanced = scorer.score(&cluster, Some(&profile));
        assert_eq!(enhanced.biography, 12);
        assert_eq!(
            ConfidenceBreakdown {
                biography: 0,
                ..enhanced.clone()
            },
            baseline
        );
    }

    #[test]
    fn relevance_uses_strongest_three_sources() {
        let items: Vec<EvidenceItem> = (0..5)
            .map(|i| item(&format!("https://s{i}.test"), PersonAttributes::default()))
            .collect();
        let mut evidence = scored(&items);
        for (e, r) in evidence.iter_mut().zip([90, 80, 70, 0, 0]) {
            e.relevance = r;
        }
        let mut cluster = PersonCluster::found(&jane(), &evidence[0]);
        for e in &evidence[1..] {
            cluster.absorb(e);
        }
        assert!((ConfidenceScorer::top_relevance_mean(&cluster) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn total_is_clamped() {
        let b = ConfidenceBreakdown {
            source_base: 45,
            identity: 45,
            secondary_fields: 32,
            ..ConfidenceBreakdown::default()
        };
        assert_eq!(b.total(), 100);
        assert_eq!(ConfidenceBreakdown::default().total(), 0);
    }

    #[test]
    fn apply_stores_score_and_breakdown() {
        let items = vec![item("https://a.test", PersonAttributes::default())];
        let target = jane();
        let trust = DomainTrustTable::default();
        let mut cluster = cluster_of(&items, 50);
        ConfidenceScorer::new(&target, &trust).apply(&mut cluster);
        // 15 base + 10 relevance + 3 diversity
        assert_eq!(cluster.confidence, 28);
        assert!(cluster.confidence_breakdown.is_some());
    }
}
