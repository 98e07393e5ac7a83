//! Fixed 15-dimension feature vectors for evidence items.
//!
//! Every feature is relative to the target identity and lies in [0, 1].
//! Layout:
//!
//! | dims | group |
//! |---|---|
//! | 0-2 | identity: name, email, phone |
//! | 3-5 | professional: title, company, skills |
//! | 6-7 | social: platform overlap, location |
//! | 8-10 | content: topic similarity, keyword density, sentiment alignment |
//! | 11-12 | temporal: recency, content freshness |
//! | 13-14 | trust: source trust, domain authority |

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceItem;
use crate::identity::{normalize, TargetIdentity};
use crate::trust::TrustModel;

/// Number of feature dimensions.
pub const FEATURE_DIM: usize = 15;

/// A feature vector.
pub type FeatureVector = [f64; FEATURE_DIM];

/// Neutral value for features with no signal either way.
const NEUTRAL: f64 = 0.5;

const POSITIVE_WORDS: &[&str] = &[
    "award", "awarded", "leader", "leading", "expert", "founder", "innovative", "keynote", "speaker",
    "recognized", "successful", "honored", "published", "achievement", "excellent",
];

const NEGATIVE_WORDS: &[&str] = &[
    "arrested", "fraud", "lawsuit", "scandal", "fired", "convicted", "charged", "complaint", "scam",
    "bankrupt", "accused", "violation",
];

static YEAR_RE: OnceLock<Regex> = OnceLock::new();

fn year_regex() -> &'static Regex {
    YEAR_RE.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern is valid"))
}

/// Names of the feature dimensions, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDimension {
    NameMatch,
    EmailMatch,
    PhoneMatch,
    TitleRelevance,
    CompanyRelevance,
    SkillsRelevance,
    PlatformOverlap,
    LocationMatch,
    TopicSimilarity,
    KeywordDensity,
    SentimentAlignment,
    Recency,
    ContentFreshness,
    SourceTrust,
    DomainAuthority,
}

impl FeatureDimension {
    /// All dimensions in vector order.
    pub const ALL: [Self; FEATURE_DIM] = [
        Self::NameMatch,
        Self::EmailMatch,
        Self::PhoneMatch,
        Self::TitleRelevance,
        Self::CompanyRelevance,
        Self::SkillsRelevance,
        Self::PlatformOverlap,
        Self::LocationMatch,
        Self::TopicSimilarity,
        Self::KeywordDensity,
        Self::SentimentAlignment,
        Self::Recency,
        Self::ContentFreshness,
        Self::SourceTrust,
        Self::DomainAuthority,
    ];

    /// Dimension at a vector index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for FeatureDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NameMatch => "name_match",
            Self::EmailMatch => "email_match",
            Self::PhoneMatch => "phone_match",
            Self::TitleRelevance => "title_relevance",
            Self::CompanyRelevance => "company_relevance",
            Self::SkillsRelevance => "skills_relevance",
            Self::PlatformOverlap => "platform_overlap",
            Self::LocationMatch => "location_match",
            Self::TopicSimilarity => "topic_similarity",
            Self::KeywordDensity => "keyword_density",
            Self::SentimentAlignment => "sentiment_alignment",
            Self::Recency => "recency",
            Self::ContentFreshness => "content_freshness",
            Self::SourceTrust => "source_trust",
            Self::DomainAuthority => "domain_authority",
        };
        write!(f, "{name}")
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Extracts feature vectors relative to one target.
pub struct FeatureExtractor<'a> {
    target: &'a TargetIdentity,
    trust: &'a dyn TrustModel,
    as_of: Option<DateTime<Utc>>,
    target_tokens: Vec<String>,
}

impl<'a> FeatureExtractor<'a> {
    #[must_use]
    pub fn new(target: &'a TargetIdentity, trust: &'a dyn TrustModel, as_of: Option<DateTime<Utc>>) -> Self {
        Self {
            target,
            trust,
            as_of,
            target_tokens: target.tokens(),
        }
    }

    /// Builds the vector for one item.
    #[must_use]
    pub fn extract(&self, item: &EvidenceItem) -> FeatureVector {
        let attrs = &item.attributes;
        let text_tokens = tokenize(&item.text());
        let domain = item.effective_domain();

        let mut v = [0.0; FEATURE_DIM];
        v[0] = self.name_match(attrs.name());
        v[1] = attrs.email().map_or(0.0, |e| if self.target.matches_email(e) { 1.0 } else { 0.0 });
        v[2] = if attrs.phone().is_some() { 1.0 } else { 0.0 };
        v[3] = if attrs.title().is_some() { 1.0 } else { 0.0 };
        v[4] = self.company_relevance(attrs.company());
        v[5] = (attrs.skills.len() as f64 / 5.0).min(1.0);
        v[6] = self.platform_overlap(item);
        v[7] = if attrs.location().is_some() { 1.0 } else { 0.0 };
        v[8] = self.topic_similarity(&text_tokens);
        v[9] = self.keyword_density(&text_tokens);
        v[10] = sentiment_alignment(&text_tokens);
        v[11] = self.recency(item.published_at);
        v[12] = self.content_freshness(&item.text());
        v[13] = self.source_trust(&domain);
        v[14] = domain_authority(&domain);

        for value in &mut v {
            *value = value.clamp(0.0, 1.0);
        }
        v
    }

    fn name_match(&self, name: Option<&str>) -> f64 {
        match name {
            None => 0.0,
            Some(name) if self.target.matches_name(name) => 1.0,
            Some(name) => strsim::jaro_winkler(&normalize(name), &normalize(&self.target.full_name())),
        }
    }

    fn company_relevance(&self, company: Option<&str>) -> f64 {
        let Some(company) = company else {
            return 0.0;
        };
        let stem = self.target.email_domain_stem();
        if !stem.is_empty() && normalize(company).contains(&stem) {
            1.0
        } else {
            NEUTRAL
        }
    }

    fn platform_overlap(&self, item: &EvidenceItem) -> f64 {
        let profiles = &item.attributes.social_profiles;
        if profiles.is_empty() {
            return 0.0;
        }
        let platforms: HashSet<String> = profiles.iter().map(|p| p.platform.to_lowercase()).collect();
        let professional = platforms
            .iter()
            .filter(|p| self.trust.is_professional_platform(p))
            .count();
        let breadth = (platforms.len() as f64 / 3.0).min(1.0);
        0.5 * breadth + 0.5 * (professional as f64 / platforms.len() as f64)
    }

    fn topic_similarity(&self, text_tokens: &[String]) -> f64 {
        if self.target_tokens.is_empty() || text_tokens.is_empty() {
            return 0.0;
        }
        let text: HashSet<&str> = text_tokens.iter().map(String::as_str).collect();
        let target: HashSet<&str> = self.target_tokens.iter().map(String::as_str).collect();
        let intersection = text.intersection(&target).count() as f64;
        let union = text.union(&target).count() as f64;
        // Target tokens are few, so plain Jaccard is tiny on long text;
        // scale by the share of target tokens covered instead.
        (intersection / target.len() as f64).max(intersection / union)
    }

    fn keyword_density(&self, text_tokens: &[String]) -> f64 {
        if text_tokens.is_empty() {
            return 0.0;
        }
        let hits = text_tokens
            .iter()
            .filter(|t| self.target_tokens.contains(t))
            .count() as f64;
        (hits / text_tokens.len() as f64 * 10.0).min(1.0)
    }

    fn recency(&self, published_at: Option<DateTime<Utc>>) -> f64 {
        match (published_at, self.as_of) {
            (Some(published), Some(as_of)) => {
                let days = (as_of - published).num_days().max(0) as f64;
                1.0 / (1.0 + days / 365.0)
            }
            _ => NEUTRAL,
        }
    }

    fn content_freshness(&self, text: &str) -> f64 {
        let Some(as_of) = self.as_of else {
            return NEUTRAL;
        };
        let latest = year_regex()
            .find_iter(text)
            .filter_map(|m| m.as_str().parse::<i32>().ok())
            .filter(|year| *year <= as_of.year())
            .max();
        match latest {
            Some(year) => 1.0 - f64::from(as_of.year() - year) / 10.0,
            None => NEUTRAL,
        }
    }

    fn source_trust(&self, domain: &str) -> f64 {
        let max = self.trust.max_bonus();
        if max == 0 {
            return 0.0;
        }
        f64::from(self.trust.bonus(domain)) / f64::from(max)
    }
}

fn sentiment_alignment(text_tokens: &[String]) -> f64 {
    let positive = text_tokens
        .iter()
        .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
        .count() as f64;
    let negative = text_tokens
        .iter()
        .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
        .count() as f64;
    if positive + negative == 0.0 {
        return NEUTRAL;
    }
    (positive - negative) / (positive + negative) * 0.5 + 0.5
}

fn domain_authority(domain: &str) -> f64 {
    if domain.is_empty() {
        return 0.0;
    }
    let tld = domain.rsplit('.').next().unwrap_or_default();
    match tld {
        "gov" | "edu" | "mil" => 1.0,
        "org" | "int" => 0.7,
        "com" | "net" | "io" => 0.5,
        _ => 0.3,
    }
}
