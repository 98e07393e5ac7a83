//! Domain trust models.
//!
//! Trust is modeled separately from identity matching. A trust tier scales
//! how much a source's domain adds to relevance and feature scores; it never
//! decides cluster membership. Tables are injected through configuration so
//! tests can use synthetic domains.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Coarse trust classification of a source domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    /// Professional networks and developer platforms.
    Professional,
    /// Universities and research indexes.
    Academic,
    /// Government domains.
    Government,
    /// General social networks and publishing platforms.
    Social,
    /// Established news outlets.
    News,
    /// Anything unrecognized, including the empty domain.
    Generic,
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Professional => write!(f, "professional"),
            Self::Academic => write!(f, "academic"),
            Self::Government => write!(f, "government"),
            Self::Social => write!(f, "social"),
            Self::News => write!(f, "news"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Relevance bonus granted per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBonuses {
    pub professional: u32,
    pub academic: u32,
    pub government: u32,
    pub social: u32,
    pub news: u32,
    pub generic: u32,
}

impl Default for TierBonuses {
    fn default() -> Self {
        Self {
            professional: 15,
            academic: 15,
            government: 15,
            social: 10,
            news: 5,
            generic: 0,
        }
    }
}

impl TierBonuses {
    /// Bonus for a tier.
    #[must_use]
    pub const fn for_tier(&self, tier: TrustTier) -> u32 {
        match tier {
            TrustTier::Professional => self.professional,
            TrustTier::Academic => self.academic,
            TrustTier::Government => self.government,
            TrustTier::Social => self.social,
            TrustTier::News => self.news,
            TrustTier::Generic => self.generic,
        }
    }

    fn iter(&self) -> [(TrustTier, u32); 6] {
        [
            (TrustTier::Professional, self.professional),
            (TrustTier::Academic, self.academic),
            (TrustTier::Government, self.government),
            (TrustTier::Social, self.social),
            (TrustTier::News, self.news),
            (TrustTier::Generic, self.generic),
        ]
    }

    /// Largest bonus any tier can grant.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.iter().iter().map(|(_, b)| *b).max().unwrap_or(0)
    }
}

/// Trust evaluation interface.
pub trait TrustModel: Send + Sync {
    /// Name of the trust model (for audit/debugging).
    fn name(&self) -> &str;

    /// Classifies a (lowercased) source domain.
    fn tier(&self, domain: &str) -> TrustTier;

    /// Relevance bonus for a domain.
    fn bonus(&self, domain: &str) -> u32;

    /// Largest bonus this model can grant; used to normalize to [0, 1].
    fn max_bonus(&self) -> u32;

    /// True if a social platform name counts as a professional network.
    fn is_professional_platform(&self, platform: &str) -> bool;
}

/// Table-driven trust model.
///
/// - Exact domains match the domain itself and all of its subdomains.
/// - Suffix rules (`.edu`, `.gov`) apply when no exact domain matched.
/// - Everything else, including the empty domain, is [`TrustTier::Generic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainTrustTable {
    domains: BTreeMap<String, TrustTier>,
    suffixes: BTreeMap<String, TrustTier>,
    bonuses: TierBonuses,
    professional_platforms: BTreeSet<String>,
}

impl Default for DomainTrustTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for domain in [
            "linkedin.com",
            "github.com",
            "gitlab.com",
            "stackoverflow.com",
            "crunchbase.com",
            "angel.co",
            "wellfound.com",
        ] {
            table = table.with_domain(domain, TrustTier::Professional);
        }
        for domain in ["scholar.google.com", "researchgate.net", "orcid.org", "arxiv.org", "academia.edu"] {
            table = table.with_domain(domain, TrustTier::Academic);
        }
        for domain in [
            "twitter.com",
            "x.com",
            "facebook.com",
            "instagram.com",
            "medium.com",
            "youtube.com",
            "reddit.com",
            "substack.com",
        ] {
            table = table.with_domain(domain, TrustTier::Social);
        }
        for domain in ["nytimes.com", "reuters.com", "bbc.co.uk", "bloomberg.com", "forbes.com", "techcrunch.com"] {
            table = table.with_domain(domain, TrustTier::News);
        }
        table = table
            .with_suffix(".edu", TrustTier::Academic)
            .with_suffix(".ac.uk", TrustTier::Academic)
            .with_suffix(".gov", TrustTier::Government)
            .with_suffix(".mil", TrustTier::Government);
        for platform in ["linkedin", "github", "gitlab", "stackoverflow", "angellist", "crunchbase"] {
            table = table.with_professional_platform(platform);
        }
        table
    }
}

impl DomainTrustTable {
    /// A table that recognizes nothing: every domain is generic.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            domains: BTreeMap::new(),
            suffixes: BTreeMap::new(),
            bonuses: TierBonuses::default(),
            professional_platforms: BTreeSet::new(),
        }
    }

    /// Registers a domain (and its subdomains) under a tier.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>, tier: TrustTier) -> Self {
        self.domains.insert(domain.into().to_lowercase(), tier);
        self
    }

    /// Registers a suffix rule such as `.edu`.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>, tier: TrustTier) -> Self {
        self.suffixes.insert(suffix.into().to_lowercase(), tier);
        self
    }

    /// Replaces the per-tier bonuses.
    #[must_use]
    pub fn with_bonuses(mut self, bonuses: TierBonuses) -> Self {
        self.bonuses = bonuses;
        self
    }

    /// Marks a social platform name as professional.
    #[must_use]
    pub fn with_professional_platform(mut self, platform: impl Into<String>) -> Self {
        self.professional_platforms.insert(platform.into().to_lowercase());
        self
    }

    /// The configured bonuses.
    #[must_use]
    pub const fn bonuses(&self) -> &TierBonuses {
        &self.bonuses
    }

    /// Checks that every bonus lies within [0, 100].
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (tier, value) in self.bonuses.iter() {
            if value > 100 {
                return Err(ValidationError::InvalidTrustBonus {
                    tier: tier.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    fn lookup_domain(&self, domain: &str) -> Option<TrustTier> {
        let mut candidate = domain;
        loop {
            if let Some(tier) = self.domains.get(candidate) {
                return Some(*tier);
            }
            match candidate.find('.') {
                Some(pos) => candidate = &candidate[pos + 1..],
                None => return None,
            }
        }
    }

    fn lookup_suffix(&self, domain: &str) -> Option<TrustTier> {
        // Longest suffix wins so `.ac.uk` beats a hypothetical `.uk`.
        self.suffixes
            .iter()
            .filter(|(suffix, _)| domain.ends_with(suffix.as_str()))
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, tier)| *tier)
    }
}

impl TrustModel for DomainTrustTable {
    fn name(&self) -> &str {
        "domain_table"
    }

    fn tier(&self, domain: &str) -> TrustTier {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return TrustTier::Generic;
        }
        self.lookup_domain(&domain)
            .or_else(|| self.lookup_suffix(&domain))
            .unwrap_or(TrustTier::Generic)
    }

    fn bonus(&self, domain: &str) -> u32 {
        self.bonuses.for_tier(self.tier(domain))
    }

    fn max_bonus(&self) -> u32 {
        self.bonuses.max()
    }

    fn is_professional_platform(&self, platform: &str) -> bool {
        self.professional_platforms.contains(&platform.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_classifies_known_domains() {
        let table = DomainTrustTable::default();
        assert_eq!(table.tier("linkedin.com"), TrustTier::Professional);
        assert_eq!(table.tier("uk.linkedin.com"), TrustTier::Professional);
        assert_eq!(table.tier("cs.stanford.edu"), TrustTier::Academic);
        assert_eq!(table.tier("oxford.ac.uk"), TrustTier::Academic);
        assert_eq!(table.tier("data.census.gov"), TrustTier::Government);
        assert_eq!(table.tier("x.com"), TrustTier::Social);
        assert_eq!(table.tier("random-blog.net"), TrustTier::Generic);
        assert_eq!(table.tier(""), TrustTier::Generic);
    }

    #[test]
    fn unknown_domains_get_lowest_bonus() {
        let table = DomainTrustTable::default();
        assert_eq!(table.bonus("unknown.example"), 0);
        assert_eq!(table.bonus(""), 0);
        assert_eq!(table.bonus("github.com"), 15);
        assert_eq!(table.max_bonus(), 15);
    }

    #[test]
    fn synthetic_tables_are_injectable() {
        let table = DomainTrustTable::empty()
            .with_domain("trusted.test", TrustTier::Professional)
            .with_professional_platform("Guild")
            .with_bonuses(TierBonuses {
                professional: 40,
                ..TierBonuses::default()
            });
        assert_eq!(table.bonus("api.trusted.test"), 40);
        assert_eq!(table.bonus("linkedin.com"), 0);
        assert!(table.is_professional_platform("guild"));
        assert!(!table.is_professional_platform("linkedin"));
    }

    #[test]
    fn validate_rejects_oversized_bonus() {
        let table = DomainTrustTable::empty().with_bonuses(TierBonuses {
            news: 101,
            ..TierBonuses::default()
        });
        assert!(matches!(
            table.validate(),
            Err(ValidationError::InvalidTrustBonus { value: 101, .. })
        ));
        assert!(DomainTrustTable::default().validate().is_ok());
    }
}
