//! Resolver configuration.
//!
//! Every table the heuristics consult (domain trust, excluded domains,
//! clustering parameters) lives here so callers can inject their own.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::trust::DomainTrustTable;

/// Which clustering strategy a resolution run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringStrategyKind {
    /// Greedy, single-pass weighted-rule clustering.
    #[default]
    RuleBased,
    /// Feature vectors partitioned with k-means and elbow selection.
    FeatureVector,
}

impl fmt::Display for ClusteringStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleBased => write!(f, "rule_based"),
            Self::FeatureVector => write!(f, "feature_vector"),
        }
    }
}

/// Which sources take part in a run, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePolicy {
    /// Evidence from these domains (and their subdomains) is dropped before clustering.
    pub excluded_domains: BTreeSet<String>,

    /// Domains whose pages are never fetched; only their search-result
    /// title and snippet are available. Records from them are flagged.
    pub snippet_only_domains: BTreeSet<String>,
}

fn domain_in(set: &BTreeSet<String>, domain: &str) -> bool {
    let domain = domain.trim().to_lowercase();
    if domain.is_empty() {
        return false;
    }
    set.iter()
        .any(|d| domain == *d || domain.ends_with(&format!(".{d}")))
}

impl SourcePolicy {
    /// Excludes a domain.
    #[must_use]
    pub fn exclude(mut self, domain: impl Into<String>) -> Self {
        self.excluded_domains.insert(domain.into().to_lowercase());
        self
    }

    /// Marks a domain as snippet-only.
    #[must_use]
    pub fn snippet_only(mut self, domain: impl Into<String>) -> Self {
        self.snippet_only_domains.insert(domain.into().to_lowercase());
        self
    }

    /// True if evidence from `domain` must be dropped.
    #[must_use]
    pub fn is_excluded(&self, domain: &str) -> bool {
        domain_in(&self.excluded_domains, domain)
    }

    /// True if `domain` is only ever seen through its search snippet.
    #[must_use]
    pub fn is_snippet_only(&self, domain: &str) -> bool {
        domain_in(&self.snippet_only_domains, domain)
    }
}

/// Configuration for k-means clustering and elbow selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Largest k tried by the elbow search (also bounded by n/2).
    pub max_k: usize,

    /// Cap on the elbow-selected k.
    pub elbow_cap: usize,

    /// Maximum Lloyd iterations per run.
    pub max_iterations: usize,

    /// Iteration stops when max centroid movement falls below this.
    pub tolerance: f64,

    /// Seed selecting the first initial centroid.
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_k: 6,
            elbow_cap: 3,
            max_iterations: 100,
            tolerance: 1e-6,
            seed: 0,
        }
    }
}

impl KMeansConfig {
    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_k == 0 {
            return Err(ValidationError::InvalidKMeansConfig {
                reason: "max_k must be > 0".to_string(),
            });
        }
        if self.elbow_cap == 0 {
            return Err(ValidationError::InvalidKMeansConfig {
                reason: "elbow_cap must be > 0".to_string(),
            });
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::InvalidKMeansConfig {
                reason: "max_iterations must be > 0".to_string(),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ValidationError::InvalidKMeansConfig {
                reason: "tolerance must be a finite positive number".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Clustering strategy.
    pub strategy: ClusteringStrategyKind,

    /// Domain trust table shared by relevance, features and confidence.
    pub trust: DomainTrustTable,

    /// Source inclusion policy.
    pub source_policy: SourcePolicy,

    /// Feature-vector clustering parameters.
    pub kmeans: KMeansConfig,

    /// Reject a rule-based match when both sides carry different emails.
    pub email_conflict_veto: bool,

    /// Number of domains reported in the summary.
    pub top_domain_limit: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy: ClusteringStrategyKind::RuleBased,
            trust: DomainTrustTable::default(),
            source_policy: SourcePolicy::default(),
            kmeans: KMeansConfig::default(),
            email_conflict_veto: true,
            top_domain_limit: 5,
        }
    }
}

impl ResolverConfig {
    /// Default configuration using the given strategy.
    #[must_use]
    pub fn with_strategy(strategy: ClusteringStrategyKind) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(document: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(document).map_err(|e| ValidationError::MalformedConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every nested section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.kmeans.validate()?;
        self.trust.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy, ClusteringStrategyKind::RuleBased);
        assert!(config.email_conflict_veto);
    }

    #[test]
    fn test_kmeans_validation() {
        let bad = KMeansConfig {
            tolerance: 0.0,
            ..KMeansConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = KMeansConfig {
            max_k: 0,
            ..KMeansConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = KMeansConfig {
            tolerance: f64::NAN,
            ..KMeansConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_source_policy_matches_subdomains() {
        let policy = SourcePolicy::default().exclude("Spam.test").snippet_only("linkedin.com");
        assert!(policy.is_excluded("spam.test"));
        assert!(policy.is_excluded("cdn.spam.test"));
        assert!(!policy.is_excluded("notspam.test"));
        assert!(!policy.is_excluded(""));
        assert!(policy.is_snippet_only("uk.linkedin.com"));
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = ResolverConfig::from_json(
            r#"{"strategy":"feature_vector","kmeans":{"seed":7},"source_policy":{"excluded_domains":["spam.test"]}}"#,
        )
        .unwrap();
        assert_eq!(config.strategy, ClusteringStrategyKind::FeatureVector);
        assert_eq!(config.kmeans.seed, 7);
        assert_eq!(config.kmeans.max_k, 6);
        assert!(config.source_policy.is_excluded("spam.test"));
        assert_eq!(config.top_domain_limit, 5);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            ResolverConfig::from_json("{not json"),
            Err(ValidationError::MalformedConfig { .. })
        ));
        assert!(matches!(
            ResolverConfig::from_json(r#"{"kmeans":{"max_iterations":0}}"#),
            Err(ValidationError::InvalidKMeansConfig { .. })
        ));
    }
}
