//! Resolution engine.
//!
//! [`Resolver`] runs the whole pipeline for one target identity:
//!
//! 1. drop evidence from excluded domains,
//! 2. score relevance and put evidence into stable order,
//! 3. cluster with the configured strategy,
//! 4. attach biographical profiles and score confidence,
//! 5. rank, analyze relationships, summarize.
//!
//! A resolver holds configuration only. Each call owns its own scratch state,
//! so one resolver can serve many threads at once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::biography::BiographyAnalyzer;
use crate::cluster::{
    stable_order, ClusterOutput, ClusteringContext, ClusteringStrategy, FeatureVectorClusterer, IncrementalClusterer,
    ScoredEvidence,
};
use crate::confidence::ConfidenceScorer;
use crate::config::{ClusteringStrategyKind, ResolverConfig};
use crate::conflict::{narrative, RelationshipAnalyzer};
use crate::error::ValidationError;
use crate::evidence::EvidenceItem;
use crate::identity::TargetIdentity;
use crate::rank::{rank, summarize};
use crate::relevance::RelevanceScorer;
use crate::result::ClusteringResult;
use crate::trust::TrustModel;

/// One resolution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub target: TargetIdentity,
    /// Evidence in the order the collaborators produced it.
    pub evidence: Vec<EvidenceItem>,
    /// Reference time for temporal features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

impl ResolveRequest {
    #[must_use]
    pub fn new(target: TargetIdentity, evidence: Vec<EvidenceItem>) -> Self {
        Self {
            target,
            evidence,
            as_of: None,
        }
    }

    /// Sets the reference time.
    #[must_use]
    pub fn as_of(mut self, at: DateTime<Utc>) -> Self {
        self.as_of = Some(at);
        self
    }
}

fn strategy_for(kind: ClusteringStrategyKind) -> Arc<dyn ClusteringStrategy> {
    match kind {
        ClusteringStrategyKind::RuleBased => Arc::new(IncrementalClusterer::new()),
        ClusteringStrategyKind::FeatureVector => Arc::new(FeatureVectorClusterer::new()),
    }
}

/// Stateless entity-resolution engine.
#[derive(Clone)]
pub struct Resolver {
    config: ResolverConfig,
    trust: Arc<dyn TrustModel>,
    strategy: Arc<dyn ClusteringStrategy>,
    biography: Option<Arc<dyn BiographyAnalyzer>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("strategy", &self.strategy.name())
            .field("trust", &self.trust.name())
            .field("biography", &self.biography.as_ref().map(|b| b.name()))
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Creates a resolver from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found in `config`.
    pub fn new(config: ResolverConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            trust: Arc::new(config.trust.clone()),
            strategy: strategy_for(config.strategy),
            biography: None,
            config,
        })
    }

    /// Replaces the configured trust table with a custom model.
    #[must_use]
    pub fn with_trust_model(mut self, trust: Arc<dyn TrustModel>) -> Self {
        self.trust = trust;
        self
    }

    /// Replaces the configured strategy with a custom implementation.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ClusteringStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enables biographical profiling.
    #[must_use]
    pub fn with_biography(mut self, analyzer: Arc<dyn BiographyAnalyzer>) -> Self {
        self.biography = Some(analyzer);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves evidence into ranked identity clusters.
    ///
    /// Never fails: absent or malformed evidence only lowers confidence.
    #[must_use]
    pub fn resolve(&self, request: &ResolveRequest) -> ClusteringResult {
        let span = info_span!(
            "resolve",
            target = %request.target,
            items = request.evidence.len(),
            strategy = self.strategy.name()
        );
        let _enter = span.enter();

        let target = &request.target;
        let policy = &self.config.source_policy;
        let relevance = RelevanceScorer::new(target, self.trust.as_ref());

        let mut excluded = 0usize;
        let mut evidence: Vec<ScoredEvidence<'_>> = Vec::with_capacity(request.evidence.len());
        for (index, item) in request.evidence.iter().enumerate() {
            let domain = item.effective_domain();
            if policy.is_excluded(&domain) {
                excluded += 1;
                continue;
            }
            evidence.push(ScoredEvidence {
                index,
                item,
                relevance: relevance.score(item),
                snippet_only: policy.is_snippet_only(&domain),
            });
        }
        debug!(included = evidence.len(), excluded, "source policy applied");

        stable_order(&mut evidence);

        let ctx = ClusteringContext {
            target,
            config: &self.config,
            trust: self.trust.as_ref(),
            as_of: request.as_of,
        };
        let ClusterOutput {
            mut clusters,
            diagnostics,
        } = self.strategy.cluster(&ctx, &evidence);
        debug!(
            clusters = clusters.len(),
            comparisons = diagnostics.comparisons,
            chosen_k = ?diagnostics.chosen_k,
            fallbacks = diagnostics.fallbacks,
            "clustering complete"
        );

        let scorer = ConfidenceScorer::new(target, self.trust.as_ref());
        for cluster in &mut clusters {
            if let Some(analyzer) = &self.biography {
                cluster.biography = analyzer.analyze(target, cluster);
            }
            scorer.apply(cluster);
        }

        rank(&mut clusters);
        let report = RelationshipAnalyzer::new().analyze(&mut clusters);
        let analysis = narrative(&clusters);
        let summary = summarize(&clusters, excluded, self.config.top_domain_limit);
        debug!(
            top_confidence = analysis.main_person_confidence,
            likely_same_person = analysis.likely_same_person,
            "resolution complete"
        );

        ClusteringResult {
            target: target.clone(),
            strategy: self.strategy.name().to_string(),
            clusters,
            summary,
            analysis,
            conflicts: report.conflicts,
            pairs: report.pairs,
            diagnostics,
        }
    }
}
