//! # personlink - person entity resolution
//!
//! personlink takes noisy evidence about a named individual gathered from
//! many web sources and decides how many real people it describes. Each
//! piece of evidence is attributed to exactly one identity cluster, and
//! every cluster gets a 0-100 confidence with an itemized breakdown.
//!
//! ## Core Concepts
//!
//! - **Evidence item**: one source's metadata plus the attributes extracted from it
//! - **Cluster**: evidence hypothesized to describe the same real person
//! - **Relevance**: per-source score of how strongly the source points at the target
//! - **Confidence**: how strongly a cluster's merged evidence supports the target identity
//!
//! ## Usage
//!
//! ```rust
//! use personlink::{EvidenceItem, PersonAttributes, ResolveRequest, Resolver, ResolverConfig, TargetIdentity};
//!
//! let target = TargetIdentity::new("Jane", "Doe", "jane@acme.com")?;
//! let attrs = PersonAttributes {
//!     email: Some("jane@acme.com".into()),
//!     company: Some("Acme Corp".into()),
//!     ..PersonAttributes::default()
//! };
//! let evidence = vec![
//!     EvidenceItem::new("https://acme.com/team", "Team", "", attrs.clone()),
//!     EvidenceItem::new("https://github.com/jdoe", "jdoe", "", attrs),
//! ];
//!
//! let resolver = Resolver::new(ResolverConfig::default())?;
//! let result = resolver.resolve(&ResolveRequest::new(target, evidence));
//! assert_eq!(result.clusters.len(), 1);
//! assert!(result.clusters[0].confidence >= 70);
//! # Ok::<(), personlink::ValidationError>(())
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod biography;
pub mod cluster;
pub mod confidence;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod identity;
pub mod merge;
pub mod rank;
pub mod relevance;
pub mod result;
pub mod runtime;
pub mod source;
pub mod trust;

// Re-export primary types at crate root for convenience
pub use biography::{BiographicalProfile, BiographyAnalyzer, BiographySummary, HeuristicBiographyAnalyzer};
pub use cluster::{
    ClusterAnalytics, ClusterId, ClusteringDiagnostics, ClusteringStrategy, FeatureVectorClusterer,
    IncrementalClusterer, PersonCluster,
};
pub use confidence::{ConfidenceBreakdown, ConfidenceScorer};
pub use config::{ClusteringStrategyKind, KMeansConfig, ResolverConfig, SourcePolicy};
pub use conflict::{ClusterRelationship, ConflictType, IdentityConflict, RelationshipAnalyzer, RelationshipType};
pub use engine::{ResolveRequest, Resolver};
pub use error::{ClusteringError, ResolveError, ResolveResult, RuntimeError, ValidationError};
pub use evidence::{EvidenceItem, PersonAttributes, SocialProfile};
pub use identity::TargetIdentity;
pub use relevance::RelevanceScorer;
pub use result::{ClusteringResult, NarrativeAnalysis, RecommendedAction, ResultSummary};
pub use runtime::{ResolutionHandle, ResolverRuntime, RuntimeConfig};
pub use source::SourceRecord;
pub use trust::{DomainTrustTable, TrustModel, TrustTier};
