//! Error types for personlink.
//!
//! All errors are strongly typed using thiserror. Note that malformed
//! *evidence* is never an error: absent or unparseable fields only lower
//! confidence. Errors are reserved for invalid caller input (target identity,
//! configuration) and for runtime plumbing.

use thiserror::Error;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Target identity field '{field}' cannot be empty")]
    EmptyTargetName {
        field: &'static str,
    },

    #[error("Invalid email address: '{value}'")]
    InvalidEmail {
        value: String,
    },

    #[error("Invalid k-means configuration: {reason}")]
    InvalidKMeansConfig {
        reason: String,
    },

    #[error("Trust bonus for tier '{tier}' must be within [0, 100], got {value}")]
    InvalidTrustBonus {
        tier: String,
        value: u32,
    },

    #[error("Invalid runtime configuration: {reason}")]
    InvalidRuntimeConfig {
        reason: String,
    },

    #[error("Invalid configuration document: {message}")]
    MalformedConfig {
        message: String,
    },
}

/// Numerical failures inside the feature-vector clustering routine.
///
/// These never escape [`crate::Resolver::resolve`]; the feature-vector
/// strategy converts them into its fixed-centroid fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusteringError {
    #[error("Feature {dimension} of evidence item {item} is not finite")]
    NonFiniteFeature {
        item: usize,
        dimension: usize,
    },

    #[error("Cannot form {k} clusters from {items} items")]
    InvalidClusterCount {
        k: usize,
        items: usize,
    },

    #[error("Centroids became non-finite after {iterations} iterations")]
    Diverged {
        iterations: usize,
    },
}

/// Errors raised by the concurrent resolution runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Resolution queue is full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Resolution worker disconnected")]
    Disconnected,

    #[error("Resolution timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to spawn resolution worker: {message}")]
    Spawn {
        message: String,
    },
}

/// Top-level error type for personlink.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Clustering error: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl ResolveError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a runtime error.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Clustering(_) => false,
            Self::Runtime(e) => matches!(e, RuntimeError::QueueFull { .. } | RuntimeError::Timeout { .. }),
        }
    }
}

/// Result type alias for personlink operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_empty_name() {
        let err = ValidationError::EmptyTargetName { field: "first_name" };
        let msg = format!("{err}");
        assert!(msg.contains("first_name"));
        assert!(msg.contains("cannot be empty"));
    }

    #[test]
    fn test_clustering_error_message() {
        let err = ClusteringError::NonFiniteFeature { item: 3, dimension: 7 };
        let msg = format!("{err}");
        assert!(msg.contains("Feature 7"));
        assert!(msg.contains("item 3"));
    }

    #[test]
    fn test_runtime_error_timeout() {
        let err = RuntimeError::Timeout { duration_ms: 5000 };
        assert!(format!("{err}").contains("5000ms"));
    }

    #[test]
    fn test_resolve_error_from_validation() {
        let err: ResolveError = ValidationError::InvalidEmail { value: "nope".into() }.into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_resolve_error_retryable() {
        let full: ResolveError = RuntimeError::QueueFull { capacity: 4 }.into();
        assert!(full.is_runtime());
        assert!(full.is_retryable());

        let gone: ResolveError = RuntimeError::Disconnected.into();
        assert!(!gone.is_retryable());

        let numeric: ResolveError = ClusteringError::Diverged { iterations: 10 }.into();
        assert!(!numeric.is_retryable());
    }
}
