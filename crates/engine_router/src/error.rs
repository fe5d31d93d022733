//! Error types for the engine router
//!
//! Two layers of failure exist:
//!
//! - [`BackendError`] describes what went wrong during a single attempt against
//!   a single spot. These never leave the orchestrator on their own; they are
//!   converted into retry steps.
//! - [`RouterError`] is what callers of [`crate::EvalRouter::analyze`] see once
//!   the attempt budget is spent or the router could not start at all.

use thiserror::Error;

/// Failure of one evaluation attempt against one backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The attempt exceeded its per-attempt timeout
    #[error("timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Network error, malformed response or non-success status
    #[error("{cause}")]
    Failure { cause: String },

    /// The backend refused the request because of rate limiting
    #[error("rate limited")]
    RateLimited,

    /// The backend has no evaluation for this position
    #[error("position not found")]
    NotFound,
}

impl BackendError {
    pub fn failure(cause: impl Into<String>) -> Self {
        BackendError::Failure {
            cause: cause.into(),
        }
    }

    /// Rate limiting and missing positions are backend-specific conditions,
    /// not transient ones.
    pub fn is_definitive(&self) -> bool {
        matches!(self, BackendError::RateLimited | BackendError::NotFound)
    }
}

/// Errors surfaced by the router to its callers
#[derive(Error, Debug)]
pub enum RouterError {
    /// No enabled backend is registered and fallback is off
    #[error("no evaluation backends available")]
    NoBackendsAvailable,

    /// Every attempted backend failed and fallback is off
    #[error("all backends failed: {}", .failures.join("; "))]
    AllBackendsFailed { failures: Vec<String> },

    /// The FEN handed to the router (or the fallback evaluator) is malformed
    #[error("invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },

    /// The local heuristic evaluator could not produce a result
    #[error("fallback evaluation failed: {message}")]
    Fallback { message: String },

    /// Descriptor or router configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading router configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Descriptor file could not be read
    #[error("failed to read descriptor file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor document is not a JSON array
    #[error("descriptor document is not a JSON array: {message}")]
    Document { message: String },

    /// An environment value could not be parsed
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Result type alias for router operations
pub type RouterResult<T> = Result<T, RouterError>;

/// Result type alias for a single backend attempt
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_backends_failed_lists_reasons_in_order() {
        let err = RouterError::AllBackendsFailed {
            failures: vec![
                "spot-a: timed out after 10ms".to_string(),
                "spot-b: bad json".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "all backends failed: spot-a: timed out after 10ms; spot-b: bad json"
        );
    }

    #[test]
    fn test_definitive_errors() {
        assert!(BackendError::RateLimited.is_definitive());
        assert!(BackendError::NotFound.is_definitive());
        assert!(!BackendError::Timeout { elapsed_ms: 5 }.is_definitive());
        assert!(!BackendError::failure("boom").is_definitive());
    }
}
