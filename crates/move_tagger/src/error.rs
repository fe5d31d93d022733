//! Error types for move tagging
//!
//! [`TagError`] fails a whole tagging request. [`DetectorError`] is local to
//! one detector and never escapes the tag engine: it is folded into a
//! recorded fault and the tag is reported as not fired.

use thiserror::Error;

/// Errors that abort building the feature snapshot for a move
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The FEN could not be parsed into a legal position
    #[error("Invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },

    /// The move is malformed or illegal in the given position
    #[error("Invalid move '{uci}': {reason}")]
    InvalidMove { uci: String, reason: String },

    /// An analysis needed by the snapshot has no lines
    #[error("Missing evaluation: {what}")]
    MissingEvaluation { what: String },
}

/// Error raised by a single gate while evaluating a detector
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// A gate needs candidate moves but the snapshot has none
    #[error("gate '{gate}' needs engine candidates")]
    MissingCandidates { gate: &'static str },

    /// A metric the gate reads is NaN or infinite
    #[error("gate '{gate}' read a non-finite value for {metric}")]
    NonFinite {
        gate: &'static str,
        metric: &'static str,
    },

    /// The detector panicked; caught by the tag engine
    #[error("detector panicked: {message}")]
    Panicked { message: String },
}

/// Result type alias for snapshot construction
pub type TaggerResult<T> = Result<T, TagError>;

/// Result type alias for gate checks
pub type GateResult = Result<bool, DetectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TagError::InvalidMove {
            uci: "e2e5".to_string(),
            reason: "illegal".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid move 'e2e5': illegal");

        let err = DetectorError::NonFinite {
            gate: "is_sacrifice",
            metric: "material_delta",
        };
        assert!(err.to_string().contains("material_delta"));
    }
}
