//! Top-level error type for the analysis pipeline

use engine_router::{ConfigError, RouterError};
use move_tagger::TagError;
use thiserror::Error;

/// Errors surfaced by [`crate::analyzer::MoveAnalyzer`] and settings loading
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Every backend and the fallback failed, or the position was rejected
    #[error(transparent)]
    Router(#[from] RouterError),

    /// The move or position could not be turned into a feature snapshot
    #[error(transparent)]
    Tagging(#[from] TagError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Settings file could not be written
    #[error("Settings file {path}: {source}")]
    SettingsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings serialization failed: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
