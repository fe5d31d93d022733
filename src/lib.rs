//! Position evaluation and move tagging for XFChess game review
//!
//! [`engine_router`] decides which engine spot evaluates a position and falls
//! back to a local heuristic when none can. [`move_tagger`] turns a played
//! move and its evaluations into semantic tags. [`MoveAnalyzer`] wires the two
//! together.

pub mod analyzer;
pub mod error;
pub mod settings;

pub use analyzer::{AnalyzedMove, MoveAnalyzer};
pub use error::{AnalysisError, AnalysisResult};
pub use settings::Settings;

pub use engine_router;
pub use move_tagger;
