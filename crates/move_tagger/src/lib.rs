//! Rule-based semantic move tagging
//!
//! A move is turned into one immutable [`TagContext`] by [`FeatureBuilder`],
//! every detector in the [`TagEngine`] reads that snapshot, and
//! [`resolution::resolve`] applies suppression and exclusivity to produce the
//! stored [`TagResult`].
//!
//! ```text
//! FeatureBuilder::build ─► TagContext ─► TagEngine::evaluate ─► resolve ─► TagResult
//! ```

pub mod aliases;
pub mod builder;
pub mod context;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod features;
pub mod gate;
pub mod resolution;
pub mod tags;
pub mod thresholds;
pub mod versioning;

#[cfg(test)]
mod fixtures;

pub use builder::FeatureBuilder;
pub use context::{Candidate, EngineParams, MoveKind, PlayedMove, TagContext};
pub use engine::{DetectionRun, TagEngine};
pub use error::{DetectorError, TagError, TaggerResult};
pub use features::{Metrics, Phase};
pub use gate::{Detector, Evidence, Gate, TagEvidence};
pub use resolution::{DetectorFault, MoveQuality, Suppression, TagOutcome, TagResult};
pub use tags::{Family, Tag, UnknownTag};
pub use thresholds::TAGGER_VERSION;
pub use versioning::{current_metadata, detect_version, VersionMatch};
