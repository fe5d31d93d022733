//! Gate model shared by every detector
//!
//! A detector is data: a tag, an ordered gate list and two small functions.
//! [`Detector::evaluate`] is the only control flow. Gates run in order; the
//! first failing gate is recorded and evaluation stops there, so downstream
//! gates are never reported as failed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::TagContext;
use crate::error::{DetectorError, GateResult};
use crate::tags::{Family, Tag};

/// Free-form diagnostics attached to a detector outcome
pub type Evidence = BTreeMap<String, Value>;

/// One named boolean precondition
#[derive(Clone, Copy)]
pub struct Gate {
    pub name: &'static str,
    pub check: fn(&TagContext) -> GateResult,
}

impl Gate {
    pub const fn new(name: &'static str, check: fn(&TagContext) -> GateResult) -> Self {
        Self { name, check }
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Gate").field(&self.name).finish()
    }
}

/// A tag rule: gates plus confidence and evidence functions
#[derive(Clone, Copy)]
pub struct Detector {
    pub tag: Tag,
    pub gates: &'static [Gate],
    pub confidence: fn(&TagContext) -> f64,
    pub evidence: fn(&TagContext) -> Evidence,
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("tag", &self.tag)
            .field("gates", &self.gates)
            .finish()
    }
}

/// Output of one detector for one move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEvidence {
    pub tag: Tag,
    pub fired: bool,
    /// In `[0, 1]`; always 0 when not fired
    pub confidence: f64,
    pub evidence: Evidence,
    pub gates_passed: Vec<String>,
    pub gates_failed: Vec<String>,
}

impl TagEvidence {
    /// Outcome of a detector that errored or panicked
    pub fn fault(tag: Tag, err: &DetectorError) -> Self {
        let mut evidence = Evidence::new();
        evidence.insert("error".to_string(), Value::String(err.to_string()));
        Self {
            tag,
            fired: false,
            confidence: 0.0,
            evidence,
            gates_passed: Vec::new(),
            gates_failed: Vec::new(),
        }
    }
}

impl Detector {
    pub const fn new(
        tag: Tag,
        gates: &'static [Gate],
        confidence: fn(&TagContext) -> f64,
        evidence: fn(&TagContext) -> Evidence,
    ) -> Self {
        Self {
            tag,
            gates,
            confidence,
            evidence,
        }
    }

    pub fn family(&self) -> Family {
        self.tag.family()
    }

    pub fn evaluate(&self, ctx: &TagContext) -> Result<TagEvidence, DetectorError> {
        let mut gates_passed = Vec::with_capacity(self.gates.len());
        let mut gates_failed = Vec::new();

        for gate in self.gates {
            if (gate.check)(ctx)? {
                gates_passed.push(gate.name.to_string());
            } else {
                gates_failed.push(gate.name.to_string());
                break;
            }
        }

        let fired = gates_failed.is_empty();
        let confidence = if fired {
            let raw = (self.confidence)(ctx);
            if !raw.is_finite() {
                return Err(DetectorError::NonFinite {
                    gate: "confidence",
                    metric: self.tag.name(),
                });
            }
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(TagEvidence {
            tag: self.tag,
            fired,
            confidence,
            evidence: (self.evidence)(ctx),
            gates_passed,
            gates_failed,
        })
    }
}

/// Reject NaN and infinities before a threshold comparison
pub fn finite(gate: &'static str, metric: &'static str, value: f64) -> Result<f64, DetectorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DetectorError::NonFinite { gate, metric })
    }
}

/// Build an [`Evidence`] map from `key => value` pairs
#[macro_export]
macro_rules! evidence {
    ($($key:literal => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::gate::Evidence::new();
        $(map.insert($key.to_string(), ::serde_json::json!($value));)*
        map
    }};
}

/// Confidence function for detectors without a continuous signal
pub fn full_confidence(_: &TagContext) -> f64 {
    1.0
}

pub fn no_evidence(_: &TagContext) -> Evidence {
    Evidence::new()
}
