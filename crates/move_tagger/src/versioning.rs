//! Tagger version fingerprints
//!
//! Stored analyses written before the version field existed only carry the
//! metadata signature. Each released version has a fingerprint of boolean
//! feature flags and numeric thresholds; a record is attributed to the
//! version whose fingerprint it matches best.

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::thresholds::{
    EXCHANGE_BAD_CP, FIRST_CHOICE_MARGIN_CP, PROPHYLAXIS_TRIGGER, SACRIFICE_EVAL_TOLERANCE,
    TAGGER_VERSION, TENSION_CONTACT_TRIGGER,
};

/// Minimum share of matching keys for a fingerprint to be accepted
pub const MIN_FINGERPRINT_CONFIDENCE: f64 = 0.6;

/// Numeric signature values match within this tolerance
pub const NUMERIC_TOLERANCE: f64 = 1e-3;

pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signature {
    Flag(bool),
    Number(f64),
}

impl Signature {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Signature::Flag(expected), Value::Bool(actual)) => expected == actual,
            (Signature::Number(expected), Value::Number(actual)) => actual
                .as_f64()
                .is_some_and(|actual| (actual - expected).abs() <= NUMERIC_TOLERANCE),
            _ => false,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Signature::Flag(flag) => Value::Bool(flag),
            Signature::Number(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
        }
    }
}

/// Signature of one released version
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub version: &'static str,
    pub keys: Vec<(&'static str, Signature)>,
}

impl Fingerprint {
    /// Share of this fingerprint's keys that `metadata` matches
    pub fn score(&self, metadata: &Map<String, Value>) -> f64 {
        if self.keys.is_empty() {
            return 0.0;
        }
        let matched = self
            .keys
            .iter()
            .filter(|(key, sig)| metadata.get(*key).is_some_and(|v| sig.matches(v)))
            .count();
        matched as f64 / self.keys.len() as f64
    }
}

/// Released versions, oldest first
static FINGERPRINTS: Lazy<Vec<Fingerprint>> = Lazy::new(|| {
    use Signature::{Flag, Number};
    vec![
        Fingerprint {
            version: "2.0",
            keys: vec![
                ("has_suppression", Flag(false)),
                ("has_exclusive_groups", Flag(false)),
                ("has_cod_subtypes", Flag(false)),
                ("exchange_bad_cp", Number(-50.0)),
                ("prophylaxis_trigger", Number(0.1)),
                ("sacrifice_eval_tolerance", Number(0.8)),
                ("tension_contact_trigger", Number(0.05)),
                ("first_choice_margin_cp", Number(50.0)),
            ],
        },
        Fingerprint {
            version: "2.1",
            keys: vec![
                ("has_suppression", Flag(false)),
                ("has_exclusive_groups", Flag(true)),
                ("has_cod_subtypes", Flag(true)),
                ("exchange_bad_cp", Number(-30.0)),
                ("prophylaxis_trigger", Number(0.08)),
                ("sacrifice_eval_tolerance", Number(0.6)),
                ("tension_contact_trigger", Number(0.04)),
                ("first_choice_margin_cp", Number(50.0)),
            ],
        },
        current_fingerprint(),
    ]
});

fn current_fingerprint() -> Fingerprint {
    use Signature::{Flag, Number};
    Fingerprint {
        version: TAGGER_VERSION,
        keys: vec![
            ("has_suppression", Flag(true)),
            ("has_exclusive_groups", Flag(true)),
            ("has_cod_subtypes", Flag(true)),
            ("exchange_bad_cp", Number(f64::from(EXCHANGE_BAD_CP))),
            ("prophylaxis_trigger", Number(PROPHYLAXIS_TRIGGER)),
            ("sacrifice_eval_tolerance", Number(SACRIFICE_EVAL_TOLERANCE)),
            ("tension_contact_trigger", Number(TENSION_CONTACT_TRIGGER)),
            ("first_choice_margin_cp", Number(f64::from(FIRST_CHOICE_MARGIN_CP))),
        ],
    }
}

pub fn fingerprints() -> &'static [Fingerprint] {
    &FINGERPRINTS
}

/// Best fingerprint match for a metadata record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionMatch {
    pub version: String,
    pub confidence: f64,
}

impl VersionMatch {
    pub fn is_known(&self) -> bool {
        self.version != UNKNOWN_VERSION
    }
}

/// Attribute `metadata` to a released version; ties go to the newer one
pub fn detect_version(metadata: &Map<String, Value>) -> VersionMatch {
    let mut best: Option<(&Fingerprint, f64)> = None;
    for fingerprint in fingerprints() {
        let score = fingerprint.score(metadata);
        if best.map_or(true, |(_, top)| score >= top) {
            best = Some((fingerprint, score));
        }
    }

    match best {
        Some((fingerprint, score)) if score >= MIN_FINGERPRINT_CONFIDENCE => VersionMatch {
            version: fingerprint.version.to_string(),
            confidence: score,
        },
        Some((_, score)) => {
            tracing::debug!(score, "no fingerprint above the confidence floor");
            VersionMatch {
                version: UNKNOWN_VERSION.to_string(),
                confidence: score,
            }
        }
        None => VersionMatch {
            version: UNKNOWN_VERSION.to_string(),
            confidence: 0.0,
        },
    }
}

/// Signature of the running tagger, stored next to each result
pub fn current_metadata() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("version".to_string(), Value::String(TAGGER_VERSION.to_string()));
    for (key, signature) in current_fingerprint().keys {
        metadata.insert(key.to_string(), signature.to_value());
    }
    metadata
}
