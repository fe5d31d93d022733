//! Detector thresholds, version 2.2
//!
//! These constants are the acceptance criteria for output parity with stored
//! analyses. Changing any of them requires a new entry in
//! [`crate::versioning`]. Values are in pawns unless the name ends in `_CP`.

/// Resolver version written next to every result
pub const TAGGER_VERSION: &str = "2.2";

// Exchange
pub const EXCHANGE_ACCURATE_CP: i32 = -10;
pub const EXCHANGE_BAD_CP: i32 = -30;

// Sacrifice
pub const SACRIFICE_MIN_LOSS: f64 = 0.5;
pub const SACRIFICE_EVAL_TOLERANCE: f64 = 0.6;
pub const DESPERATE_EVAL: f64 = -3.0;
pub const KING_ATTACK_DELTA: f64 = -0.1;
pub const TACTICAL_WEIGHT_HIGH: f64 = 0.5;
pub const COMBINATION_TACTICS_GAIN: f64 = 0.2;
/// Loss still counted as "the best move" when the candidates disagree
pub const BEST_MOVE_SLACK: f64 = -0.05;

// Prophylaxis
pub const PROPHYLAXIS_TRIGGER: f64 = 0.08;
pub const PROPHYLAXIS_DIRECT_MARGIN: f64 = 0.02;
pub const PROPHYLAXIS_SOFT_WEIGHT: f64 = 0.65;
pub const PROPHYLAXIS_SOFT_TACTICAL_CAP: f64 = 0.3;
pub const PROPHYLAXIS_MAX_TACTICAL: f64 = 0.6;
pub const PROPHYLAXIS_DROP: f64 = 0.5;

// Tension
pub const TENSION_EVAL_BAND: f64 = 1.5;
pub const TENSION_CONTACT_TRIGGER: f64 = 0.05;
pub const TENSION_CONTACT_NEUTRAL: f64 = 0.02;
pub const TENSION_MOBILITY_SYMMETRY: f64 = 0.3;
pub const TENSION_MAX_LOSS: f64 = -0.3;
pub const PREMATURE_ATTACK_LOSS: f64 = -0.5;

// Maneuver
pub const MANEUVER_QUALITY: f64 = 0.1;
pub const MANEUVER_MAX_LOSS: f64 = -0.3;

// Initiative
pub const INITIATIVE_EVAL: f64 = 0.5;
pub const INITIATIVE_TACTICS_EDGE: f64 = 0.1;
pub const INITIATIVE_PRESSURE: f64 = -0.05;
pub const INITIATIVE_KEEP_LOSS: f64 = -0.2;
pub const INITIATIVE_ATTEMPT_LOSS: f64 = -0.5;

// Structure
pub const STRUCTURE_CHANGE: f64 = 0.1;
pub const STRUCTURE_COMPENSATION: f64 = 0.1;

// Control over dynamics
pub const COD_OPP_RESTRICTION: f64 = -0.05;
pub const COD_MAX_LOSS: f64 = -0.2;
pub const COD_SUBTYPE_GAIN: f64 = 0.05;
pub const COD_FREEZE: f64 = -0.1;
pub const COD_TRADE_BALANCE: f64 = 0.5;

// Meta
pub const MISSED_TACTIC_LOSS: f64 = 1.0;
pub const CONVERSION_EVAL: f64 = 2.0;
pub const CONVERSION_MAX_LOSS: f64 = -0.1;
pub const PANIC_LOSS: f64 = -1.5;
pub const PANIC_THREAT: f64 = 0.5;
pub const RECOVERY_LOSING: f64 = -1.0;
pub const RECOVERY_GAIN: f64 = 1.0;
pub const RISK_CONCESSION: f64 = -0.3;
pub const FIRST_CHOICE_MARGIN_CP: i32 = 50;
