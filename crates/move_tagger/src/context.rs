//! Immutable feature snapshot shared by every detector
//!
//! A [`TagContext`] is built once per (position, move) pair by
//! [`crate::builder::FeatureBuilder`] and then only read. Evaluations are
//! stored from the mover's point of view, in pawns and in centipawns.

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Move, Position, Role};

use crate::features::{Metrics, Phase};

/// Coarse move classification; check beats capture beats promotion beats castle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Quiet,
    Capture,
    Check,
    Promotion,
    Castle,
}

impl MoveKind {
    pub fn classify(pos: &Chess, m: &Move) -> MoveKind {
        let mut after = pos.clone();
        after.play_unchecked(m);
        if after.is_check() {
            MoveKind::Check
        } else if m.is_capture() {
            MoveKind::Capture
        } else if m.is_promotion() {
            MoveKind::Promotion
        } else if m.is_castle() {
            MoveKind::Castle
        } else {
            MoveKind::Quiet
        }
    }

    /// Checks, captures and promotions
    pub fn is_forcing(self) -> bool {
        matches!(self, MoveKind::Check | MoveKind::Capture | MoveKind::Promotion)
    }
}

/// The move under analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub uci: String,
    pub san: String,
    pub role: Role,
    pub captured: Option<Role>,
    pub promotion: Option<Role>,
    /// Rank of the origin square relative to the mover (1 = own back rank)
    pub from_relative_rank: u8,
    pub gives_check: bool,
    pub kind: MoveKind,
}

impl PlayedMove {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

/// One engine candidate from the before-position analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub uci: String,
    /// Mover's perspective
    pub score_cp: i32,
    pub kind: MoveKind,
}

/// Search parameters used to produce the candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    pub depth: u32,
    pub multipv: u32,
}

/// Feature snapshot of one move
#[derive(Debug, Clone)]
pub struct TagContext {
    pub board_before: Chess,
    pub board_after: Chess,
    pub mover: Color,
    pub played: PlayedMove,
    pub legal_move_count: usize,
    pub in_check_before: bool,
    /// Rank order, best first
    pub candidates: Vec<Candidate>,

    pub eval_before: f64,
    pub eval_played: f64,
    pub eval_best: f64,
    pub delta_eval: f64,
    pub eval_before_cp: i32,
    pub eval_played_cp: i32,
    pub eval_best_cp: i32,
    pub delta_eval_cp: i32,

    pub material_before: f64,
    pub material_after: f64,
    pub material_delta: f64,

    pub self_before: Metrics,
    pub self_after: Metrics,
    pub opp_before: Metrics,
    pub opp_after: Metrics,
    pub self_delta: Metrics,
    pub opp_delta: Metrics,

    pub phase: Phase,
    pub phase_ratio: f64,
    pub contact_before: f64,
    pub contact_after: f64,
    pub contact_delta: f64,
    pub tactical_weight: f64,
    pub engine: EngineParams,
}

impl TagContext {
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn best_move(&self) -> Option<&str> {
        self.best_candidate().map(|c| c.uci.as_str())
    }

    pub fn played_is_best(&self) -> bool {
        self.best_move() == Some(self.played.uci.as_str())
    }

    /// Evaluation loss of the played move in pawns (`<= 0` when worse than best)
    pub fn loss(&self) -> f64 {
        self.delta_eval
    }

    /// Score gap between the first and second candidates in centipawns
    pub fn candidate_gap_cp(&self) -> Option<i32> {
        match self.candidates.as_slice() {
            [first, second, ..] => Some(first.score_cp.saturating_sub(second.score_cp)),
            _ => None,
        }
    }

    pub fn moves_minor_piece(&self) -> bool {
        matches!(self.played.role, Role::Knight | Role::Bishop)
    }
}
