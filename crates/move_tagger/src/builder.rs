//! Construction of [`TagContext`] snapshots
//!
//! Inputs are the position before the move, the move in UCI notation and two
//! engine analyses: one of the position before the move (the candidates) and
//! one of the position after it (the reply). Engine scores are side-to-move,
//! so the after-analysis is negated to express it from the mover's side.

use engine_router::{EvaluationResult, MATE_CP};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, Move, Position};
use tracing::debug;

use crate::context::{Candidate, EngineParams, MoveKind, PlayedMove, TagContext};
use crate::error::{TagError, TaggerResult};
use crate::features::{self, Metrics, Phase};

/// Parse a FEN into a playable position
pub fn parse_fen(fen: &str) -> TaggerResult<Chess> {
    let invalid = |reason: String| TagError::InvalidPosition {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

/// Resolve a UCI move against `pos`
pub fn parse_uci(pos: &Chess, uci: &str) -> TaggerResult<Move> {
    let invalid = |reason: String| TagError::InvalidMove {
        uci: uci.to_string(),
        reason,
    };
    let parsed = UciMove::from_ascii(uci.trim().as_bytes()).map_err(|e| invalid(format!("{e}")))?;
    parsed.to_move(pos).map_err(|e| invalid(format!("{e}")))
}

/// Position after `m`
pub fn play(pos: &Chess, m: &Move) -> Chess {
    let mut next = pos.clone();
    next.play_unchecked(m);
    next
}

fn pawns(cp: i32) -> f64 {
    f64::from(cp) / 100.0
}

/// Builds [`TagContext`] snapshots
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    engine: EngineParams,
}

impl FeatureBuilder {
    pub fn new(depth: u32, multipv: u32) -> Self {
        Self {
            engine: EngineParams { depth, multipv },
        }
    }

    /// `after` may be empty when the move ends the game
    pub fn build(
        &self,
        fen: &str,
        uci: &str,
        before: &EvaluationResult,
        after: &EvaluationResult,
    ) -> TaggerResult<TagContext> {
        let pos = parse_fen(fen)?;
        let m = parse_uci(&pos, uci)?;
        let mover = pos.turn();
        let next = play(&pos, &m);

        let candidates = candidates(&pos, before);
        let best = before.best().ok_or_else(|| TagError::MissingEvaluation {
            what: "analysis of the position before the move".to_string(),
        })?;
        let eval_best_cp = candidates
            .first()
            .map(|c| c.score_cp)
            .unwrap_or_else(|| best.score.as_cp());
        let eval_before_cp = best.score.as_cp();
        let eval_played_cp = played_score(&next, after)?;
        let delta_eval_cp = eval_played_cp.saturating_sub(eval_best_cp);

        let played = played_move(&pos, &next, &m, uci);

        let material_before = features::material_balance(pos.board(), mover);
        let material_after = material_after_reply(&next, after, mover);

        let self_before = Metrics::compute(pos.board(), mover);
        let opp_before = Metrics::compute(pos.board(), !mover);
        let self_after = Metrics::compute(next.board(), mover);
        let opp_after = Metrics::compute(next.board(), !mover);

        let phase_ratio = features::phase_ratio(pos.board());
        let phase = Phase::classify(pos.fullmoves().get(), phase_ratio);

        let contact_before = features::contact_ratio(pos.board());
        let contact_after = features::contact_ratio(next.board());

        let spread = match candidates.as_slice() {
            [first, second, ..] => {
                let gap = first.score_cp.saturating_sub(second.score_cp).saturating_abs();
                (f64::from(gap) / 1000.0).min(0.2)
            }
            _ => 0.0,
        };
        let check = if played.gives_check { 1.0 } else { 0.0 };
        let tactical_weight = (0.5 * self_after.tactics.max(opp_after.tactics)
            + 0.3 * contact_after
            + 0.2 * check
            + spread)
            .clamp(0.0, 1.0);

        Ok(TagContext {
            legal_move_count: pos.legal_moves().len(),
            in_check_before: pos.is_check(),
            board_before: pos,
            board_after: next,
            mover,
            played,
            candidates,
            eval_before: pawns(eval_before_cp),
            eval_played: pawns(eval_played_cp),
            eval_best: pawns(eval_best_cp),
            delta_eval: pawns(delta_eval_cp),
            eval_before_cp,
            eval_played_cp,
            eval_best_cp,
            delta_eval_cp,
            material_before,
            material_after,
            material_delta: material_after - material_before,
            self_delta: self_after.delta(&self_before),
            opp_delta: opp_after.delta(&opp_before),
            self_before,
            self_after,
            opp_before,
            opp_after,
            phase,
            phase_ratio,
            contact_before,
            contact_after,
            contact_delta: contact_after - contact_before,
            tactical_weight,
            engine: self.engine,
        })
    }
}

fn candidates(pos: &Chess, before: &EvaluationResult) -> Vec<Candidate> {
    before
        .lines()
        .iter()
        .filter_map(|line| {
            let uci = line.first_move()?;
            match parse_uci(pos, uci) {
                Ok(m) => Some(Candidate {
                    uci: uci.to_string(),
                    score_cp: line.score.as_cp(),
                    kind: MoveKind::classify(pos, &m),
                }),
                Err(err) => {
                    debug!(rank = line.rank, error = %err, "skipping illegal candidate");
                    None
                }
            }
        })
        .collect()
}

/// Mover-perspective score of the position after the played move
fn played_score(next: &Chess, after: &EvaluationResult) -> TaggerResult<i32> {
    if next.is_checkmate() {
        return Ok(MATE_CP - 1);
    }
    if next.is_stalemate() {
        return Ok(0);
    }
    after
        .best()
        .map(|line| line.score.negate().as_cp())
        .ok_or_else(|| TagError::MissingEvaluation {
            what: "analysis of the position after the move".to_string(),
        })
}

/// Material balance once the opponent's best reply (if known and legal) is played
fn material_after_reply(next: &Chess, after: &EvaluationResult, mover: Color) -> f64 {
    let reply = after
        .best_move()
        .and_then(|uci| parse_uci(next, uci).ok());
    match reply {
        Some(reply) => features::material_balance(play(next, &reply).board(), mover),
        None => features::material_balance(next.board(), mover),
    }
}

fn played_move(pos: &Chess, next: &Chess, m: &Move, uci: &str) -> PlayedMove {
    let from_rank = m.from().map(|sq| sq as u8 / 8).unwrap_or(0);
    let from_relative_rank = match pos.turn() {
        Color::White => from_rank + 1,
        Color::Black => 8 - from_rank,
    };
    let suffix = if next.is_checkmate() {
        "#"
    } else if next.is_check() {
        "+"
    } else {
        ""
    };
    PlayedMove {
        uci: uci.trim().to_string(),
        san: format!("{}{suffix}", San::from_move(pos, m)),
        role: m.role(),
        captured: m.capture(),
        promotion: m.promotion(),
        from_relative_rank,
        gives_check: next.is_check(),
        kind: MoveKind::classify(pos, m),
    }
}
