//! Local heuristic evaluator used in degraded mode
//!
//! When every remote spot fails (or none is enabled) the router can still
//! answer with a shallow, material-and-placement estimate computed in
//! process. The result is shaped exactly like a backend result so callers
//! never need to special-case it.
//!
//! ## Scoring
//!
//! - Material: 100/300/300/500/900 centipawns
//! - Placement: piece-square tables (see [`pst`])
//! - `depth >= 2`: the opponent's best single reply is subtracted (2-ply)
//! - Checkmate after the move scores `Mate(1)`, stalemate scores 0

use shakmaty::fen::Fen;
use shakmaty::{Board, CastlingMode, Chess, Color, Move, Position};

use crate::error::{RouterError, RouterResult};
use crate::evaluation::{EvaluationLine, EvaluationResult, Score, MATE_CP};

pub mod pst;

/// Degraded-mode evaluator contract
pub trait LocalEvaluator: Send + Sync {
    fn analyze_legal_moves(&self, fen: &str, depth: u32, multipv: u32) -> RouterResult<EvaluationResult>;
}

/// Material plus piece-square-table evaluator over the legal moves
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialHeuristic;

impl MaterialHeuristic {
    pub fn new() -> Self {
        Self
    }
}

/// Parse a FEN into a playable position
pub fn parse_position(fen: &str) -> RouterResult<Chess> {
    let invalid = |reason: String| RouterError::InvalidPosition {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

/// Static evaluation of `board` from `perspective`'s point of view
pub fn static_eval(board: &Board, perspective: Color) -> i32 {
    let mut white = 0;
    for square in board.occupied() {
        if let Some(piece) = board.piece_at(square) {
            let value = pst::role_value(piece.role) + pst::pst_value(piece.role, piece.color, square);
            white += match piece.color {
                Color::White => value,
                Color::Black => -value,
            };
        }
    }
    match perspective {
        Color::White => white,
        Color::Black => -white,
    }
}

fn play(pos: &Chess, m: &Move) -> Chess {
    let mut next = pos.clone();
    next.play_unchecked(m);
    next
}

/// Score after `m` from the mover's perspective, in centipawns
fn score_move(pos: &Chess, m: &Move, depth: u32) -> i32 {
    let mover = pos.turn();
    let after = play(pos, m);

    if after.is_checkmate() {
        return MATE_CP - 1;
    }
    if after.is_stalemate() {
        return 0;
    }
    if depth < 2 {
        return static_eval(after.board(), mover);
    }

    // Opponent picks the reply that is worst for the mover
    after
        .legal_moves()
        .iter()
        .map(|reply| {
            let next = play(&after, reply);
            if next.is_checkmate() {
                -(MATE_CP - 1)
            } else {
                static_eval(next.board(), mover)
            }
        })
        .min()
        .unwrap_or_else(|| static_eval(after.board(), mover))
}

fn to_score(cp: i32) -> Score {
    if cp >= MATE_CP - 2 {
        Score::Mate(MATE_CP - cp)
    } else if cp <= -(MATE_CP - 2) {
        Score::Mate(-(MATE_CP + cp))
    } else {
        Score::Cp(cp)
    }
}

impl LocalEvaluator for MaterialHeuristic {
    fn analyze_legal_moves(&self, fen: &str, depth: u32, multipv: u32) -> RouterResult<EvaluationResult> {
        let pos = parse_position(fen)?;
        let mut scored: Vec<(i32, String)> = pos
            .legal_moves()
            .iter()
            .map(|m| {
                let uci = m.to_uci(CastlingMode::Standard).to_string();
                (score_move(&pos, m, depth), uci)
            })
            .collect();

        if scored.is_empty() {
            return Err(RouterError::Fallback {
                message: "position has no legal moves".to_string(),
            });
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        let lines = scored
            .into_iter()
            .take(multipv.max(1) as usize)
            .enumerate()
            .map(|(idx, (cp, uci))| EvaluationLine::new(idx as u32 + 1, to_score(cp), vec![uci]))
            .collect();
        Ok(EvaluationResult::new(lines))
    }
}
