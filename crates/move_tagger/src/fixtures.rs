//! Shared test contexts

use engine_router::{EvaluationLine, EvaluationResult, Score};

use crate::builder::FeatureBuilder;
use crate::context::TagContext;

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Knight on c3 can take the bishop on e4
pub const KNIGHT_TAKES_BISHOP: &str = "rn1qkbnr/ppp1pppp/3p4/8/4b3/2N5/PPPPPPPP/R1BQKBNR w KQkq - 0 1";

pub fn analysis(lines: &[(i32, &str)]) -> EvaluationResult {
    EvaluationResult::new(
        lines
            .iter()
            .enumerate()
            .map(|(i, (cp, moves))| {
                EvaluationLine::new(
                    i as u32 + 1,
                    Score::Cp(*cp),
                    moves.split_whitespace().map(str::to_owned).collect(),
                )
            })
            .collect(),
    )
}

pub fn build(fen: &str, uci: &str, before: &[(i32, &str)], after: &[(i32, &str)]) -> TagContext {
    FeatureBuilder::new(14, 3)
        .build(fen, uci, &analysis(before), &analysis(after))
        .expect("fixture context should build")
}

/// Quiet developing move from the starting position, played = best, no loss
pub fn quiet() -> TagContext {
    build(START, "g1f3", &[(20, "g1f3"), (15, "e2e4")], &[(-20, "d7d5")])
}

/// Set the played-move loss in centipawns, keeping the pawn fields in sync
pub fn with_loss(mut ctx: TagContext, loss_cp: i32) -> TagContext {
    ctx.eval_played_cp = ctx.eval_best_cp + loss_cp;
    ctx.delta_eval_cp = loss_cp;
    ctx.eval_played = f64::from(ctx.eval_played_cp) / 100.0;
    ctx.delta_eval = f64::from(loss_cp) / 100.0;
    ctx
}
