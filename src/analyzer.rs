//! Routed evaluation feeding the move tagger
//!
//! Tagging one move needs two evaluations: the position before the move,
//! for the candidate list, and the position after it, for the played-move
//! score. Both go through the [`EvalRouter`], so either may be served by a
//! remote spot or by the local fallback.

use std::sync::Arc;

use engine_router::{EvalRouter, EvaluationResult, RoutedEvaluation, ServedBy};
use move_tagger::builder::{parse_fen, parse_uci, play};
use move_tagger::{FeatureBuilder, TagEngine, TagResult};
use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::{EnPassantMode, Position};
use tracing::{debug, info};

use crate::error::AnalysisResult;
use crate::settings::Settings;

/// Resolved tags plus where each evaluation came from
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedMove {
    pub tags: TagResult,
    pub before_served_by: ServedBy,
    /// `None` when the move ended the game and no evaluation was needed
    pub after_served_by: Option<ServedBy>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

pub struct MoveAnalyzer {
    router: Arc<EvalRouter>,
    tagger: TagEngine,
    depth: u32,
    multipv: u32,
}

impl MoveAnalyzer {
    pub fn new(router: Arc<EvalRouter>, settings: &Settings) -> Self {
        Self {
            router,
            tagger: TagEngine::new(),
            depth: settings.depth,
            multipv: settings.multipv.max(1),
        }
    }

    /// Replace the detector registry, e.g. one with families disabled
    pub fn with_tagger(mut self, tagger: TagEngine) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn router(&self) -> &Arc<EvalRouter> {
        &self.router
    }

    pub async fn evaluate(&self, fen: &str, depth: u32, multipv: u32) -> AnalysisResult<RoutedEvaluation> {
        Ok(self.router.analyze(fen, depth, multipv).await?)
    }

    /// Evaluate both sides of `uci` and tag it
    pub async fn tag_move(&self, fen: &str, uci: &str) -> AnalysisResult<AnalyzedMove> {
        let pos = parse_fen(fen)?;
        let m = parse_uci(&pos, uci)?;
        let next = play(&pos, &m);

        let before = self.router.analyze(fen, self.depth, self.multipv).await?;

        let (after_result, after_served_by) = if next.is_checkmate() || next.is_stalemate() {
            debug!(uci, "move ends the game, skipping the reply evaluation");
            (EvaluationResult::default(), None)
        } else {
            let after_fen = Fen::from_position(next, EnPassantMode::Legal).to_string();
            let after = self.router.analyze(&after_fen, self.depth, 1).await?;
            (after.result, Some(after.served_by))
        };

        let ctx = FeatureBuilder::new(self.depth, self.multipv).build(
            fen,
            uci,
            &before.result,
            &after_result,
        )?;
        let tags = self.tagger.tag(&ctx);

        info!(
            uci,
            served_by = %before.served_by,
            fired = tags.fired_tags().len(),
            quality = ?tags.quality,
            "move tagged"
        );

        Ok(AnalyzedMove {
            tags,
            before_served_by: before.served_by,
            after_served_by,
            metadata: move_tagger::current_metadata(),
        })
    }
}
