//! Evaluation result types shared by every backend
//!
//! Scores are always expressed from the point of view of the side to move in
//! the analysed position, the same convention UCI engines use.

use serde::{Deserialize, Serialize};

/// Centipawn value used to encode a forced mate as a plain integer
pub const MATE_CP: i32 = 10_000;

/// Longest mate distance accepted from a backend
pub const MAX_MATE_DISTANCE: i32 = 500;

/// Engine score for one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    /// Centipawns
    Cp(i32),
    /// Moves to mate; negative when the side to move is getting mated
    Mate(i32),
}

impl Score {
    /// Centipawn score from a wire value, clamped to `±MATE_CP`
    pub fn from_cp(value: i64) -> Self {
        let bound = i64::from(MATE_CP);
        Score::Cp(value.clamp(-bound, bound) as i32)
    }

    /// Mate score from a wire value, clamped to `±MAX_MATE_DISTANCE`
    pub fn from_mate(value: i64) -> Self {
        let bound = i64::from(MAX_MATE_DISTANCE);
        Score::Mate(value.clamp(-bound, bound) as i32)
    }

    /// The same score with both variants held to their wire ranges
    pub fn bounded(self) -> Self {
        match self {
            Score::Cp(cp) => Score::from_cp(i64::from(cp)),
            Score::Mate(n) => Score::from_mate(i64::from(n)),
        }
    }

    /// Collapse the score into centipawns, mapping mates near `±MATE_CP`
    ///
    /// The result always lies in `[-MATE_CP, MATE_CP]`.
    pub fn as_cp(self) -> i32 {
        match self.bounded() {
            Score::Cp(cp) => cp,
            Score::Mate(0) => -MATE_CP,
            Score::Mate(n) if n > 0 => MATE_CP - n,
            Score::Mate(n) => -MATE_CP - n,
        }
    }

    /// Same score seen from the other side
    pub fn negate(self) -> Self {
        match self {
            Score::Cp(cp) => Score::Cp(cp.saturating_neg()),
            Score::Mate(n) => Score::Mate(n.saturating_neg()),
        }
    }

    pub fn is_mate(self) -> bool {
        matches!(self, Score::Mate(_))
    }
}

/// One principal variation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationLine {
    /// 1-based rank, 1 is the best line
    pub rank: u32,
    pub score: Score,
    /// Coordinate (UCI) moves, first move first
    pub moves: Vec<String>,
}

impl EvaluationLine {
    pub fn new(rank: u32, score: Score, moves: Vec<String>) -> Self {
        Self { rank, score, moves }
    }

    pub fn first_move(&self) -> Option<&str> {
        self.moves.first().map(String::as_str)
    }
}

/// Ordered set of principal variations
///
/// Ranks are contiguous starting at 1 and sorted ascending. The constructor
/// enforces this so every consumer can rely on `lines[0]` being the best line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EvaluationResult {
    lines: Vec<EvaluationLine>,
}

impl EvaluationResult {
    /// Build a result from lines in any order, renumbering ranks from 1
    pub fn new(mut lines: Vec<EvaluationLine>) -> Self {
        lines.sort_by_key(|line| line.rank);
        for (idx, line) in lines.iter_mut().enumerate() {
            line.rank = idx as u32 + 1;
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[EvaluationLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<EvaluationLine> {
        self.lines
    }

    pub fn best(&self) -> Option<&EvaluationLine> {
        self.lines.first()
    }

    pub fn best_move(&self) -> Option<&str> {
        self.best().and_then(EvaluationLine::first_move)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check the rank invariant; used by tests and debug assertions
    pub fn ranks_are_contiguous(&self) -> bool {
        self.lines
            .iter()
            .enumerate()
            .all(|(idx, line)| line.rank == idx as u32 + 1)
    }
}
