//! Response decoding for the engine spot wire formats
//!
//! Two shapes reach the client:
//!
//! - a single JSON document `{"pvs": [{"moves": "e2e4 e7e5", "cp": 35}, ...]}`
//! - a line-oriented stream of UCI `info` lines, e.g.
//!   `info depth 18 multipv 2 score cp -12 nodes 81234 pv d2d4 d7d5`
//!
//! The stream is decoded by [`StreamAccumulator`], an explicit state machine:
//! bytes are pushed as they arrive, complete lines are parsed, and the most
//! recent line per `multipv` index wins. Finishing an accumulator that never
//! saw a usable line is an error, never an empty success.
//!
//! Scores are clamped on the way in: centipawns to `±MATE_CP`, mate
//! distances to `±MAX_MATE_DISTANCE`. A partial line longer than
//! [`MAX_LINE_BYTES`] is dropped up to its next newline.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::evaluation::{EvaluationLine, EvaluationResult, Score};

/// Longest unterminated line the accumulator buffers
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Decode a single JSON evaluation document
///
/// Individual pvs that are missing moves or a numeric score are skipped. The
/// whole document fails when it is not an object with a `pvs` array, or when
/// no pv survives.
pub fn parse_json_document(body: &[u8]) -> BackendResult<EvaluationResult> {
    let doc: Value = serde_json::from_slice(body)
        .map_err(|e| BackendError::failure(format!("malformed JSON response: {e}")))?;

    let pvs = doc
        .as_object()
        .and_then(|obj| obj.get("pvs"))
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::failure("response has no 'pvs' array"))?;

    let mut lines = Vec::with_capacity(pvs.len());
    for (idx, pv) in pvs.iter().enumerate() {
        match parse_json_pv(pv) {
            Some((score, moves)) => lines.push(EvaluationLine::new(idx as u32 + 1, score, moves)),
            None => debug!(index = idx, "skipping unparsable pv entry"),
        }
    }

    if lines.is_empty() {
        return Err(BackendError::failure("no usable pv in response"));
    }
    Ok(EvaluationResult::new(lines))
}

fn parse_json_pv(pv: &Value) -> Option<(Score, Vec<String>)> {
    let moves: Vec<String> = match pv.get("moves")? {
        Value::String(s) => s.split_whitespace().map(str::to_owned).collect(),
        Value::Array(items) => items
            .iter()
            .map(|m| m.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    if moves.is_empty() {
        return None;
    }

    let score = if let Some(mate) = pv.get("mate").and_then(Value::as_i64) {
        Score::from_mate(mate)
    } else {
        Score::from_cp(pv.get("cp")?.as_i64()?)
    };
    Some((score, moves))
}

/// Accumulates a streamed UCI `info` response into an [`EvaluationResult`]
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    /// Bytes of a line that has not been terminated yet
    pending: Vec<u8>,
    /// Latest line per multipv index
    lines: BTreeMap<u32, (Score, Vec<String>)>,
    skipped: usize,
    /// Inside an oversized line; bytes are dropped until the next newline
    discarding: bool,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes; complete lines are parsed immediately
    pub fn push(&mut self, chunk: &[u8]) {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos + 1);
            rest = tail;
            if self.discarding {
                self.discarding = false;
                continue;
            }
            if self.pending.len() + head.len() > MAX_LINE_BYTES {
                self.drop_line(self.pending.len() + head.len());
                self.discarding = false;
                continue;
            }
            self.pending.extend_from_slice(head);
            let line = std::mem::take(&mut self.pending);
            self.consume_line(&line);
        }

        if self.discarding {
            return;
        }
        if self.pending.len() + rest.len() > MAX_LINE_BYTES {
            self.drop_line(self.pending.len() + rest.len());
        } else {
            self.pending.extend_from_slice(rest);
        }
    }

    fn drop_line(&mut self, bytes: usize) {
        debug!(bytes, limit = MAX_LINE_BYTES, "dropping oversized stream line");
        self.pending.clear();
        self.discarding = true;
        self.skipped += 1;
    }

    /// Number of distinct multipv indices seen so far
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of lines that carried no usable score/pv
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Flush the trailing partial line and build the final result
    pub fn finish(mut self) -> BackendResult<EvaluationResult> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.consume_line(&rest);
        }
        if self.lines.is_empty() {
            return Err(BackendError::failure(
                "stream ended without a usable line",
            ));
        }
        let lines = self
            .lines
            .into_iter()
            .map(|(index, (score, moves))| EvaluationLine::new(index, score, moves))
            .collect();
        Ok(EvaluationResult::new(lines))
    }

    fn consume_line(&mut self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match parse_info_line(text) {
            Some((index, score, moves)) => {
                self.lines.insert(index, (score, moves));
            }
            None => {
                self.skipped += 1;
                debug!(line = text, "skipping stream line without score or pv");
            }
        }
    }
}

/// Parse one `info ... multipv N score (cp|mate) V ... pv <moves>` line
///
/// Lines without `multipv` belong to index 1. Lower/upper bound markers are
/// accepted and ignored.
pub fn parse_info_line(line: &str) -> Option<(u32, Score, Vec<String>)> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }

    let mut index = 1u32;
    let mut score = None;
    let mut moves = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            "multipv" => index = tokens.next()?.parse().ok()?,
            "score" => {
                let kind = tokens.next()?;
                let value: i64 = tokens.next()?.parse().ok()?;
                score = Some(match kind {
                    "cp" => Score::from_cp(value),
                    "mate" => Score::from_mate(value),
                    _ => return None,
                });
            }
            "pv" => {
                moves.extend(tokens.by_ref().map(str::to_owned));
            }
            _ => {}
        }
    }

    if index == 0 || moves.is_empty() {
        return None;
    }
    Some((index, score?, moves))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{MATE_CP, MAX_MATE_DISTANCE};

    #[test]
    fn test_json_document_with_cp_and_mate() {
        let body = br#"{"pvs": [
            {"moves": "e2e4 e7e5 g1f3", "cp": 35},
            {"moves": "d1h5", "mate": 2}
        ]}"#;
        let result = parse_json_document(body).expect("Should parse");

        assert_eq!(result.len(), 2);
        assert_eq!(result.lines()[0].score, Score::Cp(35));
        assert_eq!(result.lines()[0].moves, vec!["e2e4", "e7e5", "g1f3"]);
        assert_eq!(result.lines()[1].score, Score::Mate(2));
    }

    #[test]
    fn test_json_document_skips_bad_pv() {
        let body = br#"{"pvs": [
            {"moves": "e2e4", "cp": "lots"},
            {"cp": 20},
            {"moves": ["d2d4", "d7d5"], "cp": 12}
        ]}"#;
        let result = parse_json_document(body).expect("one pv should survive");

        assert_eq!(result.len(), 1);
        assert_eq!(result.best_move(), Some("d2d4"));
        assert_eq!(result.lines()[0].rank, 1);
    }

    #[test]
    fn test_json_document_without_pvs_fails() {
        assert!(parse_json_document(br#"{"depth": 20}"#).is_err());
        assert!(parse_json_document(br#"[1, 2, 3]"#).is_err());
        assert!(parse_json_document(b"not json").is_err());
        assert!(parse_json_document(br#"{"pvs": [{"cp": 1}]}"#).is_err());
    }

    #[test]
    fn test_info_line_parsing() {
        let parsed =
            parse_info_line("info depth 20 seldepth 28 multipv 2 score cp -15 nodes 100 pv d2d4 g8f6")
                .expect("Should parse");
        assert_eq!(parsed.0, 2);
        assert_eq!(parsed.1, Score::Cp(-15));
        assert_eq!(parsed.2, vec!["d2d4", "g8f6"]);

        let mate = parse_info_line("info depth 5 score mate -3 lowerbound pv e1e2").expect("mate");
        assert_eq!(mate.0, 1);
        assert_eq!(mate.1, Score::Mate(-3));

        assert!(parse_info_line("info depth 12 currmove e2e4").is_none());
        assert!(parse_info_line("bestmove e2e4 ponder e7e5").is_none());
        assert!(parse_info_line("info multipv 1 score cp 10").is_none());
    }

    #[test]
    fn test_accumulator_keeps_latest_per_index_across_chunks() {
        let mut acc = StreamAccumulator::new();
        acc.push(b"info depth 10 multipv 1 score cp 20 pv e2e4\ninfo depth 10 mul");
        acc.push(b"tipv 2 score cp 5 pv d2d4\ninfo string hello\n");
        acc.push(b"info depth 12 multipv 1 score cp 31 pv e2e4 e7e5\n");
        acc.push(b"bestmove e2e4");

        assert_eq!(acc.line_count(), 2);
        let result = acc.finish().expect("Should finish");

        assert_eq!(result.len(), 2);
        assert_eq!(result.lines()[0].score, Score::Cp(31));
        assert_eq!(result.lines()[0].moves, vec!["e2e4", "e7e5"]);
        assert_eq!(result.lines()[1].score, Score::Cp(5));
    }

    #[test]
    fn test_accumulator_without_usable_lines_is_error() {
        let mut acc = StreamAccumulator::new();
        acc.push(b"info depth 1 currmove e2e4\ninfo string warming up\n");
        assert_eq!(acc.skipped(), 2);
        assert!(acc.finish().is_err());
    }

    #[test]
    fn test_extreme_scores_are_clamped() {
        let body = br#"{"pvs": [
            {"moves": "e2e4", "cp": -2147483648},
            {"moves": "d2d4", "cp": 2147483647},
            {"moves": "g1f3", "cp": 99999999999},
            {"moves": "d1h5", "mate": -2147483648}
        ]}"#;
        let result = parse_json_document(body).expect("Should parse");
        let scores: Vec<Score> = result.lines().iter().map(|l| l.score).collect();
        assert_eq!(
            scores,
            vec![
                Score::Cp(-MATE_CP),
                Score::Cp(MATE_CP),
                Score::Cp(MATE_CP),
                Score::Mate(-MAX_MATE_DISTANCE),
            ]
        );

        let line = parse_info_line("info multipv 1 score cp -2147483648 pv e2e4").expect("parses");
        assert_eq!(line.1, Score::Cp(-MATE_CP));
        let line = parse_info_line("info score mate 9000000000 pv e2e4").expect("parses");
        assert_eq!(line.1, Score::Mate(MAX_MATE_DISTANCE));
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut acc = StreamAccumulator::new();
        let junk = vec![b'x'; 40 * 1024];
        acc.push(&junk);
        acc.push(&junk);
        acc.push(&junk);
        acc.push(b"still junk\ninfo multipv 1 score cp 12 pv e2e4\n");

        assert_eq!(acc.skipped(), 1);
        let result = acc.finish().expect("valid line survives");
        assert_eq!(result.len(), 1);
        assert_eq!(result.lines()[0].score, Score::Cp(12));
        assert_eq!(result.best_move(), Some("e2e4"));
    }

    #[test]
    fn test_oversized_terminated_chunk_is_dropped() {
        let mut acc = StreamAccumulator::new();
        let mut chunk = vec![b'y'; MAX_LINE_BYTES + 1];
        chunk.extend_from_slice(b"\ninfo score cp 7 pv d2d4\n");
        acc.push(&chunk);

        assert_eq!(acc.skipped(), 1);
        let result = acc.finish().expect("valid line survives");
        assert_eq!(result.best_move(), Some("d2d4"));
    }

    #[test]
    fn test_accumulator_sorts_by_index() {
        let mut acc = StreamAccumulator::new();
        acc.push(b"info multipv 3 score cp 1 pv a2a3\n");
        acc.push(b"info multipv 1 score cp 9 pv e2e4\n");
        let result = acc.finish().expect("Should finish");

        assert_eq!(result.best_move(), Some("e2e4"));
        assert_eq!(result.lines()[1].first_move(), Some("a2a3"));
        assert_eq!(result.lines()[1].rank, 2);
    }
}
