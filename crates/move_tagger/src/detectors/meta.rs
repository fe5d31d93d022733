//! Accuracy and decision-making tags

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::gate::{full_confidence, Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{
    BEST_MOVE_SLACK, CONVERSION_EVAL, CONVERSION_MAX_LOSS, FIRST_CHOICE_MARGIN_CP,
    MISSED_TACTIC_LOSS, PANIC_LOSS, PANIC_THREAT, RECOVERY_GAIN, RECOVERY_LOSING,
    RISK_CONCESSION,
};

fn has_candidates(ctx: &TagContext) -> GateResult {
    Ok(!ctx.candidates.is_empty())
}

fn played_is_best(ctx: &TagContext) -> GateResult {
    Ok(ctx.played_is_best())
}

fn played_not_best(ctx: &TagContext) -> GateResult {
    Ok(!ctx.played_is_best())
}

/// Always listed after `has_candidates`; an empty list simply fails
fn best_is_forcing(ctx: &TagContext) -> GateResult {
    Ok(ctx.best_candidate().is_some_and(|best| best.kind.is_forcing()))
}

fn large_loss(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() <= -MISSED_TACTIC_LOSS)
}

fn winning_before(ctx: &TagContext) -> GateResult {
    Ok(ctx.eval_before >= CONVERSION_EVAL)
}

fn precise(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() >= CONVERSION_MAX_LOSS)
}

fn simplifying_or_forcing(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.is_capture() || ctx.played.gives_check || ctx.contact_delta < 0.0)
}

fn under_threat(ctx: &TagContext) -> GateResult {
    Ok(ctx.in_check_before || ctx.opp_before.tactics >= PANIC_THREAT)
}

fn panic_loss(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() <= PANIC_LOSS)
}

fn losing_before(ctx: &TagContext) -> GateResult {
    Ok(ctx.eval_before <= RECOVERY_LOSING)
}

fn recovers(ctx: &TagContext) -> GateResult {
    Ok(ctx.eval_played - ctx.eval_before >= RECOVERY_GAIN)
}

fn played_quiet(ctx: &TagContext) -> GateResult {
    Ok(!ctx.played.kind.is_forcing())
}

fn small_concession(ctx: &TagContext) -> GateResult {
    let loss = ctx.loss();
    Ok(loss >= RISK_CONCESSION && loss < BEST_MOVE_SLACK)
}

fn single_legal_move(ctx: &TagContext) -> GateResult {
    Ok(ctx.legal_move_count == 1)
}

/// 0.6 with no second candidate to compare against
fn first_choice_confidence(ctx: &TagContext) -> f64 {
    let gap = ctx
        .candidate_gap_cp()
        .map_or(0, |gap| gap.clamp(0, FIRST_CHOICE_MARGIN_CP));
    0.6 + f64::from(gap) / 125.0
}

fn missed_confidence(ctx: &TagContext) -> f64 {
    0.6 + (-ctx.loss() - MISSED_TACTIC_LOSS) / 5.0
}

fn conversion_confidence(ctx: &TagContext) -> f64 {
    0.6 + (ctx.eval_before - CONVERSION_EVAL) / 10.0
}

fn panic_confidence(ctx: &TagContext) -> f64 {
    0.6 + (PANIC_LOSS - ctx.loss()) / 5.0
}

fn recovery_confidence(ctx: &TagContext) -> f64 {
    0.5 + (ctx.eval_played - ctx.eval_before - RECOVERY_GAIN) / 4.0
}

fn risk_confidence(ctx: &TagContext) -> f64 {
    0.7 + ctx.loss()
}

fn meta_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "played" => ctx.played.uci.as_str(),
        "best_move" => ctx.best_move(),
        "delta_eval_cp" => ctx.delta_eval_cp,
        "candidate_gap_cp" => ctx.candidate_gap_cp(),
        "legal_moves" => ctx.legal_move_count,
    }
}

const CANDIDATES: Gate = Gate::new("has_candidates", has_candidates);
const BEST_FORCING: Gate = Gate::new("best_is_forcing", best_is_forcing);

const FIRST_CHOICE_GATES: &[Gate] = &[CANDIDATES, Gate::new("played_is_best", played_is_best)];
const MISSED_GATES: &[Gate] = &[
    CANDIDATES,
    BEST_FORCING,
    Gate::new("played_not_best", played_not_best),
    Gate::new("large_loss", large_loss),
];
const CONVERSION_GATES: &[Gate] = &[
    Gate::new("winning_before", winning_before),
    Gate::new("precise", precise),
    Gate::new("simplifying_or_forcing", simplifying_or_forcing),
];
const PANIC_GATES: &[Gate] = &[
    Gate::new("under_threat", under_threat),
    Gate::new("panic_loss", panic_loss),
];
const RECOVERY_GATES: &[Gate] = &[
    Gate::new("losing_before", losing_before),
    Gate::new("recovers", recovers),
];
const RISK_GATES: &[Gate] = &[
    CANDIDATES,
    BEST_FORCING,
    Gate::new("played_quiet", played_quiet),
    Gate::new("small_concession", small_concession),
];
const FORCED_GATES: &[Gate] = &[Gate::new("single_legal_move", single_legal_move)];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::FirstChoice, FIRST_CHOICE_GATES, first_choice_confidence, meta_evidence),
    Detector::new(Tag::MissedTactic, MISSED_GATES, missed_confidence, meta_evidence),
    Detector::new(Tag::ConversionPrecision, CONVERSION_GATES, conversion_confidence, meta_evidence),
    Detector::new(Tag::PanicMove, PANIC_GATES, panic_confidence, meta_evidence),
    Detector::new(Tag::TacticalRecovery, RECOVERY_GATES, recovery_confidence, meta_evidence),
    Detector::new(Tag::RiskAvoidance, RISK_GATES, risk_confidence, meta_evidence),
    Detector::new(Tag::ForcedMove, FORCED_GATES, full_confidence, meta_evidence),
];
