//! Prophylaxis family
//!
//! A quiet move whose main effect is restricting the opponent. The preventive
//! score reads how much the opponent lost in mobility, tactics and central
//! control; the soft weight adds the mover's own king-safety and structure
//! gains on top of it.

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::gate::{finite, Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{
    PROPHYLAXIS_DIRECT_MARGIN, PROPHYLAXIS_DROP, PROPHYLAXIS_MAX_TACTICAL,
    PROPHYLAXIS_SOFT_TACTICAL_CAP, PROPHYLAXIS_SOFT_WEIGHT, PROPHYLAXIS_TRIGGER,
};

/// Opponent restriction signal in `[0, 1]`
pub fn preventive_score(ctx: &TagContext) -> f64 {
    let mobility = (-ctx.opp_delta.mobility).max(0.0) * 5.0;
    let tactics = (-ctx.opp_delta.tactics).max(0.0) * 5.0;
    let center = (-ctx.opp_delta.center_control).max(0.0) * 5.0;
    (0.5 * mobility + 0.3 * tactics + 0.2 * center).clamp(0.0, 1.0)
}

/// Preventive score plus the mover's own consolidation, in `[0, 1]`
pub fn soft_weight(ctx: &TagContext) -> f64 {
    (0.5 + 2.0 * ctx.self_delta.king_safety + ctx.self_delta.structure + preventive_score(ctx))
        .clamp(0.0, 1.0)
}

fn direct_condition(ctx: &TagContext) -> bool {
    preventive_score(ctx) >= PROPHYLAXIS_TRIGGER + PROPHYLAXIS_DIRECT_MARGIN
        || (soft_weight(ctx) >= PROPHYLAXIS_SOFT_WEIGHT
            && ctx.tactical_weight <= PROPHYLAXIS_SOFT_TACTICAL_CAP)
}

fn is_prophylaxis_candidate(ctx: &TagContext) -> GateResult {
    let weight = finite("is_prophylaxis_candidate", "tactical_weight", ctx.tactical_weight)?;
    Ok(!ctx.played.is_capture() && !ctx.played.gives_check && weight <= PROPHYLAXIS_MAX_TACTICAL)
}

fn no_eval_drop(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() > -PROPHYLAXIS_DROP)
}

fn eval_drop(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() <= -PROPHYLAXIS_DROP)
}

fn preventive_signal(ctx: &TagContext) -> GateResult {
    if !ctx.opp_delta.is_finite() {
        return Err(crate::error::DetectorError::NonFinite {
            gate: "preventive_signal",
            metric: "opp_delta",
        });
    }
    Ok(preventive_score(ctx) >= PROPHYLAXIS_TRIGGER)
}

fn no_preventive_signal(ctx: &TagContext) -> GateResult {
    preventive_signal(ctx).map(|signal| !signal)
}

fn direct_prevention(ctx: &TagContext) -> GateResult {
    Ok(direct_condition(ctx))
}

fn latent_prevention(ctx: &TagContext) -> GateResult {
    Ok(!direct_condition(ctx))
}

fn generic_confidence(ctx: &TagContext) -> f64 {
    0.5 + preventive_score(ctx)
}

fn direct_confidence(ctx: &TagContext) -> f64 {
    0.6 + 0.4 * preventive_score(ctx).max(soft_weight(ctx) - PROPHYLAXIS_SOFT_WEIGHT)
}

fn latent_confidence(ctx: &TagContext) -> f64 {
    0.4 + 0.5 * soft_weight(ctx)
}

fn drop_confidence(ctx: &TagContext) -> f64 {
    0.5 + (-ctx.loss() - PROPHYLAXIS_DROP) / 2.0
}

fn prophylaxis_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "preventive_score" => preventive_score(ctx),
        "soft_weight" => soft_weight(ctx),
        "tactical_weight" => ctx.tactical_weight,
        "delta_eval" => ctx.delta_eval,
    }
}

const CANDIDATE: Gate = Gate::new("is_prophylaxis_candidate", is_prophylaxis_candidate);
const NO_DROP: Gate = Gate::new("no_eval_drop", no_eval_drop);
const DROP: Gate = Gate::new("eval_drop", eval_drop);
const SIGNAL: Gate = Gate::new("preventive_signal", preventive_signal);

const MOVE_GATES: &[Gate] = &[CANDIDATE, NO_DROP, SIGNAL];
const DIRECT_GATES: &[Gate] = &[CANDIDATE, NO_DROP, SIGNAL, Gate::new("direct_prevention", direct_prevention)];
const LATENT_GATES: &[Gate] = &[CANDIDATE, NO_DROP, SIGNAL, Gate::new("latent_prevention", latent_prevention)];
const MEANINGLESS_GATES: &[Gate] = &[
    CANDIDATE,
    DROP,
    Gate::new("no_preventive_signal", no_preventive_signal),
];
const FAILED_GATES: &[Gate] = &[CANDIDATE, DROP, SIGNAL];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::ProphylacticMove, MOVE_GATES, generic_confidence, prophylaxis_evidence),
    Detector::new(Tag::ProphylacticDirect, DIRECT_GATES, direct_confidence, prophylaxis_evidence),
    Detector::new(Tag::ProphylacticLatent, LATENT_GATES, latent_confidence, prophylaxis_evidence),
    Detector::new(Tag::ProphylacticMeaningless, MEANINGLESS_GATES, drop_confidence, prophylaxis_evidence),
    Detector::new(Tag::FailedProphylactic, FAILED_GATES, drop_confidence, prophylaxis_evidence),
];
