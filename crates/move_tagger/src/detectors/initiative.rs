//! Initiative family
//!
//! The mover "has the initiative" when the position already favours them or
//! their pieces generate more tactical pressure than the opponent's. Pressure
//! is a drop in the opponent's king safety or mobility.

use crate::context::TagContext;
use crate::error::{DetectorError, GateResult};
use crate::evidence;
use crate::gate::{Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{
    INITIATIVE_ATTEMPT_LOSS, INITIATIVE_EVAL, INITIATIVE_KEEP_LOSS, INITIATIVE_PRESSURE,
    INITIATIVE_TACTICS_EDGE, TENSION_CONTACT_TRIGGER,
};

fn tactics_edge(ctx: &TagContext) -> f64 {
    ctx.self_before.tactics - ctx.opp_before.tactics
}

fn initiative(ctx: &TagContext) -> bool {
    ctx.eval_before >= INITIATIVE_EVAL || tactics_edge(ctx) >= INITIATIVE_TACTICS_EDGE
}

fn pressure(ctx: &TagContext) -> bool {
    ctx.opp_delta.king_safety <= INITIATIVE_PRESSURE || ctx.opp_delta.mobility <= INITIATIVE_PRESSURE
}

fn has_initiative(ctx: &TagContext) -> GateResult {
    Ok(initiative(ctx))
}

fn lacks_initiative(ctx: &TagContext) -> GateResult {
    Ok(!initiative(ctx))
}

fn keeps_eval(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() >= INITIATIVE_KEEP_LOSS)
}

fn increases_pressure(ctx: &TagContext) -> GateResult {
    Ok(pressure(ctx))
}

fn no_pressure_increase(ctx: &TagContext) -> GateResult {
    Ok(!pressure(ctx))
}

fn active_move(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.is_capture()
        || ctx.played.gives_check
        || ctx.contact_delta >= TENSION_CONTACT_TRIGGER)
}

fn tolerable_loss(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() >= INITIATIVE_ATTEMPT_LOSS)
}

fn quiet_move(ctx: &TagContext) -> GateResult {
    Ok(!ctx.played.kind.is_forcing())
}

fn best_was_forcing(ctx: &TagContext) -> GateResult {
    let best = ctx.best_candidate().ok_or(DetectorError::MissingCandidates {
        gate: "best_was_forcing",
    })?;
    Ok(best.kind.is_forcing())
}

fn exploitation_confidence(ctx: &TagContext) -> f64 {
    let drop = (-ctx.opp_delta.king_safety).max(-ctx.opp_delta.mobility);
    0.6 + 2.0 * drop
}

fn attempt_confidence(ctx: &TagContext) -> f64 {
    0.5 + (ctx.loss() - INITIATIVE_ATTEMPT_LOSS) / 2.0
}

fn deferred_confidence(ctx: &TagContext) -> f64 {
    0.5 + ctx.eval_before.max(0.0) / 4.0
}

fn initiative_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "eval_before" => ctx.eval_before,
        "tactics_edge" => tactics_edge(ctx),
        "opp_king_safety_delta" => ctx.opp_delta.king_safety,
        "opp_mobility_delta" => ctx.opp_delta.mobility,
        "best_move" => ctx.best_move(),
    }
}

const HAS: Gate = Gate::new("has_initiative", has_initiative);

const EXPLOITATION_GATES: &[Gate] = &[
    HAS,
    Gate::new("keeps_eval", keeps_eval),
    Gate::new("increases_pressure", increases_pressure),
];
const ATTEMPT_GATES: &[Gate] = &[
    Gate::new("lacks_initiative", lacks_initiative),
    Gate::new("active_move", active_move),
    Gate::new("tolerable_loss", tolerable_loss),
];
const DEFERRED_GATES: &[Gate] = &[
    HAS,
    Gate::new("quiet_move", quiet_move),
    Gate::new("no_pressure_increase", no_pressure_increase),
    Gate::new("best_was_forcing", best_was_forcing),
];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::InitiativeExploitation, EXPLOITATION_GATES, exploitation_confidence, initiative_evidence),
    Detector::new(Tag::InitiativeAttempt, ATTEMPT_GATES, attempt_confidence, initiative_evidence),
    Detector::new(Tag::DeferredInitiative, DEFERRED_GATES, deferred_confidence, initiative_evidence),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MoveKind;
    use crate::fixtures;

    fn ahead(eval_before: f64) -> TagContext {
        let mut ctx = fixtures::quiet();
        ctx.eval_before = eval_before;
        ctx.self_before.tactics = 0.0;
        ctx.opp_before.tactics = 0.0;
        ctx.opp_delta.king_safety = 0.0;
        ctx.opp_delta.mobility = 0.0;
        ctx.contact_delta = 0.0;
        ctx
    }

    fn fired(ctx: &TagContext) -> Vec<Tag> {
        DETECTORS
            .iter()
            .filter_map(|d| d.evaluate(ctx).ok())
            .filter(|e| e.fired)
            .map(|e| e.tag)
            .collect()
    }

    #[test]
    fn test_exploitation_needs_pressure() {
        let mut ctx = ahead(0.8);
        ctx.opp_delta.mobility = -0.1;
        assert_eq!(fired(&ctx), vec![Tag::InitiativeExploitation]);

        let conf = DETECTORS[0].evaluate(&ctx).expect("evaluates").confidence;
        assert!((conf - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_tactical_edge_counts_as_initiative() {
        let mut ctx = ahead(0.0);
        ctx.self_before.tactics = 0.3;
        ctx.opp_delta.king_safety = -0.1;
        assert_eq!(fired(&ctx), vec![Tag::InitiativeExploitation]);
    }

    #[test]
    fn test_attempt_from_level_position() {
        let mut ctx = fixtures::with_loss(ahead(0.1), -30);
        ctx.contact_delta = 0.06;
        assert_eq!(fired(&ctx), vec![Tag::InitiativeAttempt]);

        let ctx = fixtures::with_loss(ctx, -60);
        assert!(fired(&ctx).is_empty());
    }

    #[test]
    fn test_deferred_when_best_was_forcing() {
        let mut ctx = ahead(1.0);
        ctx.candidates[0].kind = MoveKind::Capture;
        assert_eq!(fired(&ctx), vec![Tag::DeferredInitiative]);

        ctx.candidates[0].kind = MoveKind::Quiet;
        assert!(fired(&ctx).is_empty());
    }

    #[test]
    fn test_missing_candidates_is_a_detector_error() {
        let mut ctx = ahead(1.0);
        ctx.candidates.clear();
        let err = DETECTORS[2].evaluate(&ctx).expect_err("no candidates");
        assert_eq!(
            err,
            DetectorError::MissingCandidates {
                gate: "best_was_forcing"
            }
        );
    }
}
