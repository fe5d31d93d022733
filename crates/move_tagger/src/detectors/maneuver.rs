//! Quiet minor-piece relocations

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::features::Phase;
use crate::gate::{finite, Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{MANEUVER_MAX_LOSS, MANEUVER_QUALITY, TENSION_CONTACT_NEUTRAL};

/// Weighted own mobility and centre gain, positive when the piece improved
pub fn maneuver_quality(ctx: &TagContext) -> f64 {
    0.6 * ctx.self_delta.mobility * 5.0 + 0.4 * ctx.self_delta.center_control * 5.0
}

fn quality(gate: &'static str, ctx: &TagContext) -> Result<f64, crate::error::DetectorError> {
    finite(gate, "maneuver_quality", maneuver_quality(ctx))
}

fn is_maneuver_candidate(ctx: &TagContext) -> GateResult {
    let played = &ctx.played;
    Ok(ctx.moves_minor_piece()
        && !played.is_capture()
        && !played.gives_check
        && played.promotion.is_none())
}

fn positive_quality(ctx: &TagContext) -> GateResult {
    Ok(quality("positive_quality", ctx)? >= MANEUVER_QUALITY)
}

fn neutral_quality(ctx: &TagContext) -> GateResult {
    Ok(quality("neutral_quality", ctx)?.abs() < MANEUVER_QUALITY)
}

fn negative_quality_or_loss(ctx: &TagContext) -> GateResult {
    let q = quality("negative_quality_or_loss", ctx)?;
    Ok(q <= -MANEUVER_QUALITY || ctx.loss() < MANEUVER_MAX_LOSS)
}

fn maneuver_eval_ok(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() >= MANEUVER_MAX_LOSS)
}

fn opening_phase(ctx: &TagContext) -> GateResult {
    Ok(ctx.phase == Phase::Opening)
}

fn not_opening_phase(ctx: &TagContext) -> GateResult {
    opening_phase(ctx).map(|opening| !opening)
}

fn leaves_back_rank(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.from_relative_rank == 1)
}

fn prepares_contact(ctx: &TagContext) -> GateResult {
    Ok(ctx.contact_delta >= TENSION_CONTACT_NEUTRAL)
}

fn constructive_confidence(ctx: &TagContext) -> f64 {
    0.5 + maneuver_quality(ctx)
}

fn neutral_confidence(ctx: &TagContext) -> f64 {
    0.7 - maneuver_quality(ctx).abs() * 2.0
}

fn misplaced_confidence(ctx: &TagContext) -> f64 {
    0.5 + (-maneuver_quality(ctx)).max(MANEUVER_MAX_LOSS - ctx.loss())
}

fn opening_confidence(_ctx: &TagContext) -> f64 {
    0.6
}

fn preparation_confidence(ctx: &TagContext) -> f64 {
    0.5 + 5.0 * ctx.contact_delta
}

fn maneuver_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "quality" => maneuver_quality(ctx),
        "piece" => super::role_name(ctx.played.role),
        "from_rank" => ctx.played.from_relative_rank,
        "phase" => ctx.phase,
        "contact_delta" => ctx.contact_delta,
    }
}

const CANDIDATE: Gate = Gate::new("is_maneuver_candidate", is_maneuver_candidate);
const NEUTRAL: Gate = Gate::new("neutral_quality", neutral_quality);
const EVAL_OK: Gate = Gate::new("maneuver_eval_ok", maneuver_eval_ok);

const CONSTRUCTIVE_GATES: &[Gate] = &[CANDIDATE, Gate::new("positive_quality", positive_quality), EVAL_OK];
const NEUTRAL_GATES: &[Gate] = &[CANDIDATE, NEUTRAL, EVAL_OK];
const MISPLACED_GATES: &[Gate] = &[
    CANDIDATE,
    Gate::new("negative_quality_or_loss", negative_quality_or_loss),
];
const OPENING_GATES: &[Gate] = &[
    CANDIDATE,
    Gate::new("opening_phase", opening_phase),
    Gate::new("leaves_back_rank", leaves_back_rank),
];
const PREPARATION_GATES: &[Gate] = &[
    CANDIDATE,
    Gate::new("not_opening_phase", not_opening_phase),
    NEUTRAL,
    Gate::new("prepares_contact", prepares_contact),
];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::ConstructiveManeuver, CONSTRUCTIVE_GATES, constructive_confidence, maneuver_evidence),
    Detector::new(Tag::NeutralManeuver, NEUTRAL_GATES, neutral_confidence, maneuver_evidence),
    Detector::new(Tag::MisplacedManeuver, MISPLACED_GATES, misplaced_confidence, maneuver_evidence),
    Detector::new(Tag::ManeuverOpening, OPENING_GATES, opening_confidence, maneuver_evidence),
    Detector::new(Tag::ManeuverPreparation, PREPARATION_GATES, preparation_confidence, maneuver_evidence),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    /// g1f3 with a chosen quality; mobility only
    fn knight_move(mobility_delta: f64) -> TagContext {
        let mut ctx = fixtures::quiet();
        ctx.self_delta.mobility = mobility_delta;
        ctx.self_delta.center_control = 0.0;
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
    fn test_quality_formula() {
        let mut ctx = knight_move(0.1);
        ctx.self_delta.center_control = 0.05;
        assert!((maneuver_quality(&ctx) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_opening_development() {
        let ctx = knight_move(0.1);
        assert_eq!(ctx.phase, Phase::Opening);
        assert_eq!(ctx.played.from_relative_rank, 1);
        assert_eq!(fired(&ctx), vec![Tag::ConstructiveManeuver, Tag::ManeuverOpening]);
    }

    #[test]
    fn test_quality_buckets_in_middlegame() {
        let mut ctx = knight_move(0.0);
        ctx.phase = Phase::Middlegame;
        assert_eq!(fired(&ctx), vec![Tag::NeutralManeuver]);

        ctx.contact_delta = 0.03;
        assert_eq!(fired(&ctx), vec![Tag::NeutralManeuver, Tag::ManeuverPreparation]);

        let mut ctx = knight_move(-0.1);
        ctx.phase = Phase::Middlegame;
        assert_eq!(fired(&ctx), vec![Tag::MisplacedManeuver]);
    }

    #[test]
    fn test_loss_makes_misplaced() {
        let mut ctx = fixtures::with_loss(knight_move(0.1), -40);
        ctx.phase = Phase::Middlegame;
        assert_eq!(fired(&ctx), vec![Tag::MisplacedManeuver]);
    }

    #[test]
    fn test_pawn_moves_are_not_maneuvers() {
        let ctx = fixtures::build(
            fixtures::START,
            "e2e4",
            &[(30, "e2e4")],
            &[(-30, "e7e5")],
        );
        for detector in DETECTORS {
            let evidence = detector.evaluate(&ctx).expect("evaluates");
            assert_eq!(evidence.gates_failed, vec!["is_maneuver_candidate"]);
        }
    }
}
