//! Sacrifice family
//!
//! A sacrifice gives up at least half a pawn of material once the opponent's
//! best reply is accounted for. The subtype depends on how the position stood
//! before the move, whether the enemy king got exposed and how far the
//! evaluation fell.

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::gate::{finite, Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{
    BEST_MOVE_SLACK, COMBINATION_TACTICS_GAIN, DESPERATE_EVAL, KING_ATTACK_DELTA,
    SACRIFICE_EVAL_TOLERANCE, SACRIFICE_MIN_LOSS, TACTICAL_WEIGHT_HIGH,
};

fn material_given(ctx: &TagContext) -> f64 {
    -ctx.material_delta
}

fn attacks_king(ctx: &TagContext) -> bool {
    ctx.opp_delta.king_safety <= KING_ATTACK_DELTA
}

fn is_sacrifice(ctx: &TagContext) -> GateResult {
    let delta = finite("is_sacrifice", "material_delta", ctx.material_delta)?;
    Ok(-delta >= SACRIFICE_MIN_LOSS)
}

fn losing_before(ctx: &TagContext) -> GateResult {
    Ok(ctx.eval_before <= DESPERATE_EVAL)
}

fn not_desperate(ctx: &TagContext) -> GateResult {
    Ok(ctx.eval_before > DESPERATE_EVAL)
}

fn king_attack(ctx: &TagContext) -> GateResult {
    finite("king_attack", "opp_delta.king_safety", ctx.opp_delta.king_safety)?;
    Ok(attacks_king(ctx))
}

fn no_king_attack(ctx: &TagContext) -> GateResult {
    king_attack(ctx).map(|attack| !attack)
}

fn eval_loss_exceeds_tolerance(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() < -SACRIFICE_EVAL_TOLERANCE)
}

fn within_tolerance(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() >= -SACRIFICE_EVAL_TOLERANCE)
}

fn tactical_position(ctx: &TagContext) -> GateResult {
    Ok(ctx.tactical_weight >= TACTICAL_WEIGHT_HIGH || attacks_king(ctx))
}

fn quiet_position(ctx: &TagContext) -> GateResult {
    tactical_position(ctx).map(|tactical| !tactical)
}

fn is_best_move(ctx: &TagContext) -> GateResult {
    Ok(ctx.played_is_best() || ctx.loss() >= BEST_MOVE_SLACK)
}

fn forcing_follow_up(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.gives_check || ctx.self_delta.tactics >= COMBINATION_TACTICS_GAIN)
}

fn desperate_confidence(ctx: &TagContext) -> f64 {
    0.6 + (DESPERATE_EVAL - ctx.eval_before) / 10.0
}

fn overshoot_confidence(ctx: &TagContext) -> f64 {
    0.5 + (-ctx.loss() - SACRIFICE_EVAL_TOLERANCE) / 2.0
}

fn tactical_confidence(ctx: &TagContext) -> f64 {
    0.5 + 0.5 * ctx.tactical_weight
}

fn positional_confidence(ctx: &TagContext) -> f64 {
    0.5 + 0.5 * (1.0 - ctx.tactical_weight)
}

fn combination_confidence(ctx: &TagContext) -> f64 {
    0.6 + material_given(ctx) / 10.0
}

fn sacrifice_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "material_given" => material_given(ctx),
        "eval_before" => ctx.eval_before,
        "delta_eval" => ctx.delta_eval,
        "opp_king_safety_delta" => ctx.opp_delta.king_safety,
        "tactical_weight" => ctx.tactical_weight,
    }
}

const SACRIFICE: Gate = Gate::new("is_sacrifice", is_sacrifice);
const NOT_DESPERATE: Gate = Gate::new("not_desperate", not_desperate);
const OVER_TOLERANCE: Gate = Gate::new("eval_loss_exceeds_tolerance", eval_loss_exceeds_tolerance);
const WITHIN_TOLERANCE: Gate = Gate::new("within_tolerance", within_tolerance);

const DESPERATE_GATES: &[Gate] = &[SACRIFICE, Gate::new("losing_before", losing_before)];

const SPECULATIVE_GATES: &[Gate] = &[
    SACRIFICE,
    NOT_DESPERATE,
    Gate::new("no_king_attack", no_king_attack),
    OVER_TOLERANCE,
];

const INACCURATE_TACTICAL_GATES: &[Gate] = &[
    SACRIFICE,
    NOT_DESPERATE,
    Gate::new("king_attack", king_attack),
    OVER_TOLERANCE,
];

const TACTICAL_GATES: &[Gate] = &[
    SACRIFICE,
    NOT_DESPERATE,
    WITHIN_TOLERANCE,
    Gate::new("tactical_position", tactical_position),
];

const POSITIONAL_GATES: &[Gate] = &[
    SACRIFICE,
    NOT_DESPERATE,
    WITHIN_TOLERANCE,
    Gate::new("quiet_position", quiet_position),
];

const COMBINATION_GATES: &[Gate] = &[
    SACRIFICE,
    NOT_DESPERATE,
    Gate::new("is_best_move", is_best_move),
    Gate::new("forcing_follow_up", forcing_follow_up),
];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::DesperateSacrifice, DESPERATE_GATES, desperate_confidence, sacrifice_evidence),
    Detector::new(Tag::SpeculativeSacrifice, SPECULATIVE_GATES, overshoot_confidence, sacrifice_evidence),
    Detector::new(
        Tag::InaccurateTacticalSacrifice,
        INACCURATE_TACTICAL_GATES,
        overshoot_confidence,
        sacrifice_evidence,
    ),
    Detector::new(Tag::TacticalSacrifice, TACTICAL_GATES, tactical_confidence, sacrifice_evidence),
    Detector::new(Tag::PositionalSacrifice, POSITIONAL_GATES, positional_confidence, sacrifice_evidence),
    Detector::new(Tag::CombinationSacrifice, COMBINATION_GATES, combination_confidence, sacrifice_evidence),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectorError;
    use crate::fixtures;

    fn sacrifice(loss_cp: i32) -> TagContext {
        let mut ctx = fixtures::with_loss(fixtures::quiet(), loss_cp);
        ctx.material_delta = -3.0;
        ctx.material_after = ctx.material_before - 3.0;
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
    fn test_no_material_given_is_not_a_sacrifice() {
        let ctx = fixtures::quiet();
        for detector in DETECTORS {
            let evidence = detector.evaluate(&ctx).expect("evaluates");
            assert_eq!(evidence.gates_failed, vec!["is_sacrifice"]);
        }
    }

    #[test]
    fn test_desperate_when_lost_before() {
        let mut ctx = sacrifice(-100);
        ctx.eval_before = -4.0;
        assert_eq!(fired(&ctx), vec![Tag::DesperateSacrifice]);
    }

    #[test]
    fn test_speculative_vs_inaccurate_tactical() {
        let mut ctx = sacrifice(-120);
        ctx.opp_delta.king_safety = 0.0;
        assert_eq!(fired(&ctx), vec![Tag::SpeculativeSacrifice]);

        ctx.opp_delta.king_safety = -0.2;
        assert_eq!(fired(&ctx), vec![Tag::InaccurateTacticalSacrifice]);
    }

    #[test]
    fn test_sound_sacrifice_subtypes() {
        let mut ctx = sacrifice(-10);
        ctx.tactical_weight = 0.2;
        ctx.opp_delta.king_safety = 0.0;
        assert_eq!(fired(&ctx), vec![Tag::PositionalSacrifice]);

        ctx.tactical_weight = 0.7;
        assert_eq!(fired(&ctx), vec![Tag::TacticalSacrifice]);

        let mut ctx = sacrifice(0);
        ctx.tactical_weight = 0.7;
        ctx.self_delta.tactics = 0.3;
        assert_eq!(fired(&ctx), vec![Tag::TacticalSacrifice, Tag::CombinationSacrifice]);
    }

    #[test]
    fn test_non_finite_material_is_an_error() {
        let mut ctx = sacrifice(0);
        ctx.material_delta = f64::NAN;
        let err = DETECTORS[0].evaluate(&ctx).expect_err("NaN material");
        assert_eq!(
            err,
            DetectorError::NonFinite {
                gate: "is_sacrifice",
                metric: "material_delta"
            }
        );
    }
}
