//! Knight/bishop exchange quality

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::features::is_minor;
use crate::gate::{Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{EXCHANGE_ACCURATE_CP, EXCHANGE_BAD_CP};

use super::role_name;

fn is_capture(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.is_capture())
}

fn capturing_minor_piece(ctx: &TagContext) -> GateResult {
    Ok(is_minor(ctx.played.role))
}

fn captured_minor_piece(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.captured.is_some_and(is_minor))
}

fn accurate_eval(ctx: &TagContext) -> GateResult {
    Ok(ctx.delta_eval_cp > EXCHANGE_ACCURATE_CP)
}

fn moderate_eval_loss(ctx: &TagContext) -> GateResult {
    Ok(ctx.delta_eval_cp > EXCHANGE_BAD_CP && ctx.delta_eval_cp <= EXCHANGE_ACCURATE_CP)
}

fn significant_eval_loss(ctx: &TagContext) -> GateResult {
    Ok(ctx.delta_eval_cp <= EXCHANGE_BAD_CP)
}

fn accurate_confidence(ctx: &TagContext) -> f64 {
    0.8 + f64::from(ctx.delta_eval_cp.min(0)) / 50.0
}

fn inaccurate_confidence(ctx: &TagContext) -> f64 {
    0.5 + f64::from(-ctx.delta_eval_cp + EXCHANGE_ACCURATE_CP) / 40.0
}

fn bad_confidence(ctx: &TagContext) -> f64 {
    0.7 + f64::from(-ctx.delta_eval_cp + EXCHANGE_BAD_CP) / 100.0
}

fn exchange_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "delta_eval_cp" => ctx.delta_eval_cp,
        "capturing" => role_name(ctx.played.role),
        "captured" => ctx.played.captured.map(role_name),
    }
}

const ACCURATE_GATES: &[Gate] = &[
    Gate::new("is_capture", is_capture),
    Gate::new("capturing_minor_piece", capturing_minor_piece),
    Gate::new("captured_minor_piece", captured_minor_piece),
    Gate::new("accurate_eval", accurate_eval),
];

const INACCURATE_GATES: &[Gate] = &[
    Gate::new("is_capture", is_capture),
    Gate::new("capturing_minor_piece", capturing_minor_piece),
    Gate::new("captured_minor_piece", captured_minor_piece),
    Gate::new("moderate_eval_loss", moderate_eval_loss),
];

const BAD_GATES: &[Gate] = &[
    Gate::new("is_capture", is_capture),
    Gate::new("capturing_minor_piece", capturing_minor_piece),
    Gate::new("captured_minor_piece", captured_minor_piece),
    Gate::new("significant_eval_loss", significant_eval_loss),
];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(
        Tag::AccurateKnightBishopExchange,
        ACCURATE_GATES,
        accurate_confidence,
        exchange_evidence,
    ),
    Detector::new(
        Tag::InaccurateKnightBishopExchange,
        INACCURATE_GATES,
        inaccurate_confidence,
        exchange_evidence,
    ),
    Detector::new(
        Tag::BadKnightBishopExchange,
        BAD_GATES,
        bad_confidence,
        exchange_evidence,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, KNIGHT_TAKES_BISHOP};

    fn exchange(loss_cp: i32) -> TagContext {
        let ctx = fixtures::build(
            KNIGHT_TAKES_BISHOP,
            "c3e4",
            &[(100, "d2d4"), (80, "c3e4")],
            &[(-65, "g8f6")],
        );
        fixtures::with_loss(ctx, loss_cp)
    }

    fn fired(ctx: &TagContext) -> Vec<Tag> {
        DETECTORS
            .iter()
            .map(|d| d.evaluate(ctx).expect("exchange gates never error"))
            .filter(|e| e.fired)
            .map(|e| e.tag)
            .collect()
    }

    #[test]
    fn test_buckets_are_disjoint() {
        assert_eq!(fired(&exchange(0)), vec![Tag::AccurateKnightBishopExchange]);
        assert_eq!(fired(&exchange(-9)), vec![Tag::AccurateKnightBishopExchange]);
        assert_eq!(fired(&exchange(-10)), vec![Tag::InaccurateKnightBishopExchange]);
        assert_eq!(fired(&exchange(-29)), vec![Tag::InaccurateKnightBishopExchange]);
        assert_eq!(fired(&exchange(-30)), vec![Tag::BadKnightBishopExchange]);
        assert_eq!(fired(&exchange(-300)), vec![Tag::BadKnightBishopExchange]);
    }

    #[test]
    fn test_built_context_has_expected_loss() {
        let ctx = fixtures::build(
            KNIGHT_TAKES_BISHOP,
            "c3e4",
            &[(100, "d2d4"), (80, "c3e4")],
            &[(-65, "g8f6")],
        );
        assert_eq!(ctx.delta_eval_cp, -35);
        assert_eq!(fired(&ctx), vec![Tag::BadKnightBishopExchange]);
    }

    #[test]
    fn test_confidence_scales_with_loss() {
        let bad = DETECTORS[2].evaluate(&exchange(-35)).expect("evaluates");
        assert!((bad.confidence - 0.75).abs() < 1e-9);

        let worse = DETECTORS[2].evaluate(&exchange(-60)).expect("evaluates");
        assert!(worse.confidence > bad.confidence);

        let inaccurate = DETECTORS[1].evaluate(&exchange(-20)).expect("evaluates");
        assert!((inaccurate.confidence - 0.75).abs() < 1e-9);

        let accurate = DETECTORS[0].evaluate(&exchange(0)).expect("evaluates");
        assert!((accurate.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_non_capture_stops_at_first_gate() {
        let evidence = DETECTORS[2].evaluate(&fixtures::quiet()).expect("evaluates");
        assert!(!evidence.fired);
        assert_eq!(evidence.confidence, 0.0);
        assert!(evidence.gates_passed.is_empty());
        assert_eq!(evidence.gates_failed, vec!["is_capture"]);
    }

    #[test]
    fn test_evidence_names_pieces() {
        let evidence = DETECTORS[0].evaluate(&exchange(0)).expect("evaluates");
        assert_eq!(evidence.evidence["capturing"], "knight");
        assert_eq!(evidence.evidence["captured"], "bishop");
    }
}
