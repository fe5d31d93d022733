//! Pawn-structure changes

use shakmaty::Role;

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::gate::{finite, Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{STRUCTURE_CHANGE, STRUCTURE_COMPENSATION};

fn compensation(ctx: &TagContext) -> f64 {
    ctx.self_delta.mobility + ctx.self_delta.tactics
}

fn structure_delta(gate: &'static str, ctx: &TagContext) -> Result<f64, crate::error::DetectorError> {
    finite(gate, "self_delta.structure", ctx.self_delta.structure)
}

fn pawn_structure_relevant(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.role == Role::Pawn || ctx.played.captured == Some(Role::Pawn))
}

fn structure_improved(ctx: &TagContext) -> GateResult {
    Ok(structure_delta("structure_improved", ctx)? >= STRUCTURE_CHANGE)
}

fn structure_damaged(ctx: &TagContext) -> GateResult {
    Ok(structure_delta("structure_damaged", ctx)? <= -STRUCTURE_CHANGE)
}

fn has_compensation(ctx: &TagContext) -> GateResult {
    Ok(compensation(ctx) >= STRUCTURE_COMPENSATION)
}

fn no_compensation(ctx: &TagContext) -> GateResult {
    has_compensation(ctx).map(|yes| !yes)
}

fn integrity_confidence(ctx: &TagContext) -> f64 {
    0.5 + 2.0 * ctx.self_delta.structure
}

fn dynamic_confidence(ctx: &TagContext) -> f64 {
    0.5 + compensation(ctx)
}

fn static_confidence(ctx: &TagContext) -> f64 {
    0.5 - 2.0 * ctx.self_delta.structure
}

fn structure_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "structure_before" => ctx.self_before.structure,
        "structure_after" => ctx.self_after.structure,
        "compensation" => compensation(ctx),
    }
}

const DAMAGED: Gate = Gate::new("structure_damaged", structure_damaged);

const INTEGRITY_GATES: &[Gate] = &[
    Gate::new("pawn_structure_relevant", pawn_structure_relevant),
    Gate::new("structure_improved", structure_improved),
];
const DYNAMIC_GATES: &[Gate] = &[DAMAGED, Gate::new("has_compensation", has_compensation)];
const STATIC_GATES: &[Gate] = &[DAMAGED, Gate::new("no_compensation", no_compensation)];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::StructuralIntegrity, INTEGRITY_GATES, integrity_confidence, structure_evidence),
    Detector::new(Tag::StructuralCompromiseDynamic, DYNAMIC_GATES, dynamic_confidence, structure_evidence),
    Detector::new(Tag::StructuralCompromiseStatic, STATIC_GATES, static_confidence, structure_evidence),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn pawn_move(structure_delta: f64, compensation: f64) -> TagContext {
        let mut ctx = fixtures::build(fixtures::START, "e2e4", &[(30, "e2e4")], &[(-30, "e7e5")]);
        ctx.self_delta.structure = structure_delta;
        ctx.self_delta.mobility = compensation;
        ctx.self_delta.tactics = 0.0;
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
    fn test_integrity_needs_pawn_involvement() {
        assert_eq!(fired(&pawn_move(0.2, 0.0)), vec![Tag::StructuralIntegrity]);

        let mut knight = fixtures::quiet();
        knight.self_delta.structure = 0.2;
        let evidence = DETECTORS[0].evaluate(&knight).expect("evaluates");
        assert_eq!(evidence.gates_failed, vec!["pawn_structure_relevant"]);
    }

    #[test]
    fn test_compromise_split_by_compensation() {
        assert_eq!(fired(&pawn_move(-0.2, 0.15)), vec![Tag::StructuralCompromiseDynamic]);
        assert_eq!(fired(&pawn_move(-0.2, 0.0)), vec![Tag::StructuralCompromiseStatic]);
        assert!(fired(&pawn_move(-0.05, 0.0)).is_empty());
    }

    #[test]
    fn test_static_confidence_grows_with_damage() {
        let mild = DETECTORS[2].evaluate(&pawn_move(-0.1, 0.0)).expect("evaluates");
        let severe = DETECTORS[2].evaluate(&pawn_move(-0.2, 0.0)).expect("evaluates");
        assert!(severe.confidence > mild.confidence);
    }
}
