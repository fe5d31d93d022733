//! Control over dynamics
//!
//! Moves that take play away from the opponent without adding contact. All
//! five detectors share the base gates; each subtype adds the signal that
//! names how control was gained.

use shakmaty::Role;

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::gate::{finite, Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{
    COD_FREEZE, COD_MAX_LOSS, COD_OPP_RESTRICTION, COD_SUBTYPE_GAIN, COD_TRADE_BALANCE,
};

fn restriction(ctx: &TagContext) -> f64 {
    ctx.opp_delta.tactics.min(ctx.opp_delta.mobility)
}

fn restricts_opponent(ctx: &TagContext) -> GateResult {
    let worst = finite("restricts_opponent", "opp_delta", restriction(ctx))?;
    Ok(worst <= COD_OPP_RESTRICTION)
}

fn contact_not_rising(ctx: &TagContext) -> GateResult {
    Ok(ctx.contact_delta <= 0.0)
}

fn cod_eval_ok(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() >= COD_MAX_LOSS)
}

fn is_trade(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.is_capture() && ctx.material_delta.abs() < COD_TRADE_BALANCE)
}

fn king_shell_gain(ctx: &TagContext) -> GateResult {
    Ok(ctx.self_delta.king_safety >= COD_SUBTYPE_GAIN)
}

fn pawn_move(ctx: &TagContext) -> GateResult {
    Ok(ctx.played.role == Role::Pawn)
}

fn center_gain(ctx: &TagContext) -> GateResult {
    Ok(ctx.self_delta.center_control >= COD_SUBTYPE_GAIN)
}

fn freezes_opponent(ctx: &TagContext) -> GateResult {
    Ok(ctx.opp_delta.mobility <= COD_FREEZE)
}

fn base_confidence(ctx: &TagContext) -> f64 {
    0.5 + 2.0 * -restriction(ctx)
}

fn subtype_confidence(ctx: &TagContext) -> f64 {
    0.1 + base_confidence(ctx)
}

fn control_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "opp_mobility_delta" => ctx.opp_delta.mobility,
        "opp_tactics_delta" => ctx.opp_delta.tactics,
        "contact_delta" => ctx.contact_delta,
        "material_delta" => ctx.material_delta,
    }
}

const RESTRICTS: Gate = Gate::new("restricts_opponent", restricts_opponent);
const CALM: Gate = Gate::new("contact_not_rising", contact_not_rising);
const EVAL_OK: Gate = Gate::new("cod_eval_ok", cod_eval_ok);

const BASE_GATES: &[Gate] = &[RESTRICTS, CALM, EVAL_OK];
const SIMPLIFY_GATES: &[Gate] = &[RESTRICTS, CALM, EVAL_OK, Gate::new("is_trade", is_trade)];
const SHELL_GATES: &[Gate] = &[RESTRICTS, CALM, EVAL_OK, Gate::new("king_shell_gain", king_shell_gain)];
const CLAMP_GATES: &[Gate] = &[
    RESTRICTS,
    CALM,
    EVAL_OK,
    Gate::new("pawn_move", pawn_move),
    Gate::new("center_gain", center_gain),
];
const FREEZE_GATES: &[Gate] = &[RESTRICTS, CALM, EVAL_OK, Gate::new("freezes_opponent", freezes_opponent)];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::ControlOverDynamics, BASE_GATES, base_confidence, control_evidence),
    Detector::new(Tag::CodSimplify, SIMPLIFY_GATES, subtype_confidence, control_evidence),
    Detector::new(Tag::CodKingSafetyShell, SHELL_GATES, subtype_confidence, control_evidence),
    Detector::new(Tag::CodSpaceClamp, CLAMP_GATES, subtype_confidence, control_evidence),
    Detector::new(Tag::CodFreezeBind, FREEZE_GATES, subtype_confidence, control_evidence),
];
