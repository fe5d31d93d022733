//! Tension family: moves that bring pieces into contact in a balanced position

use crate::context::TagContext;
use crate::error::GateResult;
use crate::evidence;
use crate::gate::{finite, Detector, Evidence, Gate};
use crate::tags::Tag;
use crate::thresholds::{
    PREMATURE_ATTACK_LOSS, TENSION_CONTACT_NEUTRAL, TENSION_CONTACT_TRIGGER, TENSION_EVAL_BAND,
    TENSION_MAX_LOSS, TENSION_MOBILITY_SYMMETRY,
};

fn eval_in_band(ctx: &TagContext) -> GateResult {
    Ok(ctx.eval_before.abs() <= TENSION_EVAL_BAND)
}

fn contact_rise(ctx: &TagContext) -> GateResult {
    let delta = finite("contact_rise", "contact_delta", ctx.contact_delta)?;
    Ok(delta >= TENSION_CONTACT_TRIGGER)
}

fn mild_contact_rise(ctx: &TagContext) -> GateResult {
    let delta = finite("mild_contact_rise", "contact_delta", ctx.contact_delta)?;
    Ok((TENSION_CONTACT_NEUTRAL..TENSION_CONTACT_TRIGGER).contains(&delta))
}

fn mobility_symmetry(ctx: &TagContext) -> GateResult {
    Ok((ctx.self_delta.mobility - ctx.opp_delta.mobility).abs() <= TENSION_MOBILITY_SYMMETRY)
}

fn no_significant_loss(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() >= TENSION_MAX_LOSS)
}

fn premature_eval_loss(ctx: &TagContext) -> GateResult {
    Ok(ctx.loss() <= PREMATURE_ATTACK_LOSS)
}

fn creation_confidence(ctx: &TagContext) -> f64 {
    0.6 + 2.0 * (ctx.contact_delta - TENSION_CONTACT_TRIGGER)
}

fn neutral_confidence(ctx: &TagContext) -> f64 {
    0.5 + 5.0 * (ctx.contact_delta - TENSION_CONTACT_NEUTRAL)
}

fn premature_confidence(ctx: &TagContext) -> f64 {
    0.6 + (PREMATURE_ATTACK_LOSS - ctx.loss()) / 2.0
}

fn tension_evidence(ctx: &TagContext) -> Evidence {
    evidence! {
        "contact_before" => ctx.contact_before,
        "contact_after" => ctx.contact_after,
        "mobility_asymmetry" => ctx.self_delta.mobility - ctx.opp_delta.mobility,
        "eval_before" => ctx.eval_before,
    }
}

const IN_BAND: Gate = Gate::new("eval_in_band", eval_in_band);
const CONTACT_RISE: Gate = Gate::new("contact_rise", contact_rise);
const SYMMETRY: Gate = Gate::new("mobility_symmetry", mobility_symmetry);

const CREATION_GATES: &[Gate] = &[
    IN_BAND,
    CONTACT_RISE,
    SYMMETRY,
    Gate::new("no_significant_loss", no_significant_loss),
];
const NEUTRAL_GATES: &[Gate] = &[IN_BAND, Gate::new("mild_contact_rise", mild_contact_rise), SYMMETRY];
const PREMATURE_GATES: &[Gate] = &[
    IN_BAND,
    CONTACT_RISE,
    Gate::new("premature_eval_loss", premature_eval_loss),
];

pub(super) const DETECTORS: &[Detector] = &[
    Detector::new(Tag::TensionCreation, CREATION_GATES, creation_confidence, tension_evidence),
    Detector::new(Tag::NeutralTensionCreation, NEUTRAL_GATES, neutral_confidence, tension_evidence),
    Detector::new(Tag::PrematureAttack, PREMATURE_GATES, premature_confidence, tension_evidence),
];
