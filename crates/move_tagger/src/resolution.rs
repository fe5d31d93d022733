//! Tag resolution
//!
//! Turns the raw detector run into the final [`TagResult`]. Suppression rules
//! run first (a fired specific tag hides its generic parent), then each
//! exclusive group keeps at most its highest-priority fired member. Every tag
//! that loses is listed in [`TagResult::suppressed`] with the rule that hid it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::{MoveKind, TagContext};
use crate::engine::DetectionRun;
use crate::gate::TagEvidence;
use crate::tags::Tag;
use crate::thresholds::TAGGER_VERSION;

/// Final state of one canonical tag
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TagOutcome {
    pub fired: bool,
    pub confidence: f64,
}

/// A fired tag hidden by a resolution rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    pub tag: Tag,
    pub by: Tag,
    pub rule: String,
}

/// A detector that errored or panicked for this move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorFault {
    pub tag: Tag,
    pub message: String,
}

/// Coarse verdict on the played move from its centipawn loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveQuality {
    pub fn classify(delta_eval_cp: i32, played_is_best: bool) -> MoveQuality {
        match delta_eval_cp {
            _ if played_is_best => MoveQuality::Best,
            d if d >= 0 => MoveQuality::Best,
            d if d >= -20 => MoveQuality::Excellent,
            d if d >= -50 => MoveQuality::Good,
            d if d >= -100 => MoveQuality::Inaccuracy,
            d if d >= -300 => MoveQuality::Mistake,
            _ => MoveQuality::Blunder,
        }
    }
}

/// Resolved tags for one move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResult {
    pub played_move: String,
    pub played_san: String,
    pub best_move: Option<String>,
    pub played_kind: MoveKind,
    pub best_kind: Option<MoveKind>,
    pub quality: MoveQuality,
    pub eval_before: f64,
    pub eval_played: f64,
    pub eval_best: f64,
    pub delta_eval: f64,
    /// One entry per canonical tag
    pub tags: BTreeMap<Tag, TagOutcome>,
    pub suppressed: Vec<Suppression>,
    pub faults: Vec<DetectorFault>,
    pub evidence: Vec<TagEvidence>,
    pub version: String,
}

impl TagResult {
    pub fn is_fired(&self, tag: Tag) -> bool {
        self.tags.get(&tag).is_some_and(|o| o.fired)
    }

    /// Fired tags in canonical order
    pub fn fired_tags(&self) -> Vec<Tag> {
        self.tags
            .iter()
            .filter(|(_, outcome)| outcome.fired)
            .map(|(tag, _)| *tag)
            .collect()
    }

    pub fn evidence_for(&self, tag: Tag) -> Option<&TagEvidence> {
        self.evidence.iter().find(|e| e.tag == tag)
    }
}

/// Specific tags that, when fired, hide a generic one
pub struct SuppressionRule {
    pub name: &'static str,
    pub specific: &'static [Tag],
    pub generic: Tag,
}

/// Mutually exclusive tags in priority order, first fired wins
pub struct ExclusiveGroup {
    pub name: &'static str,
    pub members: &'static [Tag],
}

pub const SUPPRESSION_RULES: &[SuppressionRule] = &[
    SuppressionRule {
        name: "prophylaxis_subtype",
        specific: &[Tag::ProphylacticDirect, Tag::ProphylacticLatent],
        generic: Tag::ProphylacticMove,
    },
    SuppressionRule {
        name: "cod_subtype",
        specific: &[
            Tag::CodSimplify,
            Tag::CodKingSafetyShell,
            Tag::CodSpaceClamp,
            Tag::CodFreezeBind,
        ],
        generic: Tag::ControlOverDynamics,
    },
    SuppressionRule {
        name: "combination_over_tactical",
        specific: &[Tag::CombinationSacrifice],
        generic: Tag::TacticalSacrifice,
    },
    SuppressionRule {
        name: "preparation_over_neutral",
        specific: &[Tag::ManeuverPreparation],
        generic: Tag::NeutralManeuver,
    },
    SuppressionRule {
        name: "forced_over_first_choice",
        specific: &[Tag::ForcedMove],
        generic: Tag::FirstChoice,
    },
];

pub const EXCLUSIVE_GROUPS: &[ExclusiveGroup] = &[
    ExclusiveGroup {
        name: "prophylaxis",
        members: &[
            Tag::ProphylacticDirect,
            Tag::ProphylacticLatent,
            Tag::ProphylacticMeaningless,
        ],
    },
    ExclusiveGroup {
        name: "exchange",
        members: &[
            Tag::BadKnightBishopExchange,
            Tag::InaccurateKnightBishopExchange,
            Tag::AccurateKnightBishopExchange,
        ],
    },
    ExclusiveGroup {
        name: "sacrifice",
        members: &[
            Tag::DesperateSacrifice,
            Tag::CombinationSacrifice,
            Tag::InaccurateTacticalSacrifice,
            Tag::SpeculativeSacrifice,
            Tag::TacticalSacrifice,
            Tag::PositionalSacrifice,
        ],
    },
    ExclusiveGroup {
        name: "tension",
        members: &[
            Tag::PrematureAttack,
            Tag::TensionCreation,
            Tag::NeutralTensionCreation,
        ],
    },
    ExclusiveGroup {
        name: "maneuver",
        members: &[
            Tag::MisplacedManeuver,
            Tag::ConstructiveManeuver,
            Tag::ManeuverPreparation,
            Tag::NeutralManeuver,
        ],
    },
    ExclusiveGroup {
        name: "structure",
        members: &[
            Tag::StructuralCompromiseDynamic,
            Tag::StructuralCompromiseStatic,
            Tag::StructuralIntegrity,
        ],
    },
    ExclusiveGroup {
        name: "cod",
        members: &[
            Tag::CodSimplify,
            Tag::CodKingSafetyShell,
            Tag::CodSpaceClamp,
            Tag::CodFreezeBind,
        ],
    },
];

/// Apply suppression and exclusivity to the fired set
///
/// `tags` must hold every canonical tag; outcomes of losers are cleared in
/// place and the returned list names each loser once.
pub fn apply_rules(tags: &mut BTreeMap<Tag, TagOutcome>) -> Vec<Suppression> {
    let mut suppressed = Vec::new();
    let fired = |tags: &BTreeMap<Tag, TagOutcome>, tag: Tag| tags.get(&tag).is_some_and(|o| o.fired);

    for rule in SUPPRESSION_RULES {
        if !fired(tags, rule.generic) {
            continue;
        }
        if let Some(by) = rule.specific.iter().copied().find(|t| fired(tags, *t)) {
            tags.insert(rule.generic, TagOutcome::default());
            suppressed.push(Suppression {
                tag: rule.generic,
                by,
                rule: rule.name.to_string(),
            });
        }
    }

    for group in EXCLUSIVE_GROUPS {
        let mut winner = None;
        for member in group.members.iter().copied() {
            if !fired(tags, member) {
                continue;
            }
            match winner {
                None => winner = Some(member),
                Some(by) => {
                    tags.insert(member, TagOutcome::default());
                    suppressed.push(Suppression {
                        tag: member,
                        by,
                        rule: format!("exclusive_{}", group.name),
                    });
                }
            }
        }
    }

    suppressed
}

/// Build the final record for one move from its context and detector run
pub fn resolve(ctx: &TagContext, run: DetectionRun) -> TagResult {
    let mut tags: BTreeMap<Tag, TagOutcome> = Tag::ALL
        .iter()
        .map(|tag| (*tag, TagOutcome::default()))
        .collect();
    for evidence in &run.evidence {
        tags.insert(
            evidence.tag,
            TagOutcome {
                fired: evidence.fired,
                confidence: evidence.confidence,
            },
        );
    }

    let suppressed = apply_rules(&mut tags);
    for s in &suppressed {
        tracing::debug!(tag = %s.tag, by = %s.by, rule = %s.rule, "tag suppressed");
    }

    let best = ctx.best_candidate();
    TagResult {
        played_move: ctx.played.uci.clone(),
        played_san: ctx.played.san.clone(),
        best_move: best.map(|c| c.uci.clone()),
        played_kind: ctx.played.kind,
        best_kind: best.map(|c| c.kind),
        quality: MoveQuality::classify(ctx.delta_eval_cp, ctx.played_is_best()),
        eval_before: ctx.eval_before,
        eval_played: ctx.eval_played,
        eval_best: ctx.eval_best,
        delta_eval: ctx.delta_eval,
        tags,
        suppressed,
        faults: run.faults,
        evidence: run.evidence,
        version: TAGGER_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TagEngine;
    use crate::fixtures;

    fn fired_map(fired: &[Tag]) -> BTreeMap<Tag, TagOutcome> {
        Tag::ALL
            .iter()
            .map(|tag| {
                let outcome = TagOutcome {
                    fired: fired.contains(tag),
                    confidence: if fired.contains(tag) { 0.8 } else { 0.0 },
                };
                (*tag, outcome)
            })
            .collect()
    }

    fn fired_after(tags: &BTreeMap<Tag, TagOutcome>) -> Vec<Tag> {
        tags.iter().filter(|(_, o)| o.fired).map(|(t, _)| *t).collect()
    }

    #[test]
    fn test_move_quality_buckets() {
        assert_eq!(MoveQuality::classify(0, false), MoveQuality::Best);
        assert_eq!(MoveQuality::classify(-5, true), MoveQuality::Best);
        assert_eq!(MoveQuality::classify(-20, false), MoveQuality::Excellent);
        assert_eq!(MoveQuality::classify(-21, false), MoveQuality::Good);
        assert_eq!(MoveQuality::classify(-100, false), MoveQuality::Inaccuracy);
        assert_eq!(MoveQuality::classify(-300, false), MoveQuality::Mistake);
        assert_eq!(MoveQuality::classify(-301, false), MoveQuality::Blunder);
    }

    #[test]
    fn test_direct_hides_generic_prophylaxis() {
        let mut tags = fired_map(&[Tag::ProphylacticMove, Tag::ProphylacticDirect]);
        let suppressed = apply_rules(&mut tags);
        assert_eq!(fired_after(&tags), vec![Tag::ProphylacticDirect]);
        assert_eq!(
            suppressed,
            vec![Suppression {
                tag: Tag::ProphylacticMove,
                by: Tag::ProphylacticDirect,
                rule: "prophylaxis_subtype".to_string(),
            }]
        );
        assert_eq!(tags[&Tag::ProphylacticMove].confidence, 0.0);
    }

    #[test]
    fn test_generic_survives_without_subtype() {
        let mut tags = fired_map(&[Tag::ProphylacticMove, Tag::ControlOverDynamics]);
        assert!(apply_rules(&mut tags).is_empty());
        assert_eq!(fired_after(&tags), vec![Tag::ProphylacticMove, Tag::ControlOverDynamics]);
    }

    #[test]
    fn test_exclusive_group_keeps_priority_winner() {
        let mut tags = fired_map(&[
            Tag::ControlOverDynamics,
            Tag::CodKingSafetyShell,
            Tag::CodFreezeBind,
        ]);
        let suppressed = apply_rules(&mut tags);
        assert_eq!(fired_after(&tags), vec![Tag::CodKingSafetyShell]);
        let rules: Vec<&str> = suppressed.iter().map(|s| s.rule.as_str()).collect();
        assert_eq!(rules, vec!["cod_subtype", "exclusive_cod"]);
        assert_eq!(suppressed[1].tag, Tag::CodFreezeBind);
        assert_eq!(suppressed[1].by, Tag::CodKingSafetyShell);
    }

    #[test]
    fn test_combination_hides_tactical() {
        let mut tags = fired_map(&[Tag::TacticalSacrifice, Tag::CombinationSacrifice]);
        let suppressed = apply_rules(&mut tags);
        assert_eq!(fired_after(&tags), vec![Tag::CombinationSacrifice]);
        assert_eq!(suppressed.len(), 1, "tactical is already gone before the group runs");
    }

    #[test]
    fn test_at_most_one_per_group() {
        let mut tags = fired_map(Tag::ALL);
        apply_rules(&mut tags);
        for group in EXCLUSIVE_GROUPS {
            let count = group.members.iter().filter(|t| tags[*t].fired).count();
            assert_eq!(count, 1, "group {}", group.name);
        }
    }

    #[test]
    fn test_resolve_quiet_move() {
        let ctx = fixtures::quiet();
        let run = TagEngine::new().evaluate(&ctx);
        let result = resolve(&ctx, run);
        assert_eq!(result.tags.len(), Tag::ALL.len());
        assert_eq!(result.version, "2.2");
        assert_eq!(result.quality, MoveQuality::Best);
        assert_eq!(result.best_move.as_deref(), Some("g1f3"));
        assert_eq!(result.played_san, "Nf3");
        assert!(result.is_fired(Tag::FirstChoice));
        assert_eq!(result.evidence.len(), Tag::ALL.len());
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let ctx = fixtures::quiet();
        let result = resolve(&ctx, TagEngine::new().evaluate(&ctx));
        let json = serde_json::to_string(&result).expect("serializes");
        assert!(json.contains("\"first_choice\""));
        let back: TagResult = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back.fired_tags(), result.fired_tags());
    }
}
