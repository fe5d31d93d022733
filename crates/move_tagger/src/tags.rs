//! Canonical tag names
//!
//! The wire name of every tag is part of the stored-data contract: renaming a
//! variant's string breaks historical records. Legacy spellings belong in
//! [`crate::aliases`], never here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Detector family a tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Exchange,
    Sacrifice,
    Prophylaxis,
    Tension,
    Maneuver,
    Initiative,
    Structure,
    ControlOverDynamics,
    Meta,
}

macro_rules! canonical_tags {
    ($($variant:ident => $name:literal, $family:ident;)+) => {
        /// One canonical move tag
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Tag {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl Tag {
            /// Every canonical tag in declaration order
            pub const ALL: &'static [Tag] = &[$(Tag::$variant,)+];

            pub const fn name(self) -> &'static str {
                match self {
                    $(Tag::$variant => $name,)+
                }
            }

            pub const fn family(self) -> Family {
                match self {
                    $(Tag::$variant => Family::$family,)+
                }
            }

            /// Exact lookup of a canonical name; see [`crate::aliases::resolve`] for legacy names
            pub fn from_name(name: &str) -> Option<Tag> {
                match name {
                    $($name => Some(Tag::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

canonical_tags! {
    AccurateKnightBishopExchange => "accurate_knight_bishop_exchange", Exchange;
    InaccurateKnightBishopExchange => "inaccurate_knight_bishop_exchange", Exchange;
    BadKnightBishopExchange => "bad_knight_bishop_exchange", Exchange;

    DesperateSacrifice => "desperate_sacrifice", Sacrifice;
    SpeculativeSacrifice => "speculative_sacrifice", Sacrifice;
    InaccurateTacticalSacrifice => "inaccurate_tactical_sacrifice", Sacrifice;
    TacticalSacrifice => "tactical_sacrifice", Sacrifice;
    PositionalSacrifice => "positional_sacrifice", Sacrifice;
    CombinationSacrifice => "combination_sacrifice", Sacrifice;

    ProphylacticMove => "prophylactic_move", Prophylaxis;
    ProphylacticDirect => "prophylactic_direct", Prophylaxis;
    ProphylacticLatent => "prophylactic_latent", Prophylaxis;
    ProphylacticMeaningless => "prophylactic_meaningless", Prophylaxis;
    FailedProphylactic => "failed_prophylactic", Prophylaxis;

    TensionCreation => "tension_creation", Tension;
    NeutralTensionCreation => "neutral_tension_creation", Tension;
    PrematureAttack => "premature_attack", Tension;

    ConstructiveManeuver => "constructive_maneuver", Maneuver;
    NeutralManeuver => "neutral_maneuver", Maneuver;
    MisplacedManeuver => "misplaced_maneuver", Maneuver;
    ManeuverOpening => "maneuver_opening", Maneuver;
    ManeuverPreparation => "maneuver_preparation", Maneuver;

    InitiativeExploitation => "initiative_exploitation", Initiative;
    InitiativeAttempt => "initiative_attempt", Initiative;
    DeferredInitiative => "deferred_initiative", Initiative;

    StructuralIntegrity => "structural_integrity", Structure;
    StructuralCompromiseDynamic => "structural_compromise_dynamic", Structure;
    StructuralCompromiseStatic => "structural_compromise_static", Structure;

    ControlOverDynamics => "control_over_dynamics", ControlOverDynamics;
    CodSimplify => "cod_simplify", ControlOverDynamics;
    CodKingSafetyShell => "cod_king_safety_shell", ControlOverDynamics;
    CodSpaceClamp => "cod_space_clamp", ControlOverDynamics;
    CodFreezeBind => "cod_freeze_bind", ControlOverDynamics;

    FirstChoice => "first_choice", Meta;
    MissedTactic => "missed_tactic", Meta;
    ConversionPrecision => "conversion_precision", Meta;
    PanicMove => "panic_move", Meta;
    TacticalRecovery => "tactical_recovery", Meta;
    RiskAvoidance => "risk_avoidance", Meta;
    ForcedMove => "forced_move", Meta;
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown canonical tag name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tag '{0}'")]
pub struct UnknownTag(pub String);

impl FromStr for Tag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::from_name(s).ok_or_else(|| UnknownTag(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_size_and_uniqueness() {
        assert_eq!(Tag::ALL.len(), 40);
        let names: HashSet<&str> = Tag::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), 40, "tag names must be unique");
    }

    #[test]
    fn test_name_round_trips_through_from_name() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_name(tag.name()), Some(*tag));
            assert_eq!(tag.name().parse::<Tag>().ok(), Some(*tag));
        }
        assert!("prophylactic".parse::<Tag>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_name() {
        let json = serde_json::to_string(&Tag::CodKingSafetyShell).expect("serialize");
        assert_eq!(json, "\"cod_king_safety_shell\"");
        let tag: Tag = serde_json::from_str("\"bad_knight_bishop_exchange\"").expect("deserialize");
        assert_eq!(tag, Tag::BadKnightBishopExchange);
    }

    #[test]
    fn test_families() {
        assert_eq!(Tag::CodFreezeBind.family(), Family::ControlOverDynamics);
        assert_eq!(Tag::ForcedMove.family(), Family::Meta);
        assert_eq!(
            Tag::ALL.iter().filter(|t| t.family() == Family::Sacrifice).count(),
            6
        );
    }
}
