//! Legacy tag names
//!
//! Older stored analyses used shorthand, misspelled and since-renamed tag
//! names. This table maps each of them to its canonical [`Tag`]. It is only
//! consulted when reading historical records; fresh results always carry
//! canonical names.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use crate::tags::Tag;

static ALIASES: Lazy<HashMap<&'static str, Tag>> = Lazy::new(|| {
    HashMap::from([
        // exchange
        ("accurate_nb_exchange", Tag::AccurateKnightBishopExchange),
        ("inaccurate_nb_exchange", Tag::InaccurateKnightBishopExchange),
        ("bad_nb_exchange", Tag::BadKnightBishopExchange),
        ("knight_bishop_exchange_bad", Tag::BadKnightBishopExchange),
        // sacrifice
        ("desperate_sac", Tag::DesperateSacrifice),
        ("speculative_sac", Tag::SpeculativeSacrifice),
        ("tactical_sac", Tag::TacticalSacrifice),
        ("positional_sac", Tag::PositionalSacrifice),
        ("combination", Tag::CombinationSacrifice),
        ("inaccurate_tactical_sac", Tag::InaccurateTacticalSacrifice),
        ("sacrifice_desperate", Tag::DesperateSacrifice),
        // prophylaxis
        ("prophylaxis", Tag::ProphylacticMove),
        ("prophylactic", Tag::ProphylacticMove),
        ("direct_prophylaxis", Tag::ProphylacticDirect),
        ("latent_prophylaxis", Tag::ProphylacticLatent),
        ("meaningless_prophylaxis", Tag::ProphylacticMeaningless),
        ("failed_prophylaxis", Tag::FailedProphylactic),
        ("prophylatic_move", Tag::ProphylacticMove),
        // tension
        ("tension", Tag::TensionCreation),
        ("neutral_tension", Tag::NeutralTensionCreation),
        ("premature_tension", Tag::PrematureAttack),
        // maneuver
        ("constructive_maneuvre", Tag::ConstructiveManeuver),
        ("neutral_maneuvre", Tag::NeutralManeuver),
        ("misplaced_maneuvre", Tag::MisplacedManeuver),
        ("maneuvre_opening", Tag::ManeuverOpening),
        ("maneuvre_preparation", Tag::ManeuverPreparation),
        ("opening_maneuver", Tag::ManeuverOpening),
        // initiative
        ("initiative", Tag::InitiativeExploitation),
        ("initiative_exploit", Tag::InitiativeExploitation),
        ("deferred_initative", Tag::DeferredInitiative),
        // structure
        ("structure_integrity", Tag::StructuralIntegrity),
        ("structural_compromise_dyn", Tag::StructuralCompromiseDynamic),
        ("structural_compromise", Tag::StructuralCompromiseStatic),
        // control over dynamics
        ("cod", Tag::ControlOverDynamics),
        ("control_over_dynamics_simplify", Tag::CodSimplify),
        ("cod_king_shell", Tag::CodKingSafetyShell),
        ("space_clamp", Tag::CodSpaceClamp),
        ("freeze_bind", Tag::CodFreezeBind),
        // meta
        ("first_choice_move", Tag::FirstChoice),
        ("engine_first_choice", Tag::FirstChoice),
        ("missed_tactics", Tag::MissedTactic),
        ("conversion", Tag::ConversionPrecision),
        ("panic", Tag::PanicMove),
        ("recovery", Tag::TacticalRecovery),
        ("risk_avoid", Tag::RiskAvoidance),
        ("only_move", Tag::ForcedMove),
    ])
});

/// Trim, lowercase, and turn `-` and spaces into `_`
pub fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Canonical tag for a canonical or legacy name
pub fn resolve_tag(name: &str) -> Option<Tag> {
    let key = normalize(name);
    Tag::from_name(&key).or_else(|| ALIASES.get(key.as_str()).copied())
}

/// Canonical name for `name`; unknown names come back normalised
pub fn resolve(name: &str) -> String {
    match resolve_tag(name) {
        Some(tag) => tag.name().to_string(),
        None => normalize(name),
    }
}

/// Number of legacy names in the table
pub fn alias_count() -> usize {
    ALIASES.len()
}

/// A legacy record folded onto canonical tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Migration {
    pub tags: BTreeMap<Tag, bool>,
    pub unknown: Vec<String>,
}

/// Fold `(name, value)` pairs into canonical tags, OR-ing values that land on
/// the same tag
pub fn migrate_tags<'a, I>(record: I) -> Migration
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut migration = Migration::default();
    for (name, value) in record {
        match resolve_tag(name) {
            Some(tag) => *migration.tags.entry(tag).or_insert(false) |= value,
            None => {
                tracing::debug!(name, "unknown legacy tag");
                migration.unknown.push(name.to_string());
            }
        }
    }
    migration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_consistent() {
        for (alias, tag) in ALIASES.iter() {
            assert_eq!(normalize(alias), *alias, "alias key '{alias}' is not normalised");
            assert!(Tag::from_name(alias).is_none(), "alias '{alias}' shadows a canonical name");
            assert_eq!(Tag::from_name(tag.name()), Some(*tag));
        }
        assert!(alias_count() > 40);
    }

    #[test]
    fn test_normalisation() {
        assert_eq!(normalize("  Direct-Prophylaxis "), "direct_prophylaxis");
        assert_eq!(resolve("Direct Prophylaxis"), "prophylactic_direct");
        assert_eq!(resolve("FIRST_CHOICE"), "first_choice");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let names = ["prophylaxis", "cod", "Tactical-Sac", "something else", "forced_move"];
        for name in names {
            let once = resolve(name);
            assert_eq!(resolve(&once), once, "resolve('{name}') not idempotent");
        }
        for tag in Tag::ALL {
            assert_eq!(resolve(tag.name()), tag.name());
        }
    }

    #[test]
    fn test_unknown_names_pass_through_normalised() {
        assert_eq!(resolve("Brand New-Tag"), "brand_new_tag");
        assert_eq!(resolve_tag("brand_new_tag"), None);
    }

    #[test]
    fn test_migrate_ors_duplicates() {
        let migration = migrate_tags([
            ("prophylaxis", false),
            ("prophylactic_move", true),
            ("only_move", false),
            ("mystery", true),
        ]);
        assert_eq!(migration.tags[&Tag::ProphylacticMove], true);
        assert_eq!(migration.tags[&Tag::ForcedMove], false);
        assert_eq!(migration.tags.len(), 2);
        assert_eq!(migration.unknown, vec!["mystery"]);
    }
}
