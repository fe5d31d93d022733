//! Detector catalogue
//!
//! Each family module exports a `DETECTORS` table. Order inside the catalogue
//! is declaration order of [`crate::tags::Tag`], which is also the order of
//! the evidence list in a resolved result.

use shakmaty::Role;

use crate::gate::Detector;

mod control;
mod exchange;
mod initiative;
mod maneuver;
mod meta;
mod prophylaxis;
mod sacrifice;
mod structure;
mod tension;

pub use prophylaxis::{preventive_score, soft_weight};
pub use maneuver::maneuver_quality;

/// Every built-in detector
pub fn catalogue() -> Vec<Detector> {
    [
        exchange::DETECTORS,
        sacrifice::DETECTORS,
        prophylaxis::DETECTORS,
        tension::DETECTORS,
        maneuver::DETECTORS,
        initiative::DETECTORS,
        structure::DETECTORS,
        control::DETECTORS,
        meta::DETECTORS,
    ]
    .concat()
}

pub(crate) fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::Tag;

    #[test]
    fn test_catalogue_covers_every_tag_once() {
        let catalogue = catalogue();
        let tags: Vec<Tag> = catalogue.iter().map(|d| d.tag).collect();
        assert_eq!(tags, Tag::ALL.to_vec(), "one detector per tag, in tag order");
    }

    #[test]
    fn test_every_detector_has_gates() {
        for detector in catalogue() {
            assert!(!detector.gates.is_empty(), "{} has no gates", detector.tag);
            let mut names: Vec<&str> = detector.gates.iter().map(|g| g.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), detector.gates.len(), "{} repeats a gate", detector.tag);
        }
    }
}
