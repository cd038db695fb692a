//! Exercise selection.
//!
//! Selection narrows the library down in stages: equipment compatibility,
//! hard exclusions, the power gate, then soft preferences (repeat avoidance,
//! anchors, week mode). Preferences shrink the pool only when something
//! survives them; the final pick among peers is uniformly random.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{Bucket, Equipment, ExerciseDef, Library, WeekMode};

/// Knobs applied on top of the equipment filter
#[derive(Clone, Copy, Debug)]
pub struct SelectionPrefs {
    pub week_mode: WeekMode,
    /// Power-gated exercises are dropped from the pool when false
    pub allow_power: bool,
    /// Restrict to anchor exercises when the category has any
    pub prefer_anchor: bool,
}

/// Select one exercise from a category, or `None` when the category has no
/// eligible candidate.
///
/// `exclude` is a hard exclusion (Swap/Reroll guarantees); `avoid` is soft
/// and is dropped rather than emptying the pool (repeat avoidance).
pub fn select_exercise<'a, R: Rng + ?Sized>(
    library: &'a Library,
    category: Bucket,
    equipment: Equipment,
    prefs: &SelectionPrefs,
    exclude: &[String],
    avoid: &[String],
    rng: &mut R,
) -> Option<&'a ExerciseDef> {
    let mut candidates: Vec<&ExerciseDef> = library
        .exercises_in(category)
        .into_iter()
        .filter(|ex| ex.supports(equipment))
        .filter(|ex| !exclude.iter().any(|id| id == &ex.id))
        .filter(|ex| prefs.allow_power || !ex.is_power)
        .collect();

    if candidates.is_empty() {
        return None;
    }

    // Soft repeat avoidance
    let kept: Vec<&ExerciseDef> = candidates
        .iter()
        .filter(|ex| !avoid.iter().any(|id| id == &ex.id))
        .copied()
        .collect();
    if !kept.is_empty() {
        candidates = kept;
    }

    // Anchor preference
    if prefs.prefer_anchor {
        let anchors: Vec<&ExerciseDef> =
            candidates.iter().filter(|ex| ex.is_anchor).copied().collect();
        if !anchors.is_empty() {
            candidates = anchors;
        }
    }

    // Week-mode preference: A leans bilateral everywhere, B leans
    // unilateral for the leg patterns
    match prefs.week_mode {
        WeekMode::A => {
            let bilateral: Vec<&ExerciseDef> =
                candidates.iter().filter(|ex| ex.bilateral).copied().collect();
            if !bilateral.is_empty() {
                candidates = bilateral;
            }
        }
        WeekMode::B if matches!(category, Bucket::Squat | Bucket::Hinge) => {
            let unilateral: Vec<&ExerciseDef> =
                candidates.iter().filter(|ex| !ex.bilateral).copied().collect();
            if !unilateral.is_empty() {
                candidates = unilateral;
            }
        }
        WeekMode::B => {}
    }

    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::build_default_library;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn prefs(week_mode: WeekMode) -> SelectionPrefs {
        SelectionPrefs {
            week_mode,
            allow_power: false,
            prefer_anchor: true,
        }
    }

    #[test]
    fn test_equipment_filter_is_hard() {
        let library = build_default_library();
        let mut rng = StdRng::seed_from_u64(7);
        for seed in 0..30 {
            rng = StdRng::seed_from_u64(seed);
            let picked = select_exercise(
                &library,
                Bucket::Push,
                Equipment::Bodyweight,
                &prefs(WeekMode::A),
                &[],
                &[],
                &mut rng,
            )
            .unwrap();
            assert!(picked.supports(Equipment::Bodyweight), "picked {}", picked.id);
        }
    }

    #[test]
    fn test_no_candidate_returns_none() {
        // Every carry needs a bell
        let library = build_default_library();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = select_exercise(
            &library,
            Bucket::Carry,
            Equipment::Bodyweight,
            &prefs(WeekMode::A),
            &[],
            &[],
            &mut rng,
        );
        assert!(picked.is_none());
    }

    #[test]
    fn test_power_gate_filters_the_swing() {
        let library = build_default_library();
        let settings = SelectionPrefs {
            week_mode: WeekMode::A,
            allow_power: false,
            prefer_anchor: false,
        };
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_exercise(
                &library,
                Bucket::Hinge,
                Equipment::Minimal,
                &settings,
                &[],
                &[],
                &mut rng,
            )
            .unwrap();
            assert_ne!(picked.id, "kb_swing");
        }
    }

    #[test]
    fn test_power_appears_when_allowed() {
        let library = build_default_library();
        let settings = SelectionPrefs {
            week_mode: WeekMode::A,
            allow_power: true,
            prefer_anchor: false,
        };
        let seen_swing = (0..60).any(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            select_exercise(
                &library,
                Bucket::Hinge,
                Equipment::Minimal,
                &settings,
                &[],
                &[],
                &mut rng,
            )
            .map(|ex| ex.id == "kb_swing")
            .unwrap_or(false)
        });
        assert!(seen_swing);
    }

    #[test]
    fn test_hard_exclusion_never_reappears() {
        let library = build_default_library();
        let exclude = vec!["pushup".to_string()];
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_exercise(
                &library,
                Bucket::Push,
                Equipment::Bodyweight,
                &SelectionPrefs {
                    week_mode: WeekMode::A,
                    allow_power: false,
                    prefer_anchor: false,
                },
                &exclude,
                &[],
                &mut rng,
            )
            .unwrap();
            assert_ne!(picked.id, "pushup");
        }
    }

    #[test]
    fn test_excluding_everything_returns_none() {
        let library = build_default_library();
        let all_pull: Vec<String> = library
            .exercises_in(Bucket::Pull)
            .iter()
            .map(|ex| ex.id.clone())
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let picked = select_exercise(
            &library,
            Bucket::Pull,
            Equipment::Home,
            &prefs(WeekMode::A),
            &all_pull,
            &[],
            &mut rng,
        );
        assert!(picked.is_none());
    }

    #[test]
    fn test_soft_avoidance_degrades_instead_of_failing() {
        let library = build_default_library();
        let all_crawl: Vec<String> = library
            .exercises_in(Bucket::Crawl)
            .iter()
            .map(|ex| ex.id.clone())
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let picked = select_exercise(
            &library,
            Bucket::Crawl,
            Equipment::Bodyweight,
            &prefs(WeekMode::A),
            &[],
            &all_crawl,
            &mut rng,
        );
        assert!(picked.is_some());
    }

    #[test]
    fn test_week_a_prefers_the_bilateral_anchor() {
        let library = build_default_library();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_exercise(
                &library,
                Bucket::Squat,
                Equipment::Minimal,
                &prefs(WeekMode::A),
                &[],
                &[],
                &mut rng,
            )
            .unwrap();
            assert_eq!(picked.id, "single_kb_front_squat");
        }
    }

    #[test]
    fn test_week_b_prefers_the_single_leg_anchor() {
        let library = build_default_library();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_exercise(
                &library,
                Bucket::Squat,
                Equipment::Minimal,
                &prefs(WeekMode::B),
                &[],
                &[],
                &mut rng,
            )
            .unwrap();
            assert_eq!(picked.id, "kb_split_squat");
        }
    }

    #[test]
    fn test_same_seed_same_pick() {
        let library = build_default_library();
        let settings = SelectionPrefs {
            week_mode: WeekMode::B,
            allow_power: false,
            prefer_anchor: false,
        };
        let pick = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            select_exercise(
                &library,
                Bucket::Push,
                Equipment::Home,
                &settings,
                &[],
                &[],
                &mut rng,
            )
            .map(|ex| ex.id.clone())
        };
        assert_eq!(pick(42), pick(42));
    }
}
