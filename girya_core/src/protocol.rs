//! Protocol assignment and load-level derivation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{
    Benchmarks, DayType, ExerciseDef, Library, PrescriptionType, ProtocolDef,
};

/// Pick a protocol for an exercise's prescription type.
///
/// Easy days restrict the pool to easy-day protocols and work days exclude
/// them; when the preferred side is empty the full matching set is used, so
/// a prescription type with protocols never comes back empty-handed.
pub fn assign_protocol<'a, R: Rng + ?Sized>(
    library: &'a Library,
    prescription: PrescriptionType,
    day_type: DayType,
    rng: &mut R,
) -> Option<&'a ProtocolDef> {
    let matching = library.protocols_for(prescription);
    if matching.is_empty() {
        return None;
    }

    let want_easy = day_type == DayType::Easy;
    let preferred: Vec<&ProtocolDef> = matching
        .iter()
        .filter(|p| p.is_easy_day == want_easy)
        .copied()
        .collect();

    let pool = if preferred.is_empty() { matching } else { preferred };
    pool.choose(rng).copied()
}

/// Derive the load-level string for an exercise on a given day.
///
/// Bodyweight-style work gets a tempo cue; loaded work gets a percentage
/// band plus a bell suggestion from the user's owned bells when known.
pub fn load_level(exercise: &ExerciseDef, day_type: DayType, benchmarks: &Benchmarks) -> String {
    match exercise.prescription_type {
        PrescriptionType::BwDynamic
        | PrescriptionType::IsometricHold
        | PrescriptionType::CrawlTime => match day_type {
            DayType::Easy => "Slow tempo".to_string(),
            _ => "Standard".to_string(),
        },
        PrescriptionType::KbStrength
        | PrescriptionType::PowerSwing
        | PrescriptionType::CarryTime => {
            let base = match day_type {
                DayType::Easy => "Light (60-70%)",
                DayType::Medium => "Moderate (75-85%)",
                DayType::Hard => "Heavy (85-95%)",
            };
            match suggest_bell(benchmarks, day_type) {
                Some(kg) => format!("{base} @ {kg}kg"),
                None => base.to_string(),
            }
        }
    }
}

/// Pick a bell from the owned list by day intensity: lightest on easy days,
/// heaviest on hard days, the middle of the rack otherwise.
fn suggest_bell(benchmarks: &Benchmarks, day_type: DayType) -> Option<u32> {
    let mut bells = benchmarks.available_bells_kg.clone();
    if bells.is_empty() {
        return None;
    }
    bells.sort_unstable();
    let idx = match day_type {
        DayType::Easy => 0,
        DayType::Medium => bells.len() / 2,
        DayType::Hard => bells.len() - 1,
    };
    Some(bells[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::build_default_library;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_easy_day_picks_easy_protocols() {
        let library = build_default_library();
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let proto = assign_protocol(
                &library,
                PrescriptionType::KbStrength,
                DayType::Easy,
                &mut rng,
            )
            .unwrap();
            assert!(proto.is_easy_day, "picked {} on an easy day", proto.id);
        }
    }

    #[test]
    fn test_work_days_exclude_easy_protocols() {
        let library = build_default_library();
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let proto = assign_protocol(
                &library,
                PrescriptionType::KbStrength,
                DayType::Hard,
                &mut rng,
            )
            .unwrap();
            assert!(!proto.is_easy_day, "picked {} on a hard day", proto.id);
        }
    }

    #[test]
    fn test_easy_day_falls_back_when_no_easy_variant_exists() {
        // Power has no easy-day protocols; the full matching set is used
        let library = build_default_library();
        let mut rng = StdRng::seed_from_u64(5);
        let proto = assign_protocol(
            &library,
            PrescriptionType::PowerSwing,
            DayType::Easy,
            &mut rng,
        );
        assert!(proto.is_some());
    }

    #[test]
    fn test_volume_kind_follows_prescription() {
        let library = build_default_library();
        let mut rng = StdRng::seed_from_u64(11);
        let hold = assign_protocol(
            &library,
            PrescriptionType::IsometricHold,
            DayType::Medium,
            &mut rng,
        )
        .unwrap();
        assert!(hold.volume.matches(PrescriptionType::IsometricHold));
        assert_eq!(hold.volume.label(), "hold");
    }

    #[test]
    fn test_bodyweight_load_levels() {
        let library = build_default_library();
        let pushup = library.exercise("pushup").unwrap();
        let bench = Benchmarks::default();
        assert_eq!(load_level(pushup, DayType::Easy, &bench), "Slow tempo");
        assert_eq!(load_level(pushup, DayType::Hard, &bench), "Standard");
    }

    #[test]
    fn test_loaded_work_gets_band_and_bell() {
        let library = build_default_library();
        let squat = library.exercise("kb_goblet_squat").unwrap();
        let bench = Benchmarks::default(); // bells 16/24/28/32
        assert_eq!(load_level(squat, DayType::Easy, &bench), "Light (60-70%) @ 16kg");
        assert_eq!(
            load_level(squat, DayType::Medium, &bench),
            "Moderate (75-85%) @ 28kg"
        );
        assert_eq!(
            load_level(squat, DayType::Hard, &bench),
            "Heavy (85-95%) @ 32kg"
        );
    }

    #[test]
    fn test_no_bells_degrades_to_plain_band() {
        let library = build_default_library();
        let squat = library.exercise("kb_goblet_squat").unwrap();
        let bench = Benchmarks {
            available_bells_kg: vec![],
            ..Benchmarks::default()
        };
        assert_eq!(load_level(squat, DayType::Hard, &bench), "Heavy (85-95%)");
    }
}
