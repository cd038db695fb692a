//! Built-in exercise and protocol library.
//!
//! The library is the locked data the engine selects from: forty exercises
//! across six movement categories, and the set/rep/time protocols that go
//! with each prescription type.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default library - built once and reused across all operations
static DEFAULT_LIBRARY: Lazy<Library> = Lazy::new(build_default_library_internal);

/// Get a reference to the cached default library
pub fn get_default_library() -> &'static Library {
    &DEFAULT_LIBRARY
}

/// Builds the default library from scratch
///
/// **Note**: For production use, prefer `get_default_library()` which returns
/// a cached reference. This function is retained for testing and custom
/// library creation.
pub fn build_default_library() -> Library {
    build_default_library_internal()
}

fn exercise(
    id: &str,
    name: &str,
    category: Bucket,
    equipment: &[Equipment],
    bilateral: bool,
    is_anchor: bool,
    prescription_type: PrescriptionType,
) -> ExerciseDef {
    ExerciseDef {
        id: id.into(),
        name: name.into(),
        category,
        equipment: equipment.to_vec(),
        bilateral,
        is_anchor,
        is_power: prescription_type == PrescriptionType::PowerSwing,
        prescription_type,
    }
}

/// Internal function that actually builds the library
fn build_default_library_internal() -> Library {
    use Bucket::*;
    use Equipment::*;
    use PrescriptionType::*;

    let mut exercises = HashMap::new();
    let mut protocols = HashMap::new();

    let all = [Home, Minimal, Bodyweight];
    let loaded = [Home, Minimal];
    let home_only = [Home];

    // ========================================================================
    // Exercises: squat
    // ========================================================================

    for ex in [
        exercise("kb_goblet_squat", "KB Goblet Squat", Squat, &loaded, true, false, KbStrength),
        exercise("single_kb_front_squat", "Single KB Front Squat", Squat, &loaded, true, true, KbStrength),
        exercise("double_kb_front_squat", "Double KB Front Squat", Squat, &home_only, true, true, KbStrength),
        exercise("kb_split_squat", "KB Split Squat", Squat, &loaded, false, true, KbStrength),
        exercise("kb_rfess", "KB Rear Foot Elevated Split Squat", Squat, &home_only, false, true, KbStrength),
        exercise("atg_split_squat", "ATG Split Squat", Squat, &all, false, false, BwDynamic),
        exercise("rear_leg_assisted_shrimp", "Rear Leg Assisted Shrimp", Squat, &all, false, false, BwDynamic),
        exercise("kb_lunge", "KB Lunge", Squat, &loaded, false, false, KbStrength),
        exercise("bw_lunge", "Bodyweight Lunge", Squat, &all, false, false, BwDynamic),
    ] {
        exercises.insert(ex.id.clone(), ex);
    }

    // ========================================================================
    // Exercises: hinge
    // ========================================================================

    for ex in [
        exercise("kb_sumo_deadlift", "KB Sumo Deadlift", Hinge, &loaded, true, false, KbStrength),
        exercise("kb_suitcase_deadlift", "KB Suitcase Deadlift", Hinge, &loaded, false, false, KbStrength),
        exercise("single_leg_kb_deadlift", "Single Leg KB Deadlift", Hinge, &loaded, false, true, KbStrength),
        exercise("hip_thrust", "Hip Thrust", Hinge, &home_only, true, true, KbStrength),
        exercise("single_leg_hip_thrust", "Single Leg Hip Thrust", Hinge, &all, false, false, BwDynamic),
        exercise("band_hip_thrust", "Band Hip Thrust", Hinge, &home_only, true, false, BwDynamic),
        exercise("kb_swing", "KB Swing", Hinge, &loaded, true, false, PowerSwing),
    ] {
        exercises.insert(ex.id.clone(), ex);
    }

    // ========================================================================
    // Exercises: push
    // ========================================================================

    for ex in [
        exercise("pushup", "Push-up", Push, &all, true, true, BwDynamic),
        exercise("kb_press_single", "KB Military Press (Single)", Push, &loaded, false, true, KbStrength),
        exercise("kb_press_double", "KB Military Press (Double)", Push, &home_only, true, true, KbStrength),
        exercise("floor_press_single", "Floor Press (Single)", Push, &loaded, false, false, KbStrength),
        exercise("floor_press_double", "Floor Press (Double)", Push, &home_only, true, false, KbStrength),
        exercise("diamond_pushup", "Diamond Push-up", Push, &all, true, false, BwDynamic),
        exercise("deficit_pushup", "Deficit Push-up", Push, &all, true, false, BwDynamic),
        exercise("sfg_plank", "SFG Plank", Push, &all, true, false, IsometricHold),
        exercise("pushup_plank", "Push-up Plank", Push, &all, true, false, IsometricHold),
    ] {
        exercises.insert(ex.id.clone(), ex);
    }

    // ========================================================================
    // Exercises: pull
    // ========================================================================

    for ex in [
        exercise("pullup", "Pull-up", Pull, &home_only, true, true, BwDynamic),
        exercise("chinup", "Chin-up", Pull, &home_only, true, true, BwDynamic),
        exercise("australian_pullup", "Australian Pull-up", Pull, &home_only, true, false, BwDynamic),
        exercise("kb_row", "KB Row", Pull, &loaded, false, false, KbStrength),
        exercise("bw_batwing_hold", "Bodyweight Batwing Hold", Pull, &all, true, false, IsometricHold),
    ] {
        exercises.insert(ex.id.clone(), ex);
    }

    // ========================================================================
    // Exercises: carry and locomotion
    // ========================================================================

    for ex in [
        exercise("farmer_carry", "Farmer Carry", Carry, &loaded, true, true, CarryTime),
        exercise("suitcase_carry", "Suitcase Carry", Carry, &loaded, false, false, CarryTime),
        exercise("rack_carry", "Rack Carry", Carry, &loaded, false, false, CarryTime),
        exercise("overhead_carry", "Overhead Carry", Carry, &loaded, false, false, CarryTime),
        exercise("bottom_up_carry", "Bottom Up Carry", Carry, &loaded, false, false, CarryTime),
        exercise("stationary_march_goblet", "Stationary March (Goblet)", Carry, &loaded, true, false, CarryTime),
        exercise("stationary_march_rack", "Stationary March (Rack)", Carry, &loaded, false, false, CarryTime),
        exercise("stationary_march_overhead", "Stationary March (Overhead)", Carry, &loaded, false, false, CarryTime),
        exercise("bear_crawl", "Bear Crawl", Crawl, &all, true, false, CrawlTime),
        exercise("tiger_crawl", "Tiger Crawl", Crawl, &all, true, false, CrawlTime),
    ] {
        exercises.insert(ex.id.clone(), ex);
    }

    // ========================================================================
    // Protocols: kettlebell strength
    // ========================================================================

    protocols.insert(
        "kb_ladder_123".into(),
        ProtocolDef {
            id: "kb_ladder_123".into(),
            name: "Ladder 1-2-3".into(),
            prescription_type: KbStrength,
            description: "Climb 1, 2, 3 reps per side, rest, start again from 1.".into(),
            example: "4 ladders of (1, 2, 3) = 24 total reps".into(),
            sets: "3-5 ladders".into(),
            volume: Volume::Reps("1,2,3".into()),
            rest: "60-90s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "kb_ladder_12345".into(),
        ProtocolDef {
            id: "kb_ladder_12345".into(),
            name: "Ladder 1-2-3-4-5".into(),
            prescription_type: KbStrength,
            description: "Full ladder to 5. Drop back to 1 when a rung grinds.".into(),
            example: "2 ladders of (1..5) = 30 total reps".into(),
            sets: "2-3 ladders".into(),
            volume: Volume::Reps("1,2,3,4,5".into()),
            rest: "60-90s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "kb_sets_across".into(),
        ProtocolDef {
            id: "kb_sets_across".into(),
            name: "Sets Across".into(),
            prescription_type: KbStrength,
            description: "Same weight, same reps, every set.".into(),
            example: "4 x 5 with the 24kg".into(),
            sets: "3-5".into(),
            volume: Volume::Reps("5".into()),
            rest: "60-90s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "kb_density".into(),
        ProtocolDef {
            id: "kb_density".into(),
            name: "Density Block".into(),
            prescription_type: KbStrength,
            description: "As many quality sets as the block allows. Stop sets far from failure.".into(),
            example: "10 min of 3s on the minute-ish".into(),
            sets: "AMRAP".into(),
            volume: Volume::Reps("3-5".into()),
            rest: "10 min total".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "kb_light_practice".into(),
        ProtocolDef {
            id: "kb_light_practice".into(),
            name: "Light Practice".into(),
            prescription_type: KbStrength,
            description: "Greasing the groove with a light bell. Crisp reps, nothing taxing.".into(),
            example: "3 x 3 with a bell two sizes down".into(),
            sets: "2-3".into(),
            volume: Volume::Reps("3-5".into()),
            rest: "90s".into(),
            tempo: None,
            is_easy_day: true,
        },
    );

    // ========================================================================
    // Protocols: bodyweight dynamic
    // ========================================================================

    protocols.insert(
        "bw_sets_across".into(),
        ProtocolDef {
            id: "bw_sets_across".into(),
            name: "Sets Across".into(),
            prescription_type: BwDynamic,
            description: "Fixed reps every set, two or three reps shy of failure.".into(),
            example: "4 x 6 push-ups".into(),
            sets: "3-5".into(),
            volume: Volume::Reps("5-8".into()),
            rest: "60-90s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "bw_ladder_123".into(),
        ProtocolDef {
            id: "bw_ladder_123".into(),
            name: "Ladder 1-2-3".into(),
            prescription_type: BwDynamic,
            description: "Climb 1, 2, 3 reps, shake out, start again.".into(),
            example: "4 ladders of pull-ups".into(),
            sets: "3-5 ladders".into(),
            volume: Volume::Reps("1,2,3".into()),
            rest: "60s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "bw_total_reps".into(),
        ProtocolDef {
            id: "bw_total_reps".into(),
            name: "Total Reps Target".into(),
            prescription_type: BwDynamic,
            description: "Accumulate the target in as many sets as needed.".into(),
            example: "40 push-ups in sets of 8-10".into(),
            sets: "As needed".into(),
            volume: Volume::Reps("Total 25-50".into()),
            rest: "As needed".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "bw_movement_flow".into(),
        ProtocolDef {
            id: "bw_movement_flow".into(),
            name: "Movement Flow".into(),
            prescription_type: BwDynamic,
            description: "Unhurried reps, full range, focus on position.".into(),
            example: "3 x 5 slow lunges per side".into(),
            sets: "2-3".into(),
            volume: Volume::Reps("5".into()),
            rest: "As needed".into(),
            tempo: Some("3s down, 3s up".into()),
            is_easy_day: true,
        },
    );

    // ========================================================================
    // Protocols: isometric holds
    // ========================================================================

    protocols.insert(
        "iso_long_holds".into(),
        ProtocolDef {
            id: "iso_long_holds".into(),
            name: "Long Holds".into(),
            prescription_type: IsometricHold,
            description: "Hold with steady breathing. End the set before shaking starts.".into(),
            example: "4 x 25s SFG plank".into(),
            sets: "3-5".into(),
            volume: Volume::HoldTime("20-30s".into()),
            rest: "60s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "iso_max_tension".into(),
        ProtocolDef {
            id: "iso_max_tension".into(),
            name: "Max Tension Holds".into(),
            prescription_type: IsometricHold,
            description: "Short holds at full-body tension. Quality over duration.".into(),
            example: "3 x 12s, squeezing everything".into(),
            sets: "3-4".into(),
            volume: Volume::HoldTime("10-15s".into()),
            rest: "60-90s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "iso_easy_holds".into(),
        ProtocolDef {
            id: "iso_easy_holds".into(),
            name: "Easy Holds".into(),
            prescription_type: IsometricHold,
            description: "Comfortable holds well short of effort.".into(),
            example: "2 x 15s, breathing through".into(),
            sets: "2-3".into(),
            volume: Volume::HoldTime("15-20s".into()),
            rest: "As needed".into(),
            tempo: None,
            is_easy_day: true,
        },
    );

    // ========================================================================
    // Protocols: carries
    // ========================================================================

    protocols.insert(
        "carry_timed".into(),
        ProtocolDef {
            id: "carry_timed".into(),
            name: "Timed Carry".into(),
            prescription_type: CarryTime,
            description: "Walk tall for the duration, roughly 20-40m per set.".into(),
            example: "3 x 45s farmer carry".into(),
            sets: "3-4".into(),
            volume: Volume::Time("30-60s".into()),
            rest: "60s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "carry_easy".into(),
        ProtocolDef {
            id: "carry_easy".into(),
            name: "Easy Carry".into(),
            prescription_type: CarryTime,
            description: "Light load, short walks, posture practice.".into(),
            example: "2 x 25s with a light bell".into(),
            sets: "2-3".into(),
            volume: Volume::Time("20-30s".into()),
            rest: "As needed".into(),
            tempo: None,
            is_easy_day: true,
        },
    );

    // ========================================================================
    // Protocols: crawls
    // ========================================================================

    protocols.insert(
        "crawl_timed".into(),
        ProtocolDef {
            id: "crawl_timed".into(),
            name: "Timed Crawl".into(),
            prescription_type: CrawlTime,
            description: "Crawl smooth and quiet, roughly 10-20m per set.".into(),
            example: "4 x 25s bear crawl".into(),
            sets: "3-5".into(),
            volume: Volume::Time("20-30s".into()),
            rest: "30-60s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "crawl_easy".into(),
        ProtocolDef {
            id: "crawl_easy".into(),
            name: "Easy Crawl".into(),
            prescription_type: CrawlTime,
            description: "Short, slow crawls as movement practice.".into(),
            example: "2 x 15s tiger crawl".into(),
            sets: "2-3".into(),
            volume: Volume::Time("15-20s".into()),
            rest: "As needed".into(),
            tempo: None,
            is_easy_day: true,
        },
    );

    // ========================================================================
    // Protocols: power swings
    // ========================================================================

    protocols.insert(
        "power_otm".into(),
        ProtocolDef {
            id: "power_otm".into(),
            name: "On the Minute".into(),
            prescription_type: PowerSwing,
            description: "A crisp set at the top of every minute. Stop when power drops.".into(),
            example: "12 minutes of 10 swings".into(),
            sets: "10-15".into(),
            volume: Volume::Reps("10".into()),
            rest: "Top of min".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    protocols.insert(
        "power_sets_across".into(),
        ProtocolDef {
            id: "power_sets_across".into(),
            name: "Sets Across".into(),
            prescription_type: PowerSwing,
            description: "Hard swings, full rest, every set as fast as the first.".into(),
            example: "8 x 12 swings".into(),
            sets: "5-10".into(),
            volume: Volume::Reps("10-15".into()),
            rest: "60s".into(),
            tempo: None,
            is_easy_day: false,
        },
    );

    Library {
        exercises,
        protocols,
    }
}

impl Library {
    /// Validate the library for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, ex) in &self.exercises {
            if id.is_empty() || ex.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &ex.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, ex.id
                ));
            }
            if ex.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }
            if ex.equipment.is_empty() {
                errors.push(format!("Exercise '{}' has no equipment contexts", id));
            }
            if ex.is_power != (ex.prescription_type == PrescriptionType::PowerSwing) {
                errors.push(format!(
                    "Exercise '{}' power flag disagrees with its prescription type",
                    id
                ));
            }
        }

        for (id, proto) in &self.protocols {
            if id.is_empty() || proto.id.is_empty() {
                errors.push("Protocol has empty ID".to_string());
            }
            if id != &proto.id {
                errors.push(format!(
                    "Protocol key '{}' doesn't match protocol.id '{}'",
                    id, proto.id
                ));
            }
            if proto.name.is_empty() {
                errors.push(format!("Protocol '{}' has empty name", id));
            }
            if !proto.volume.matches(proto.prescription_type) {
                errors.push(format!(
                    "Protocol '{}' carries a {} volume, which its prescription type doesn't use",
                    id,
                    proto.volume.label()
                ));
            }
        }

        // Every prescription type in use must have at least one protocol
        for ex in self.exercises.values() {
            if self.protocols_for(ex.prescription_type).is_empty() {
                errors.push(format!(
                    "No protocol available for prescription type {:?} (exercise '{}')",
                    ex.prescription_type, ex.id
                ));
            }
        }

        // Every rotation bucket must be coverable in every equipment context,
        // otherwise generation can fail on a default install
        for equipment in [Equipment::Home, Equipment::Minimal, Equipment::Bodyweight] {
            for bucket in BUCKET_ROTATION {
                let covered = self
                    .exercises
                    .values()
                    .any(|ex| ex.category == bucket && ex.supports(equipment));
                if !covered {
                    errors.push(format!(
                        "No {} exercise available in the {} context",
                        bucket, equipment
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_loads() {
        let library = build_default_library();
        assert_eq!(library.exercises.len(), 40);
        assert_eq!(library.protocols.len(), 18);
    }

    #[test]
    fn test_default_library_validates() {
        let library = build_default_library();
        let errors = library.validate();
        assert!(
            errors.is_empty(),
            "Default library has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_category_counts() {
        let library = build_default_library();
        assert_eq!(library.exercises_in(Bucket::Squat).len(), 9);
        assert_eq!(library.exercises_in(Bucket::Hinge).len(), 7);
        assert_eq!(library.exercises_in(Bucket::Push).len(), 9);
        assert_eq!(library.exercises_in(Bucket::Pull).len(), 5);
        assert_eq!(library.exercises_in(Bucket::Carry).len(), 8);
        assert_eq!(library.exercises_in(Bucket::Crawl).len(), 2);
    }

    #[test]
    fn test_swing_is_the_only_power_exercise() {
        let library = build_default_library();
        let power: Vec<_> = library
            .exercises
            .values()
            .filter(|ex| ex.is_power)
            .collect();
        assert_eq!(power.len(), 1);
        assert_eq!(power[0].id, "kb_swing");
        assert_eq!(power[0].prescription_type, PrescriptionType::PowerSwing);
    }

    #[test]
    fn test_every_prescription_type_has_protocols() {
        let library = build_default_library();
        for prescription in [
            PrescriptionType::KbStrength,
            PrescriptionType::BwDynamic,
            PrescriptionType::IsometricHold,
            PrescriptionType::CarryTime,
            PrescriptionType::CrawlTime,
            PrescriptionType::PowerSwing,
        ] {
            assert!(
                !library.protocols_for(prescription).is_empty(),
                "No protocols for {:?}",
                prescription
            );
        }
    }

    #[test]
    fn test_protocol_volume_kinds_match_types() {
        let library = build_default_library();
        for proto in library.protocols.values() {
            assert!(
                proto.volume.matches(proto.prescription_type),
                "Protocol {} has a mismatched volume kind",
                proto.id
            );
        }
    }

    #[test]
    fn test_bodyweight_covers_every_rotation_bucket() {
        let library = build_default_library();
        for bucket in BUCKET_ROTATION {
            let candidates: Vec<_> = library
                .exercises_in(bucket)
                .into_iter()
                .filter(|ex| ex.supports(Equipment::Bodyweight))
                .collect();
            assert!(
                !candidates.is_empty(),
                "No bodyweight option for {}",
                bucket
            );
        }
    }

    #[test]
    fn test_carries_need_a_bell() {
        // Carries are loaded movements; bodyweight sessions skip the slot
        let library = build_default_library();
        assert!(library
            .exercises_in(Bucket::Carry)
            .iter()
            .all(|ex| !ex.supports(Equipment::Bodyweight)));
    }

    #[test]
    fn test_easy_day_protocols_exist_for_non_power_types() {
        let library = build_default_library();
        for prescription in [
            PrescriptionType::KbStrength,
            PrescriptionType::BwDynamic,
            PrescriptionType::IsometricHold,
            PrescriptionType::CarryTime,
            PrescriptionType::CrawlTime,
        ] {
            assert!(
                library
                    .protocols_for(prescription)
                    .iter()
                    .any(|p| p.is_easy_day),
                "No easy-day protocol for {:?}",
                prescription
            );
        }
    }
}
