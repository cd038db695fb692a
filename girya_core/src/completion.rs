//! User-state transitions.
//!
//! All transitions are pure: they take the current state by reference and
//! return the next one. The storage layer decides when a result is written.

use chrono::{DateTime, Utc};

use crate::types::{
    DayType, Feedback, Library, Session, SettingsUpdate, UserState, WeekMode,
};

/// Arm the cooldown after a real recovery trigger: counter := 2, any active
/// override is cleared.
pub fn apply_trigger(state: &UserState) -> UserState {
    UserState {
        cooldown_counter: 2,
        cooldown_override: false,
        ..state.clone()
    }
}

/// Apply a completed session to the state.
///
/// Rotation always advances from the stored bucket, so a session generated
/// with a focus override still moves the cycle exactly one step.
pub fn apply_completion(
    state: &UserState,
    library: &Library,
    session: &Session,
    feedback: Feedback,
    completed_at: DateTime<Utc>,
    week_mode_auto_days: i64,
) -> UserState {
    let mut next = state.clone();

    next.next_priority_bucket = state.next_priority_bucket.successor();

    match feedback {
        Feedback::NotGood => {
            next.cooldown_counter = 2;
            next.cooldown_override = false;
        }
        Feedback::Good => {
            if next.cooldown_counter > 0 {
                next.cooldown_counter -= 1;
            }
        }
    }

    if session_contains_power(library, session) {
        next.power_last_used = Some(completed_at);
    }

    next.last_hard_day = session.day_type == DayType::Hard;
    next.last_session_exercises = session.exercise_ids();

    // Alternate the weekly emphasis once the cadence has elapsed; 0 disables
    if week_mode_auto_days > 0
        && (completed_at - next.week_mode_last_changed).num_days() >= week_mode_auto_days
    {
        next.week_mode = match next.week_mode {
            WeekMode::A => WeekMode::B,
            WeekMode::B => WeekMode::A,
        };
        next.week_mode_last_changed = completed_at;
        tracing::info!(week_mode = %next.week_mode, "Week mode rotated");
    }

    next
}

/// Apply a partial settings write.
///
/// The override toggle is stored even while no cooldown is active; it simply
/// has no effect until the counter is positive again.
pub fn apply_settings(state: &UserState, update: &SettingsUpdate, now: DateTime<Utc>) -> UserState {
    let mut next = state.clone();

    if let Some(mode) = update.week_mode {
        next.week_mode = mode;
        next.week_mode_last_changed = now;
    }
    if let Some(frequency) = update.power_frequency {
        next.power_frequency = frequency;
    }
    if let Some(override_flag) = update.cooldown_override {
        next.cooldown_override = override_flag;
    }

    next
}

/// Whether any exercise in the session is power-gated
pub fn session_contains_power(library: &Library, session: &Session) -> bool {
    session.exercises.iter().any(|se| {
        library
            .exercise(&se.exercise_id)
            .map(|ex| ex.is_power)
            .unwrap_or(false)
    })
}

/// The session record as it should be logged after completion
pub fn completed_record(session: &Session, feedback: Feedback, at: DateTime<Utc>) -> Session {
    Session {
        completed: true,
        feedback: Some(feedback),
        completed_at: Some(at),
        ..session.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::build_default_library;
    use crate::types::{Bucket, Equipment, PrescriptionType, SessionExercise, TimeSlot, Volume};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 18, 0, 0).unwrap()
    }

    fn entry(exercise_id: &str, category: Bucket) -> SessionExercise {
        SessionExercise {
            exercise_id: exercise_id.to_string(),
            name: exercise_id.to_string(),
            category,
            load_level: "Standard".to_string(),
            protocol_id: "kb_sets_across".to_string(),
            protocol: "Sets Across".to_string(),
            description: String::new(),
            sets: "3-5".to_string(),
            volume: Volume::Reps("5".to_string()),
            rest: "60-90s".to_string(),
            tempo: None,
            note: None,
        }
    }

    fn session(day_type: DayType, priority: Bucket, ids: &[(&str, Bucket)]) -> Session {
        Session {
            id: Uuid::new_v4(),
            timestamp: at(1),
            day_type,
            priority_bucket: priority,
            exercises: ids.iter().map(|(id, cat)| entry(id, *cat)).collect(),
            time_slot: TimeSlot::Standard,
            equipment: Equipment::Minimal,
            week_mode: WeekMode::A,
            completed: false,
            feedback: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_rotation_is_cyclic_over_four_completions() {
        let library = build_default_library();
        let mut state = UserState::default();
        assert_eq!(state.next_priority_bucket, Bucket::Squat);

        let expected = [Bucket::Pull, Bucket::Hinge, Bucket::Push, Bucket::Squat];
        for (i, want) in expected.iter().enumerate() {
            let s = session(DayType::Medium, state.next_priority_bucket, &[]);
            state = apply_completion(&state, &library, &s, Feedback::Good, at(2 + i as u32), 0);
            assert_eq!(state.next_priority_bucket, *want);
        }
    }

    #[test]
    fn test_rotation_ignores_the_override_bucket() {
        let library = build_default_library();
        let state = UserState::default(); // stored bucket: squat
        let s = session(DayType::Medium, Bucket::Push, &[]); // generated with an override

        let next = apply_completion(&state, &library, &s, Feedback::Good, at(2), 0);
        assert_eq!(next.next_priority_bucket, Bucket::Pull);
    }

    #[test]
    fn test_not_good_arms_the_cooldown() {
        let library = build_default_library();
        let state = UserState {
            cooldown_override: true,
            ..UserState::default()
        };
        let s = session(DayType::Hard, Bucket::Squat, &[]);

        let next = apply_completion(&state, &library, &s, Feedback::NotGood, at(2), 0);
        assert_eq!(next.cooldown_counter, 2);
        assert!(!next.cooldown_override);
    }

    #[test]
    fn test_good_counts_the_cooldown_down() {
        let library = build_default_library();
        let mut state = UserState {
            cooldown_counter: 2,
            ..UserState::default()
        };
        let s = session(DayType::Easy, Bucket::Squat, &[]);

        state = apply_completion(&state, &library, &s, Feedback::Good, at(2), 0);
        assert_eq!(state.cooldown_counter, 1);
        state = apply_completion(&state, &library, &s, Feedback::Good, at(3), 0);
        assert_eq!(state.cooldown_counter, 0);
        state = apply_completion(&state, &library, &s, Feedback::Good, at(4), 0);
        assert_eq!(state.cooldown_counter, 0);
    }

    #[test]
    fn test_override_survives_good_completions() {
        let library = build_default_library();
        let state = UserState {
            cooldown_counter: 1,
            cooldown_override: true,
            ..UserState::default()
        };
        let s = session(DayType::Hard, Bucket::Squat, &[]);

        let next = apply_completion(&state, &library, &s, Feedback::Good, at(2), 0);
        assert_eq!(next.cooldown_counter, 0);
        assert!(next.cooldown_override);
    }

    #[test]
    fn test_power_is_stamped_only_when_present() {
        let library = build_default_library();
        let state = UserState::default();

        let with_swing = session(
            DayType::Hard,
            Bucket::Hinge,
            &[("kb_swing", Bucket::Hinge)],
        );
        let next = apply_completion(&state, &library, &with_swing, Feedback::Good, at(5), 0);
        assert_eq!(next.power_last_used, Some(at(5)));

        let without = session(DayType::Hard, Bucket::Hinge, &[("kb_row", Bucket::Pull)]);
        let later = apply_completion(&next, &library, &without, Feedback::Good, at(9), 0);
        // previous stamp is kept, not cleared
        assert_eq!(later.power_last_used, Some(at(5)));
    }

    #[test]
    fn test_hard_day_and_exercises_are_recorded() {
        let library = build_default_library();
        let state = UserState::default();
        let s = session(
            DayType::Hard,
            Bucket::Squat,
            &[("kb_goblet_squat", Bucket::Squat), ("kb_row", Bucket::Pull)],
        );

        let next = apply_completion(&state, &library, &s, Feedback::Good, at(2), 0);
        assert!(next.last_hard_day);
        assert_eq!(
            next.last_session_exercises,
            vec!["kb_goblet_squat".to_string(), "kb_row".to_string()]
        );

        let easy = session(DayType::Easy, Bucket::Pull, &[]);
        let after = apply_completion(&next, &library, &easy, Feedback::Good, at(3), 0);
        assert!(!after.last_hard_day);
    }

    #[test]
    fn test_week_mode_rotates_on_cadence() {
        let library = build_default_library();
        let state = UserState {
            week_mode_last_changed: at(1),
            ..UserState::default()
        };
        let s = session(DayType::Medium, Bucket::Squat, &[]);

        let soon = apply_completion(&state, &library, &s, Feedback::Good, at(4), 7);
        assert_eq!(soon.week_mode, WeekMode::A);
        assert_eq!(soon.week_mode_last_changed, at(1));

        let later = apply_completion(&state, &library, &s, Feedback::Good, at(9), 7);
        assert_eq!(later.week_mode, WeekMode::B);
        assert_eq!(later.week_mode_last_changed, at(9));

        let disabled = apply_completion(&state, &library, &s, Feedback::Good, at(20), 0);
        assert_eq!(disabled.week_mode, WeekMode::A);
    }

    #[test]
    fn test_trigger_resets_counter_and_override() {
        let state = UserState {
            cooldown_counter: 1,
            cooldown_override: true,
            ..UserState::default()
        };
        let next = apply_trigger(&state);
        assert_eq!(next.cooldown_counter, 2);
        assert!(!next.cooldown_override);
    }

    #[test]
    fn test_settings_week_mode_stamps_the_change() {
        let state = UserState {
            week_mode_last_changed: at(1),
            ..UserState::default()
        };
        let update = SettingsUpdate {
            week_mode: Some(WeekMode::B),
            ..SettingsUpdate::default()
        };
        let next = apply_settings(&state, &update, at(6));
        assert_eq!(next.week_mode, WeekMode::B);
        assert_eq!(next.week_mode_last_changed, at(6));
    }

    #[test]
    fn test_settings_override_is_stored_while_inert() {
        let state = UserState::default();
        assert_eq!(state.cooldown_counter, 0);
        let update = SettingsUpdate {
            cooldown_override: Some(true),
            ..SettingsUpdate::default()
        };
        let next = apply_settings(&state, &update, at(2));
        assert!(next.cooldown_override);
        // everything else untouched
        assert_eq!(next.cooldown_counter, 0);
        assert_eq!(next.week_mode_last_changed, state.week_mode_last_changed);
    }

    #[test]
    fn test_completed_record_is_stamped() {
        let s = session(DayType::Medium, Bucket::Squat, &[("pushup", Bucket::Push)]);
        let record = completed_record(&s, Feedback::NotGood, at(3));
        assert!(record.completed);
        assert_eq!(record.feedback, Some(Feedback::NotGood));
        assert_eq!(record.completed_at, Some(at(3)));
        assert_eq!(record.id, s.id);
        // volume survives the copy untouched
        assert!(matches!(
            record.exercises[0].volume,
            Volume::Reps(_)
        ));
        assert_eq!(
            record.exercises[0].volume.matches(PrescriptionType::BwDynamic),
            true
        );
    }
}
