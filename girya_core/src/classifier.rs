//! Day-type classification from the daily questionnaire.
//!
//! The classifier is a fixed-priority rule cascade with no randomness:
//! identical inputs always produce the identical day type.

use crate::types::{DayType, Feeling, Pain, Questionnaire, Sleep, UserState};

/// Outcome of classifying a questionnaire against the current state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayDecision {
    pub day_type: DayType,
    /// A real recovery trigger fired (pain, bad feeling, or bad sleep).
    /// The caller must arm the cooldown when this is set.
    pub triggered: bool,
}

/// Classify the day, first matching rule wins:
///
/// 1. Pain present, feeling bad, or sleep bad → easy, and the cooldown must
///    be armed (counter := 2, override cleared).
/// 2. Active cooldown without an override → easy, counter untouched.
/// 3. Otherwise from feeling and sleep: great + good sleep → hard; great or
///    ok with anything else → medium; any remaining combination → easy.
pub fn classify_day(questionnaire: &Questionnaire, state: &UserState) -> DayDecision {
    // Rule 1: real recovery trigger
    if questionnaire.pain == Pain::Present
        || questionnaire.feeling == Feeling::Bad
        || questionnaire.sleep == Sleep::Bad
    {
        tracing::info!(
            pain = %questionnaire.pain,
            feeling = %questionnaire.feeling,
            sleep = %questionnaire.sleep,
            "Recovery trigger fired, forcing easy day"
        );
        return DayDecision {
            day_type: DayType::Easy,
            triggered: true,
        };
    }

    // Rule 2: forced recovery while the cooldown runs down
    if state.cooldown_counter > 0 && !state.cooldown_override {
        tracing::info!(
            cooldown = state.cooldown_counter,
            "Cooldown active, forcing easy day"
        );
        return DayDecision {
            day_type: DayType::Easy,
            triggered: false,
        };
    }

    // Rule 3: classify from feeling + sleep
    let day_type = match (questionnaire.feeling, questionnaire.sleep) {
        (Feeling::Great, Sleep::Good) => DayType::Hard,
        (Feeling::Great, _) | (Feeling::Ok, _) => DayType::Medium,
        (Feeling::Bad, _) => DayType::Easy,
    };

    DayDecision {
        day_type,
        triggered: false,
    }
}
