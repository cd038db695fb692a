//! Session generation engine.
//!
//! Everything in this module is a pure function of (library, state,
//! benchmarks, questionnaire, rng): generating, rerolling or swapping never
//! touches storage. The caller decides what to persist afterwards.

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::classifier::{classify_day, DayDecision};
use crate::error::{Error, Result};
use crate::power::{power_allowed, PowerWindow};
use crate::protocol::{assign_protocol, load_level};
use crate::selector::{select_exercise, SelectionPrefs};
use crate::types::{
    Benchmarks, Bucket, DayType, Equipment, ExerciseDef, Library, Questionnaire, Session,
    SessionExercise, TimeSlot, UserState,
};

/// Everything generation reads. Borrowed, never mutated.
#[derive(Clone, Copy)]
pub struct PlanContext<'a> {
    pub library: &'a Library,
    pub state: &'a UserState,
    pub benchmarks: &'a Benchmarks,
    pub now: DateTime<Utc>,
    pub power_window: PowerWindow,
}

/// A generated session together with the classifier outcome that produced
/// it. `decision.triggered` tells the caller whether the cooldown must be
/// armed after a successful Generate.
#[derive(Clone, Debug)]
pub struct GeneratedSession {
    pub session: Session,
    pub decision: DayDecision,
}

/// How many slots each time window gets
struct SlotPlan {
    secondary_buckets: usize,
    include_crawl: bool,
    max_exercises: usize,
}

fn slot_plan(slot: TimeSlot) -> SlotPlan {
    match slot {
        TimeSlot::Short => SlotPlan {
            secondary_buckets: 1,
            include_crawl: false,
            max_exercises: 4,
        },
        TimeSlot::Standard => SlotPlan {
            secondary_buckets: 2,
            include_crawl: false,
            max_exercises: 5,
        },
        TimeSlot::Long => SlotPlan {
            secondary_buckets: 3,
            include_crawl: true,
            max_exercises: 5,
        },
    }
}

/// Generate a session from the questionnaire and current state
pub fn generate_session<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    questionnaire: &Questionnaire,
    rng: &mut R,
) -> Result<GeneratedSession> {
    questionnaire.validate()?;

    let decision = classify_day(questionnaire, ctx.state);
    let priority_bucket = questionnaire
        .override_bucket
        .unwrap_or(ctx.state.next_priority_bucket);

    // The previous session's opener is soft-avoided so two sessions in a
    // row don't start with the same movement
    let avoid: Vec<String> = ctx.state.last_session_exercises.iter().take(1).cloned().collect();

    assemble(ctx, questionnaire, decision, priority_bucket, &avoid, rng)
}

/// Regenerate a session with fresh randomness.
///
/// `previous` is the session being replaced; its day type and priority
/// bucket are reused when the preserve flags are set, and all of its
/// exercise ids are soft-avoided so the result differs wherever the library
/// offers an alternative.
pub fn reroll_session<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    questionnaire: &Questionnaire,
    previous: Option<&Session>,
    preserve_day_type: bool,
    preserve_priority_bucket: bool,
    rng: &mut R,
) -> Result<GeneratedSession> {
    questionnaire.validate()?;

    let decision = match previous {
        Some(prev) if preserve_day_type => DayDecision {
            day_type: prev.day_type,
            triggered: false,
        },
        _ => classify_day(questionnaire, ctx.state),
    };

    let priority_bucket = match previous {
        Some(prev) if preserve_priority_bucket => prev.priority_bucket,
        _ => questionnaire
            .override_bucket
            .unwrap_or(ctx.state.next_priority_bucket),
    };

    let avoid = previous.map(|p| p.exercise_ids()).unwrap_or_default();

    assemble(ctx, questionnaire, decision, priority_bucket, &avoid, rng)
}

/// Produce a replacement for one exercise in an existing session.
///
/// The whole session's exercise ids are hard-excluded so the replacement
/// can't collide with another slot either.
pub fn swap_exercise<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    session: &Session,
    exercise_id: &str,
    equipment: Equipment,
    rng: &mut R,
) -> Result<SessionExercise> {
    let current = ctx
        .library
        .exercise(exercise_id)
        .ok_or_else(|| Error::ExerciseNotFound(exercise_id.to_string()))?;

    if !session.contains_exercise(exercise_id) {
        return Err(Error::Validation(format!(
            "session {} does not contain exercise '{}'",
            session.id, exercise_id
        )));
    }

    let prefs = SelectionPrefs {
        week_mode: ctx.state.week_mode,
        allow_power: power_allowed(ctx.state, session.day_type, ctx.now, ctx.power_window),
        prefer_anchor: false,
    };
    let exclude = session.exercise_ids();

    let replacement = select_exercise(
        ctx.library,
        current.category,
        equipment,
        &prefs,
        &exclude,
        &[],
        rng,
    )
    .ok_or_else(|| Error::NoAlternative {
        category: current.category,
        exercise: exercise_id.to_string(),
    })?;

    tracing::info!(
        from = %exercise_id,
        to = %replacement.id,
        category = %current.category,
        "Swapped exercise"
    );

    build_exercise(
        ctx,
        replacement,
        session.day_type,
        Some("Swapped".to_string()),
        rng,
    )
}

fn assemble<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    questionnaire: &Questionnaire,
    decision: DayDecision,
    priority_bucket: Bucket,
    avoid: &[String],
    rng: &mut R,
) -> Result<GeneratedSession> {
    let equipment = questionnaire.equipment;
    let plan = slot_plan(questionnaire.time_available);
    let allow_power = power_allowed(ctx.state, decision.day_type, ctx.now, ctx.power_window);
    let prefs = SelectionPrefs {
        week_mode: ctx.state.week_mode,
        allow_power,
        prefer_anchor: true,
    };

    let mut exercises: Vec<SessionExercise> = Vec::new();
    let mut used: Vec<String> = Vec::new();

    // Priority slot. The resolved bucket is the one place selection failure
    // is fatal.
    let primary = select_exercise(
        ctx.library,
        priority_bucket,
        equipment,
        &prefs,
        &used,
        avoid,
        rng,
    )
    .ok_or(Error::NoCandidate {
        category: priority_bucket,
        equipment,
    })?;
    let note = if primary.is_anchor {
        Some("Priority".to_string())
    } else if primary.is_power {
        Some("Power".to_string())
    } else {
        None
    };
    used.push(primary.id.clone());
    exercises.push(build_exercise(ctx, primary, decision.day_type, note, rng)?);

    // Secondary slots walk the rotation from the resolved bucket's
    // successor; buckets with nothing compatible are skipped
    let mut bucket = priority_bucket.successor();
    for _ in 0..plan.secondary_buckets {
        if let Some(ex) = select_exercise(
            ctx.library, bucket, equipment, &prefs, &used, avoid, rng,
        ) {
            let note = ex.is_power.then(|| "Power".to_string());
            used.push(ex.id.clone());
            exercises.push(build_exercise(ctx, ex, decision.day_type, note, rng)?);
        }
        bucket = bucket.successor();
    }

    // Carry finisher
    if exercises.len() < plan.max_exercises {
        if let Some(ex) = select_exercise(
            ctx.library,
            Bucket::Carry,
            equipment,
            &prefs,
            &used,
            avoid,
            rng,
        ) {
            used.push(ex.id.clone());
            exercises.push(build_exercise(
                ctx,
                ex,
                decision.day_type,
                Some("Finisher".to_string()),
                rng,
            )?);
        }
    }

    // Crawl support slot, long sessions only
    if plan.include_crawl && exercises.len() < plan.max_exercises {
        if let Some(ex) = select_exercise(
            ctx.library,
            Bucket::Crawl,
            equipment,
            &prefs,
            &used,
            avoid,
            rng,
        ) {
            exercises.push(build_exercise(
                ctx,
                ex,
                decision.day_type,
                Some("Support".to_string()),
                rng,
            )?);
        }
    }

    tracing::info!(
        day_type = %decision.day_type,
        bucket = %priority_bucket,
        exercises = exercises.len(),
        "Assembled session"
    );

    Ok(GeneratedSession {
        session: Session {
            id: Uuid::new_v4(),
            timestamp: ctx.now,
            day_type: decision.day_type,
            priority_bucket,
            exercises,
            time_slot: questionnaire.time_available,
            equipment,
            week_mode: ctx.state.week_mode,
            completed: false,
            feedback: None,
            completed_at: None,
        },
        decision,
    })
}

fn build_exercise<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    exercise: &ExerciseDef,
    day_type: DayType,
    note: Option<String>,
    rng: &mut R,
) -> Result<SessionExercise> {
    let proto = assign_protocol(ctx.library, exercise.prescription_type, day_type, rng)
        .ok_or_else(|| {
            Error::LibraryValidation(format!(
                "no protocol available for prescription type {:?}",
                exercise.prescription_type
            ))
        })?;

    Ok(SessionExercise {
        exercise_id: exercise.id.clone(),
        name: exercise.name.clone(),
        category: exercise.category,
        load_level: load_level(exercise, day_type, ctx.benchmarks),
        protocol_id: proto.id.clone(),
        protocol: proto.name.clone(),
        description: proto.description.clone(),
        sets: proto.sets.clone(),
        volume: proto.volume.clone(),
        rest: proto.rest.clone(),
        tempo: proto.tempo.clone(),
        note,
    })
}
