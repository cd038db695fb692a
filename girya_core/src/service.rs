//! Boundary operations over the engine and the data directory.
//!
//! Any transport (the CLI today) goes through [`Service`]: it owns the data
//! directory layout, loads the stores, runs the pure engine, and enforces
//! write ordering. Assembling a session never mutates state; the only state
//! writes are the real-trigger cooldown arm during Generate, the completion
//! transition, and the settings boundary, each under [`StateLock`].

use crate::completion::{apply_completion, apply_settings, apply_trigger, completed_record};
use crate::config::Config;
use crate::engine::{
    generate_session, reroll_session, swap_exercise, GeneratedSession, PlanContext,
};
use crate::history::{load_completed_sessions, HistoryEntry};
use crate::library::get_default_library;
use crate::power::PowerWindow;
use crate::state::StateLock;
use crate::types::{
    Benchmarks, Equipment, Feedback, Library, Questionnaire, SessionExercise, SettingsUpdate,
};
use crate::wal::{self, JsonlSink, SessionSink};
use crate::{Error, Result, Session, UserState};
use chrono::Utc;
use rand::Rng;
use std::path::PathBuf;
use uuid::Uuid;

const STATE_FILE: &str = "state.json";
const WAL_FILE: &str = "sessions.wal";
const CSV_FILE: &str = "sessions.csv";
const BENCHMARKS_FILE: &str = "benchmarks.json";

/// One user profile's decision engine over one data directory
pub struct Service {
    data_dir: PathBuf,
    library: &'static Library,
    power_window: PowerWindow,
    week_mode_auto_days: i64,
}

impl Service {
    /// Build a service from configuration
    pub fn new(config: &Config) -> Self {
        Self::with_data_dir(config, config.data.data_dir.clone())
    }

    /// Build a service from configuration with an explicit data directory
    pub fn with_data_dir(config: &Config, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            library: get_default_library(),
            power_window: config.power.window,
            week_mode_auto_days: config.engine.week_mode_auto_days,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(WAL_FILE)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join(CSV_FILE)
    }

    pub fn benchmarks_path(&self) -> PathBuf {
        self.data_dir.join(BENCHMARKS_FILE)
    }

    pub fn library(&self) -> &Library {
        self.library
    }

    fn plan_context<'a>(
        &'a self,
        state: &'a UserState,
        benchmarks: &'a Benchmarks,
    ) -> PlanContext<'a> {
        PlanContext {
            library: self.library,
            state,
            benchmarks,
            now: Utc::now(),
            power_window: self.power_window,
        }
    }

    /// Generate today's session and log it.
    ///
    /// Write order is pure generation, then the WAL append, then the
    /// real-trigger cooldown write. A failure before the last step leaves
    /// `UserState` untouched; the trigger write itself is an absolute
    /// assignment and safe to repeat.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        questionnaire: &Questionnaire,
        rng: &mut R,
    ) -> Result<GeneratedSession> {
        let state = UserState::load(&self.state_path())?;
        let benchmarks = Benchmarks::load(&self.benchmarks_path())?;
        let ctx = self.plan_context(&state, &benchmarks);

        let generated = generate_session(&ctx, questionnaire, rng)?;

        let mut sink = JsonlSink::new(self.wal_path());
        sink.append(&generated.session)?;

        if generated.decision.triggered {
            let state_path = self.state_path();
            let _lock = StateLock::acquire(&state_path)?;
            let fresh = UserState::load(&state_path)?;
            apply_trigger(&fresh).save(&state_path)?;
            tracing::info!("Real trigger reported, cooldown armed for 2 sessions");
        }

        Ok(generated)
    }

    /// Generate a session without logging it or touching state
    pub fn preview<R: Rng + ?Sized>(
        &self,
        questionnaire: &Questionnaire,
        rng: &mut R,
    ) -> Result<GeneratedSession> {
        let state = UserState::load(&self.state_path())?;
        let benchmarks = Benchmarks::load(&self.benchmarks_path())?;
        let ctx = self.plan_context(&state, &benchmarks);
        generate_session(&ctx, questionnaire, rng)
    }

    /// Replace the newest pending session with a fresh roll.
    ///
    /// The discarded session stays in the log uncompleted; the replacement
    /// is appended so it can be completed by id. Rerolling never writes
    /// state, the trigger write belongs to Generate alone.
    pub fn reroll<R: Rng + ?Sized>(
        &self,
        questionnaire: &Questionnaire,
        preserve_day_type: bool,
        preserve_priority_bucket: bool,
        rng: &mut R,
    ) -> Result<GeneratedSession> {
        let state = UserState::load(&self.state_path())?;
        let benchmarks = Benchmarks::load(&self.benchmarks_path())?;
        let previous = self.latest_pending()?;
        let ctx = self.plan_context(&state, &benchmarks);

        let generated = reroll_session(
            &ctx,
            questionnaire,
            previous.as_ref(),
            preserve_day_type,
            preserve_priority_bucket,
            rng,
        )?;

        let mut sink = JsonlSink::new(self.wal_path());
        sink.append(&generated.session)?;

        Ok(generated)
    }

    /// Newest pending session in the log, if any
    pub fn latest_pending(&self) -> Result<Option<Session>> {
        Ok(wal::latest_session(&self.wal_path())?.filter(|s| !s.completed))
    }

    /// Swap one exercise in a pending session for an alternative in the
    /// same category. When no equipment context is given the session's own
    /// is reused. Appends the updated session, which supersedes the
    /// original on replay.
    pub fn swap<R: Rng + ?Sized>(
        &self,
        session_id: Uuid,
        exercise_id: &str,
        equipment: Option<Equipment>,
        rng: &mut R,
    ) -> Result<(Session, SessionExercise)> {
        let session = wal::find_session(&self.wal_path(), session_id)?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        if session.completed {
            return Err(Error::Validation(format!(
                "session {session_id} is already completed"
            )));
        }

        let state = UserState::load(&self.state_path())?;
        let benchmarks = Benchmarks::load(&self.benchmarks_path())?;
        let ctx = self.plan_context(&state, &benchmarks);

        let equipment = equipment.unwrap_or(session.equipment);
        let replacement = swap_exercise(&ctx, &session, exercise_id, equipment, rng)?;

        let mut updated = session;
        for slot in &mut updated.exercises {
            if slot.exercise_id == exercise_id {
                *slot = replacement.clone();
                break;
            }
        }

        let mut sink = JsonlSink::new(self.wal_path());
        sink.append(&updated)?;

        Ok((updated, replacement))
    }

    /// Complete a pending session and fold it into state.
    ///
    /// Runs entirely inside the state lock so two completions of the same
    /// session cannot interleave; the loser is rejected as already
    /// completed rather than advancing the rotation twice.
    pub fn complete(&self, session_id: Uuid, feedback: Feedback) -> Result<(Session, UserState)> {
        let state_path = self.state_path();
        let _lock = StateLock::acquire(&state_path)?;

        let session = wal::find_session(&self.wal_path(), session_id)?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        if session.completed {
            return Err(Error::Validation(format!(
                "session {session_id} is already completed"
            )));
        }

        let now = Utc::now();
        let record = completed_record(&session, feedback, now);

        let mut sink = JsonlSink::new(self.wal_path());
        sink.append(&record)?;

        let state = UserState::load(&state_path)?;
        let next = apply_completion(
            &state,
            self.library,
            &record,
            feedback,
            now,
            self.week_mode_auto_days,
        );
        next.save(&state_path)?;

        tracing::info!(
            "Completed session {} ({}), next priority {}",
            session_id,
            feedback,
            next.next_priority_bucket
        );

        Ok((record, next))
    }

    /// Current persistent state
    pub fn state(&self) -> Result<UserState> {
        UserState::load(&self.state_path())
    }

    /// Apply a partial settings update under the state lock
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<UserState> {
        let state_path = self.state_path();
        let _lock = StateLock::acquire(&state_path)?;

        let state = UserState::load(&state_path)?;
        let next = apply_settings(&state, update, Utc::now());
        next.save(&state_path)?;
        Ok(next)
    }

    /// Current benchmark numbers
    pub fn benchmarks(&self) -> Result<Benchmarks> {
        Benchmarks::load(&self.benchmarks_path())
    }

    /// Replace the benchmark numbers
    pub fn save_benchmarks(&self, benchmarks: &Benchmarks) -> Result<()> {
        benchmarks.save(&self.benchmarks_path())
    }

    /// Recent completed sessions, newest first
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = load_completed_sessions(&self.wal_path(), &self.csv_path())?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// Archive the WAL into the CSV; returns (sessions archived, processed
    /// WALs removed)
    pub fn rollup(&self, cleanup: bool) -> Result<(usize, usize)> {
        let archived = crate::csv_rollup::wal_to_csv_and_archive(&self.wal_path(), &self.csv_path())?;
        let removed = if cleanup {
            crate::csv_rollup::cleanup_processed_wals(&self.data_dir)?
        } else {
            0
        };
        Ok((archived, removed))
    }
}
