//! Core domain types for the Girya decision engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Questionnaire answers and their enumerations
//! - Exercise and protocol library records
//! - Generated sessions and their exercises
//! - Persistent user state and settings updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

// ============================================================================
// Movement Buckets
// ============================================================================

/// A movement-pattern category used for selection and rotation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Squat,
    Hinge,
    Push,
    Pull,
    Carry,
    Crawl,
}

/// Priority rotation cycle. Carry and crawl are fill-only categories and
/// never hold the priority slot.
pub const BUCKET_ROTATION: [Bucket; 4] =
    [Bucket::Squat, Bucket::Pull, Bucket::Hinge, Bucket::Push];

impl Bucket {
    /// Whether this bucket participates in the priority rotation
    pub fn is_rotation_bucket(self) -> bool {
        BUCKET_ROTATION.contains(&self)
    }

    /// Next bucket in the rotation cycle: squat → pull → hinge → push → squat
    pub fn successor(self) -> Bucket {
        let idx = BUCKET_ROTATION.iter().position(|b| *b == self).unwrap_or(0);
        BUCKET_ROTATION[(idx + 1) % BUCKET_ROTATION.len()]
    }
}

// ============================================================================
// Questionnaire Enumerations
// ============================================================================

/// How the user reports feeling today
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feeling {
    Bad,
    Ok,
    Great,
}

/// Last night's sleep quality
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sleep {
    Bad,
    Good,
}

/// Whether any pain is present
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pain {
    None,
    Present,
}

/// Available training time window (minutes)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeSlot {
    #[serde(rename = "20-30")]
    Short,
    #[serde(rename = "30-45")]
    Standard,
    #[serde(rename = "45-60")]
    Long,
}

/// Equipment context the session must fit
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Home,
    Minimal,
    Bodyweight,
}

/// Session intensity classification
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Easy,
    Medium,
    Hard,
}

/// Weekly emphasis: A = bilateral, B = single-leg focus for squat/hinge
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WeekMode {
    #[default]
    A,
    B,
}

/// How often power/swing work is allowed onto the plan
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PowerFrequency {
    Weekly,
    #[default]
    Fortnightly,
}

/// Post-session feedback
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Good,
    NotGood,
}

// ============================================================================
// Prescription and Volume Types
// ============================================================================

/// Training-stimulus classification. Determines which protocols apply to an
/// exercise and which volume field those protocols populate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionType {
    KbStrength,
    BwDynamic,
    IsometricHold,
    CarryTime,
    CrawlTime,
    PowerSwing,
}

/// Volume prescription carrying exactly one populated field.
///
/// Serialized flattened into the surrounding record, so the wire shape is a
/// single `reps`/`hold_time`/`time` key and an invalid combination (two
/// fields, or an empty placeholder for the wrong kind) cannot be represented.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    Reps(String),
    HoldTime(String),
    Time(String),
}

impl Volume {
    /// Whether this volume kind is the one the prescription type populates
    pub fn matches(&self, prescription: PrescriptionType) -> bool {
        use PrescriptionType::*;
        matches!(
            (self, prescription),
            (Volume::Reps(_), KbStrength | BwDynamic | PowerSwing)
                | (Volume::HoldTime(_), IsometricHold)
                | (Volume::Time(_), CarryTime | CrawlTime)
        )
    }

    /// The prescribed quantity, regardless of kind
    pub fn value(&self) -> &str {
        match self {
            Volume::Reps(v) | Volume::HoldTime(v) | Volume::Time(v) => v,
        }
    }

    /// Short label for display ("reps", "hold", "time")
    pub fn label(&self) -> &'static str {
        match self {
            Volume::Reps(_) => "reps",
            Volume::HoldTime(_) => "hold",
            Volume::Time(_) => "time",
        }
    }
}

// ============================================================================
// Library Records
// ============================================================================

/// An exercise definition from the immutable library
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseDef {
    pub id: String,
    pub name: String,
    pub category: Bucket,
    pub equipment: Vec<Equipment>,
    pub bilateral: bool,
    #[serde(default)]
    pub is_anchor: bool,
    #[serde(default)]
    pub is_power: bool,
    pub prescription_type: PrescriptionType,
}

impl ExerciseDef {
    /// Whether the exercise can be performed in the given equipment context
    pub fn supports(&self, equipment: Equipment) -> bool {
        self.equipment.contains(&equipment)
    }
}

/// A set/rep/time scheme from the immutable library
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolDef {
    pub id: String,
    pub name: String,
    pub prescription_type: PrescriptionType,
    pub description: String,
    pub example: String,
    pub sets: String,
    #[serde(flatten)]
    pub volume: Volume,
    pub rest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(default)]
    pub is_easy_day: bool,
}

/// The immutable exercise + protocol library
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Library {
    pub exercises: HashMap<String, ExerciseDef>,
    pub protocols: HashMap<String, ProtocolDef>,
}

impl Library {
    /// Look up an exercise by id
    pub fn exercise(&self, id: &str) -> Option<&ExerciseDef> {
        self.exercises.get(id)
    }

    /// Exercises in a category, sorted by id.
    ///
    /// Map iteration order is unspecified, so callers that feed a seeded rng
    /// rely on this sort for reproducible picks.
    pub fn exercises_in(&self, category: Bucket) -> Vec<&ExerciseDef> {
        let mut found: Vec<&ExerciseDef> = self
            .exercises
            .values()
            .filter(|ex| ex.category == category)
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    /// Protocols matching a prescription type, sorted by id
    pub fn protocols_for(&self, prescription: PrescriptionType) -> Vec<&ProtocolDef> {
        let mut found: Vec<&ProtocolDef> = self
            .protocols
            .values()
            .filter(|p| p.prescription_type == prescription)
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }
}

// ============================================================================
// Questionnaire
// ============================================================================

/// Daily check-in supplied with every generation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Questionnaire {
    pub feeling: Feeling,
    pub sleep: Sleep,
    pub pain: Pain,
    pub time_available: TimeSlot,
    pub equipment: Equipment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_bucket: Option<Bucket>,
}

impl Questionnaire {
    /// Reject focus overrides outside the rotation; carry/crawl are fill-only
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(bucket) = self.override_bucket {
            if !bucket.is_rotation_bucket() {
                return Err(Error::Validation(format!(
                    "focus override must be one of squat/pull/hinge/push, got '{bucket}'"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// One prescribed exercise inside a generated session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionExercise {
    pub exercise_id: String,
    pub name: String,
    pub category: Bucket,
    pub load_level: String,
    pub protocol_id: String,
    pub protocol: String,
    pub description: String,
    pub sets: String,
    #[serde(flatten)]
    pub volume: Volume,
    pub rest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A generated training session.
///
/// Sessions are disposable artifacts: discarding one never mutates user
/// state. Completion stamps `completed`/`feedback`/`completed_at` and is the
/// only path that feeds back into [`UserState`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub day_type: DayType,
    pub priority_bucket: Bucket,
    pub exercises: Vec<SessionExercise>,
    pub time_slot: TimeSlot,
    pub equipment: Equipment,
    pub week_mode: WeekMode,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Ids of every exercise in the session, in order
    pub fn exercise_ids(&self) -> Vec<String> {
        self.exercises.iter().map(|e| e.exercise_id.clone()).collect()
    }

    /// Whether the session contains the given exercise id
    pub fn contains_exercise(&self, exercise_id: &str) -> bool {
        self.exercises.iter().any(|e| e.exercise_id == exercise_id)
    }
}

// ============================================================================
// Persistent User State
// ============================================================================

fn default_bucket() -> Bucket {
    Bucket::Squat
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// The user's persistent state across sessions.
///
/// Owned exclusively by the engine: created with defaults on first load,
/// mutated by the completion handler and the settings boundary, and by the
/// real-trigger cooldown write during generation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserState {
    #[serde(default = "default_bucket")]
    pub next_priority_bucket: Bucket,
    #[serde(default)]
    pub week_mode: WeekMode,
    #[serde(default = "default_timestamp")]
    pub week_mode_last_changed: DateTime<Utc>,
    #[serde(default)]
    pub cooldown_counter: u32,
    #[serde(default)]
    pub cooldown_override: bool,
    #[serde(default)]
    pub power_last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_hard_day: bool,
    #[serde(default)]
    pub last_session_exercises: Vec<String>,
    #[serde(default)]
    pub power_frequency: PowerFrequency,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            next_priority_bucket: Bucket::Squat,
            week_mode: WeekMode::A,
            week_mode_last_changed: Utc::now(),
            cooldown_counter: 0,
            cooldown_override: false,
            power_last_used: None,
            last_hard_day: false,
            last_session_exercises: Vec::new(),
            power_frequency: PowerFrequency::Fortnightly,
        }
    }
}

/// Partial settings write accepted at the settings boundary
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_mode: Option<WeekMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_frequency: Option<PowerFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_override: Option<bool>,
}

// ============================================================================
// Benchmarks (external input)
// ============================================================================

fn default_bells() -> Vec<u32> {
    vec![16, 24, 28, 32]
}

/// Strength benchmark numbers maintained outside the engine.
///
/// Only consulted for load-level derivation; absence of the file (or of any
/// individual number) degrades to generic load bands.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Benchmarks {
    #[serde(default)]
    pub press_bell_kg: Option<u32>,
    #[serde(default)]
    pub press_reps: Option<u32>,
    #[serde(default)]
    pub pushup_max: Option<u32>,
    #[serde(default)]
    pub pullup_max: Option<u32>,
    #[serde(default)]
    pub front_squat_bells_kg: Option<Vec<u32>>,
    #[serde(default)]
    pub front_squat_reps: Option<u32>,
    #[serde(default)]
    pub hinge_bell_kg: Option<u32>,
    #[serde(default)]
    pub hinge_reps: Option<u32>,
    #[serde(default = "default_bells")]
    pub available_bells_kg: Vec<u32>,
}

impl Default for Benchmarks {
    fn default() -> Self {
        Self {
            press_bell_kg: None,
            press_reps: None,
            pushup_max: None,
            pullup_max: None,
            front_squat_bells_kg: None,
            front_squat_reps: None,
            hinge_bell_kg: None,
            hinge_reps: None,
            available_bells_kg: default_bells(),
        }
    }
}

// ============================================================================
// Display / FromStr for CLI-facing enums
// ============================================================================

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bucket::Squat => "squat",
            Bucket::Hinge => "hinge",
            Bucket::Push => "push",
            Bucket::Pull => "pull",
            Bucket::Carry => "carry",
            Bucket::Crawl => "crawl",
        })
    }
}

impl FromStr for Bucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "squat" => Ok(Bucket::Squat),
            "hinge" => Ok(Bucket::Hinge),
            "push" => Ok(Bucket::Push),
            "pull" => Ok(Bucket::Pull),
            "carry" => Ok(Bucket::Carry),
            "crawl" => Ok(Bucket::Crawl),
            other => Err(Error::Validation(format!("unknown bucket '{other}'"))),
        }
    }
}

impl fmt::Display for Feeling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feeling::Bad => "bad",
            Feeling::Ok => "ok",
            Feeling::Great => "great",
        })
    }
}

impl FromStr for Feeling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "bad" => Ok(Feeling::Bad),
            "ok" => Ok(Feeling::Ok),
            "great" => Ok(Feeling::Great),
            other => Err(Error::Validation(format!(
                "feeling must be bad/ok/great, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Sleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sleep::Bad => "bad",
            Sleep::Good => "good",
        })
    }
}

impl FromStr for Sleep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "bad" => Ok(Sleep::Bad),
            "good" => Ok(Sleep::Good),
            other => Err(Error::Validation(format!(
                "sleep must be bad/good, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Pain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pain::None => "none",
            Pain::Present => "present",
        })
    }
}

impl FromStr for Pain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Pain::None),
            "present" => Ok(Pain::Present),
            other => Err(Error::Validation(format!(
                "pain must be none/present, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeSlot::Short => "20-30",
            TimeSlot::Standard => "30-45",
            TimeSlot::Long => "45-60",
        })
    }
}

impl FromStr for TimeSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "20-30" => Ok(TimeSlot::Short),
            "30-45" => Ok(TimeSlot::Standard),
            "45-60" => Ok(TimeSlot::Long),
            other => Err(Error::Validation(format!(
                "time must be 20-30/30-45/45-60, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Equipment::Home => "home",
            Equipment::Minimal => "minimal",
            Equipment::Bodyweight => "bodyweight",
        })
    }
}

impl FromStr for Equipment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Equipment::Home),
            "minimal" => Ok(Equipment::Minimal),
            "bodyweight" | "bw" => Ok(Equipment::Bodyweight),
            other => Err(Error::Validation(format!(
                "equipment must be home/minimal/bodyweight, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DayType::Easy => "easy",
            DayType::Medium => "medium",
            DayType::Hard => "hard",
        })
    }
}

impl fmt::Display for WeekMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeekMode::A => "A",
            WeekMode::B => "B",
        })
    }
}

impl FromStr for WeekMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(WeekMode::A),
            "B" => Ok(WeekMode::B),
            other => Err(Error::Validation(format!(
                "week mode must be A or B, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PowerFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerFrequency::Weekly => "weekly",
            PowerFrequency::Fortnightly => "fortnightly",
        })
    }
}

impl FromStr for PowerFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(PowerFrequency::Weekly),
            "fortnightly" => Ok(PowerFrequency::Fortnightly),
            other => Err(Error::Validation(format!(
                "power frequency must be weekly/fortnightly, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feedback::Good => "good",
            Feedback::NotGood => "not_good",
        })
    }
}

impl FromStr for Feedback {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(Feedback::Good),
            "not_good" | "not-good" => Ok(Feedback::NotGood),
            other => Err(Error::Validation(format!(
                "feedback must be good/not_good, got '{other}'"
            ))),
        }
    }
}
