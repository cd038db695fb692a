#![forbid(unsafe_code)]

//! Core domain model and business logic for the Girya decision engine.
//!
//! This crate provides:
//! - Domain types (buckets, questionnaire, sessions, state)
//! - The built-in exercise and protocol library
//! - Day classification, exercise selection and protocol assignment
//! - Persistence (WAL, CSV, state, benchmarks)
//! - The service boundary tying engine and stores together

pub mod types;
pub mod error;
pub mod library;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod state;
pub mod benchmarks;
pub mod history;
pub mod classifier;
pub mod power;
pub mod selector;
pub mod protocol;
pub mod engine;
pub mod completion;
pub mod service;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use library::{build_default_library, get_default_library};
pub use config::Config;
pub use wal::{JsonlSink, SessionSink};
pub use history::{load_completed_sessions, HistoryEntry};
pub use classifier::{classify_day, DayDecision};
pub use power::PowerWindow;
pub use engine::{generate_session, reroll_session, swap_exercise, GeneratedSession, PlanContext};
pub use completion::{apply_completion, apply_settings, apply_trigger};
pub use service::Service;
