//! Error types for the girya_core library.

use crate::types::{Bucket, Equipment};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for girya_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Exercise/protocol library validation error
    #[error("Library validation error: {0}")]
    LibraryValidation(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Malformed or incomplete request input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A required category has no equipment-compatible exercise
    #[error("no {category} exercise available with {equipment} equipment")]
    NoCandidate {
        category: Bucket,
        equipment: Equipment,
    },

    /// Swap found nothing else to offer in the category
    #[error("no alternative to '{exercise}' in the {category} bucket")]
    NoAlternative { category: Bucket, exercise: String },

    /// Session id does not match any logged session
    #[error("session {0} not found")]
    SessionNotFound(String),

    /// Exercise id does not exist in the library
    #[error("exercise '{0}' not found in the library")]
    ExerciseNotFound(String),
}
