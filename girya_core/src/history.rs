//! Completed-session history from the WAL and the CSV archive.
//!
//! Recent completions usually live in the WAL; older ones only in the CSV
//! archive after a rollup. This module merges both sources, deduplicates by
//! session id, and returns lightweight entries sorted newest first.

use crate::types::{Bucket, DayType, Equipment, Feedback, TimeSlot, WeekMode};
use crate::{Result, Session};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// One completed session as shown by the history listing.
///
/// Exercise detail is reduced to ids; the full prescription is not rebuilt
/// from the archive.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub day_type: DayType,
    pub priority_bucket: Bucket,
    pub time_slot: TimeSlot,
    pub equipment: Equipment,
    pub week_mode: WeekMode,
    pub exercise_ids: Vec<String>,
    pub feedback: Option<Feedback>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    fn sort_time(&self) -> DateTime<Utc> {
        self.completed_at.unwrap_or(self.timestamp)
    }
}

impl From<&Session> for HistoryEntry {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            timestamp: session.timestamp,
            day_type: session.day_type,
            priority_bucket: session.priority_bucket,
            time_slot: session.time_slot,
            equipment: session.equipment,
            week_mode: session.week_mode,
            exercise_ids: session.exercise_ids(),
            feedback: session.feedback,
            completed_at: session.completed_at,
        }
    }
}

/// CSV row format for reading archived sessions
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    timestamp: String,
    day_type: DayType,
    priority_bucket: Bucket,
    time_slot: TimeSlot,
    equipment: Equipment,
    week_mode: WeekMode,
    exercises: String,
    completed: bool,
    feedback: Option<Feedback>,
    completed_at: Option<String>,
}

impl TryFrom<CsvRow> for HistoryEntry {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::State(format!("invalid UUID in archive: {e}")))?;

        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| crate::Error::State(format!("invalid date in archive: {e}")))?
            .with_timezone(&Utc);

        let completed_at = row
            .completed_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let exercise_ids = row
            .exercises
            .split(';')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(HistoryEntry {
            id,
            timestamp,
            day_type: row.day_type,
            priority_bucket: row.priority_bucket,
            time_slot: row.time_slot,
            equipment: row.equipment,
            week_mode: row.week_mode,
            exercise_ids,
            feedback: row.feedback,
            completed_at,
        })
    }
}

/// Load completed sessions from both WAL and CSV archive.
///
/// Returns entries sorted newest first, deduplicated by id when a session
/// appears in both sources (a crash between rollup steps can leave one in
/// each).
pub fn load_completed_sessions(wal_path: &Path, csv_path: &Path) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    let mut seen_ids = HashSet::new();

    // WAL first, it holds the newest records
    if wal_path.exists() {
        for session in crate::wal::replay(wal_path)? {
            if session.completed {
                seen_ids.insert(session.id);
                entries.push(HistoryEntry::from(&session));
            }
        }
        tracing::debug!("Loaded {} completed sessions from WAL", entries.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for entry in load_entries_from_csv(csv_path)? {
            if !seen_ids.contains(&entry.id) {
                seen_ids.insert(entry.id);
                entries.push(entry);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} completed sessions from CSV", csv_count);
    }

    entries.sort_by(|a, b| b.sort_time().cmp(&a.sort_time()));

    tracing::info!("Loaded {} completed sessions total", entries.len());

    Ok(entries)
}

/// Load completed entries from the CSV archive, skipping rows that fail to
/// parse
fn load_entries_from_csv(path: &Path) -> Result<Vec<HistoryEntry>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => {
                if !row.completed {
                    continue;
                }
                match HistoryEntry::try_from(row) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        tracing::warn!("Failed to parse CSV row: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(entries)
}
