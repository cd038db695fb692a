//! WAL-to-CSV rollup for long-term session archival.
//!
//! The JSONL WAL is the working log; rollup flattens it into a CSV archive
//! that spreadsheets can open, then renames the WAL out of the way. Replay
//! collapses generate/complete record pairs first, so the archive holds one
//! row per session in its final form.

use crate::types::{Bucket, DayType, Equipment, Feedback, TimeSlot, WeekMode};
use crate::{Result, Session};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;

/// CSV row format for archived sessions
#[derive(Debug, Serialize)]
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

impl From<&Session> for CsvRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            timestamp: session.timestamp.to_rfc3339(),
            day_type: session.day_type,
            priority_bucket: session.priority_bucket,
            time_slot: session.time_slot,
            equipment: session.equipment,
            week_mode: session.week_mode,
            exercises: session.exercise_ids().join(";"),
            completed: session.completed,
            feedback: session.feedback,
            completed_at: session.completed_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Roll the WAL up into the CSV archive and rename the WAL to
/// `.wal.processed`.
///
/// Appends to an existing archive (headers only when the file is empty) and
/// fsyncs before the rename, so a crash can duplicate rows but never lose
/// them. A missing or empty WAL is a no-op. Returns the number of sessions
/// archived.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let sessions = crate::wal::replay(wal_path)?;
    if sessions.is_empty() {
        tracing::debug!("WAL empty or missing, nothing to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for session in &sessions {
        writer.serialize(CsvRow::from(session))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!(
        "Rolled up {} sessions to {} and archived WAL",
        sessions.len(),
        csv_path.display()
    );

    Ok(sessions.len())
}

/// Remove processed WAL files left behind by earlier rollups
pub fn cleanup_processed_wals(data_dir: &Path) -> Result<usize> {
    if !data_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {}", path.display());
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionExercise, Volume};
    use crate::wal::{JsonlSink, SessionSink};
    use chrono::Utc;
    use uuid::Uuid;

    fn test_session() -> Session {
        Session {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            day_type: DayType::Medium,
            priority_bucket: Bucket::Squat,
            exercises: vec![SessionExercise {
                exercise_id: "kb_goblet_squat".into(),
                name: "Goblet Squat".into(),
                category: Bucket::Squat,
                load_level: "Moderate (75-85%)".into(),
                protocol_id: "straight_sets_strength".into(),
                protocol: "Straight Sets (Strength)".into(),
                description: "Classic strength work".into(),
                sets: "4".into(),
                volume: Volume::Reps("5".into()),
                rest: "90-120s".into(),
                tempo: None,
                note: None,
            }],
            time_slot: TimeSlot::Standard,
            equipment: Equipment::Minimal,
            week_mode: WeekMode::A,
            completed: false,
            feedback: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_rollup_creates_csv_and_archives_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&test_session()).unwrap();
        sink.append(&test_session()).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 2);

        assert!(csv_path.exists());
        assert!(!wal_path.exists());
        assert!(temp_dir.path().join("sessions.wal.processed").exists());

        let content = std::fs::read_to_string(&csv_path).unwrap();
        // Header plus one row per session
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("kb_goblet_squat"));
    }

    #[test]
    fn test_rollup_appends_across_rollups() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&test_session()).unwrap();
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&test_session()).unwrap();
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        // One header and two rows, no repeated header
        assert_eq!(content.lines().count(), 3);
        assert_eq!(content.matches("day_type").count(), 1);
    }

    #[test]
    fn test_rollup_collapses_completion_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut session = test_session();
        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&session).unwrap();

        session.completed = true;
        session.feedback = Some(Feedback::Good);
        session.completed_at = Some(Utc::now());
        sink.append(&session).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.lines().count(), 2);
        // The archived row is the completed one
        assert!(content.contains("true"));
        assert!(content.contains("good"));
    }

    #[test]
    fn test_empty_wal_rolls_up_zero() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_cleanup_removes_only_processed_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("old.wal.processed"), "x").unwrap();
        std::fs::write(temp_dir.path().join("sessions.wal"), "x").unwrap();
        std::fs::write(temp_dir.path().join("state.json"), "{}").unwrap();

        let removed = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(removed, 1);

        assert!(!temp_dir.path().join("old.wal.processed").exists());
        assert!(temp_dir.path().join("sessions.wal").exists());
        assert!(temp_dir.path().join("state.json").exists());
    }
}
