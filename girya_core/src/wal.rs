//! Write-Ahead Log (WAL) for session persistence.
//!
//! Sessions are appended to a JSONL (JSON Lines) file with file locking.
//! A session appears once when generated and again, updated, when it is
//! completed; replay keeps the last record per id.

use crate::{Result, Session};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Session sink trait for persisting sessions
pub trait SessionSink {
    fn append(&mut self, session: &Session) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, session: &Session) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended session {} to WAL", session.id);
        Ok(())
    }
}

/// Read all raw records from a WAL file, in file order.
///
/// Unparsable lines are skipped with a warning so one corrupted record
/// never hides the rest of the log.
pub fn read_records(path: &Path) -> Result<Vec<Session>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Session>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} session records from WAL", sessions.len());
    Ok(sessions)
}

/// Replay the WAL into its effective sessions: one per id, last record
/// wins, file order otherwise preserved.
pub fn replay(path: &Path) -> Result<Vec<Session>> {
    let records = read_records(path)?;
    let mut sessions: Vec<Session> = Vec::new();

    for record in records {
        if let Some(existing) = sessions.iter_mut().find(|s| s.id == record.id) {
            *existing = record;
        } else {
            sessions.push(record);
        }
    }

    Ok(sessions)
}

/// Find the effective record for one session id
pub fn find_session(path: &Path, id: Uuid) -> Result<Option<Session>> {
    let mut found = None;
    for record in read_records(path)? {
        if record.id == id {
            found = Some(record);
        }
    }
    Ok(found)
}

/// The most recently appended session, by file order
pub fn latest_session(path: &Path) -> Result<Option<Session>> {
    Ok(replay(path)?.into_iter().last())
}
