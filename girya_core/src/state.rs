//! User state persistence with file locking.
//!
//! Reads tolerate missing or corrupted files by falling back to defaults;
//! writes go through a temp file and an atomic rename. `StateLock` extends
//! the same locking to a whole read-modify-write sequence.

use crate::{Error, Result, UserState};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl UserState {
    /// Load user state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<UserState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded user state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save user state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
        })?)?;

        // Exclusive lock on the temp file serializes concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old state file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }
}

/// Exclusive lock over a whole read-modify-write on one state file.
///
/// The lock lives in a sidecar file next to the state file, so plain reads
/// stay cheap and state files in different data directories never contend.
/// Held from acquisition until drop.
pub struct StateLock {
    file: File,
}

impl StateLock {
    /// Block until the lock for this state file is held
    pub fn acquire(state_path: &Path) -> Result<Self> {
        let lock_path = state_path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        tracing::debug!("Acquired state lock {:?}", lock_path);
        Ok(Self { file })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bucket, PowerFrequency, WeekMode};

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let mut state = UserState::default();
        state.next_priority_bucket = Bucket::Hinge;
        state.week_mode = WeekMode::B;
        state.cooldown_counter = 2;
        state.power_frequency = PowerFrequency::Weekly;
        state.last_session_exercises = vec!["pushup".into(), "kb_row".into()];

        state.save(&state_path).unwrap();
        let loaded = UserState::load(&state_path).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("nonexistent.json");

        let state = UserState::load(&state_path).unwrap();
        assert_eq!(state.next_priority_bucket, Bucket::Squat);
        assert_eq!(state.cooldown_counter, 0);
    }

    #[test]
    fn test_corrupted_state_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("corrupted.json");

        std::fs::write(&state_path, "{ invalid json }").unwrap();

        let state = UserState::load(&state_path).unwrap();
        assert_eq!(state.next_priority_bucket, Bucket::Squat);
        assert_eq!(state.cooldown_counter, 0);
        assert!(state.last_session_exercises.is_empty());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        UserState::default().save(&state_path).unwrap();

        UserState::update(&state_path, |state| {
            state.cooldown_counter = 2;
            Ok(())
        })
        .unwrap();

        let loaded = UserState::load(&state_path).unwrap();
        assert_eq!(loaded.cooldown_counter, 2);
    }

    #[test]
    fn test_atomic_save_leaves_no_stray_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        UserState::default().save(&state_path).unwrap();

        assert!(state_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only state.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_state_lock_serializes_read_modify_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");
        UserState::default().save(&state_path).unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let path = state_path.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..25 {
                    let _guard = StateLock::acquire(&path).unwrap();
                    let mut state = UserState::load(&path).unwrap();
                    state.cooldown_counter += 1;
                    state.save(&path).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let final_state = UserState::load(&state_path).unwrap();
        assert_eq!(final_state.cooldown_counter, 100);
    }

    #[test]
    fn test_state_lock_releases_on_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        {
            let _guard = StateLock::acquire(&state_path).unwrap();
        }
        // Reacquiring immediately must not deadlock
        let _again = StateLock::acquire(&state_path).unwrap();
    }
}
