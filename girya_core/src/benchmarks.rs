//! Strength benchmark persistence.
//!
//! Benchmarks are reference numbers the user maintains by hand; the engine
//! never writes them during planning and only reads `available_bells_kg`
//! for load suggestions. Reads tolerate a missing or corrupted file the
//! same way state reads do.

use crate::types::Benchmarks;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl Benchmarks {
    /// Load benchmarks from a file with shared locking
    ///
    /// Returns defaults if the file doesn't exist or fails to parse.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No benchmarks file found, using defaults");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open benchmarks file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock benchmarks file {:?}: {}. Using defaults.",
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
                "Failed to read benchmarks file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<Benchmarks>(&contents) {
            Ok(benchmarks) => Ok(benchmarks),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse benchmarks file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save benchmarks atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "benchmarks path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved benchmarks to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let benchmarks = Benchmarks::load(&temp_dir.path().join("none.json")).unwrap();
        assert_eq!(benchmarks.available_bells_kg, vec![16, 24, 28, 32]);
        assert!(benchmarks.press_bell_kg.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("benchmarks.json");

        let mut benchmarks = Benchmarks::default();
        benchmarks.press_bell_kg = Some(24);
        benchmarks.press_reps = Some(5);
        benchmarks.pullup_max = Some(12);
        benchmarks.available_bells_kg = vec![16, 32];
        benchmarks.save(&path).unwrap();

        let loaded = Benchmarks::load(&path).unwrap();
        assert_eq!(loaded, benchmarks);
    }

    #[test]
    fn test_corrupted_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("benchmarks.json");
        std::fs::write(&path, "{not json").unwrap();

        let benchmarks = Benchmarks::load(&path).unwrap();
        assert_eq!(benchmarks.available_bells_kg, vec![16, 24, 28, 32]);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("benchmarks.json");
        std::fs::write(&path, r#"{"pullup_max": 8}"#).unwrap();

        let benchmarks = Benchmarks::load(&path).unwrap();
        assert_eq!(benchmarks.pullup_max, Some(8));
        assert_eq!(benchmarks.available_bells_kg, vec![16, 24, 28, 32]);
    }
}
