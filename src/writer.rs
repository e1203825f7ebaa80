//! Per-sensor file persistence.
//!
//! Each power reading lands in a flat `<id>.sensor` file holding the value
//! as fixed six-decimal text, for an external display to poll. Files go
//! next to the executable when possible, otherwise under a `PowerSensor`
//! directory in the user's local data dir.

use std::io;
use std::path::{Path, PathBuf};
use std::{env, fs};

use thiserror::Error;
use tracing::debug;

const FILE_EXTENSION: &str = "sensor";
const FALLBACK_DIR_NAME: &str = "PowerSensor";

/// A failed sensor-file write. Recoverable: the caller logs it and moves
/// on to the next record.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The sensor id does not reduce to a usable file stem.
    #[error("sensor id {0:?} does not reduce to a usable file name")]
    InvalidId(String),

    /// The platform reports no local data directory to fall back to.
    #[error("no local data directory available for sensor files")]
    NoDataDir,

    /// Writing the file itself failed.
    #[error("failed to write sensor file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes sensor values to flat per-sensor files.
#[derive(Debug, Default)]
pub struct SensorFileWriter {
    /// Overrides the executable-directory probe (tests only).
    primary_dir: Option<PathBuf>,
    /// Overrides the local-data fallback (tests only).
    fallback_dir: Option<PathBuf>,
}

impl SensorFileWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_dirs(primary: Option<&Path>, fallback: Option<&Path>) -> Self {
        Self {
            primary_dir: primary.map(Path::to_path_buf),
            fallback_dir: fallback.map(Path::to_path_buf),
        }
    }

    /// Persist one sensor value as six-decimal text under `<id>.sensor`.
    ///
    /// Returns the path written. The executable's directory is tried
    /// first; any failure there falls through to the local data dir.
    pub fn write(&self, id: &str, value: f64) -> Result<PathBuf, WriteError> {
        let stem = sanitize_id(id).ok_or_else(|| WriteError::InvalidId(id.to_string()))?;
        let file_name = format!("{stem}.{FILE_EXTENSION}");
        let contents = format!("{value:.6}");

        if let Some(dir) = self.primary_dir() {
            let path = dir.join(&file_name);
            match fs::write(&path, &contents) {
                Ok(()) => return Ok(path),
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "primary location not writable, falling back");
                }
            }
        }

        let dir = self.fallback_dir().ok_or(WriteError::NoDataDir)?;
        fs::create_dir_all(&dir).map_err(|source| WriteError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(&file_name);
        fs::write(&path, &contents).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn primary_dir(&self) -> Option<PathBuf> {
        self.primary_dir.clone().or_else(|| {
            env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
        })
    }

    fn fallback_dir(&self) -> Option<PathBuf> {
        self.fallback_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(FALLBACK_DIR_NAME)))
    }
}

/// Reduce a sensor id to a safe file stem.
///
/// Sensor ids come from an external producer and become file names, so
/// anything outside `[A-Za-z0-9._-]` is replaced with `_` and leading dots
/// are stripped. Returns `None` when nothing usable remains.
fn sanitize_id(id: &str) -> Option<String> {
    let stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_formats_six_decimals() {
        let dir = tempdir().unwrap();
        let writer = SensorFileWriter::with_dirs(Some(dir.path()), None);

        let path = writer.write("PWR1", 4.25).unwrap();
        assert_eq!(path, dir.path().join("PWR1.sensor"));
        assert_eq!(fs::read_to_string(path).unwrap(), "4.250000");
    }

    #[test]
    fn test_write_overwrites_previous_value() {
        let dir = tempdir().unwrap();
        let writer = SensorFileWriter::with_dirs(Some(dir.path()), None);

        writer.write("PWR1", 1.0).unwrap();
        let path = writer.write("PWR1", 2.0).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "2.000000");
    }

    #[test]
    fn test_write_falls_back_when_primary_unwritable() {
        let fallback = tempdir().unwrap();
        let fallback_dir = fallback.path().join("PowerSensor");
        let writer = SensorFileWriter::with_dirs(
            Some(Path::new("/nonexistent/primary")),
            Some(&fallback_dir),
        );

        let path = writer.write("PWR1", 4.25).unwrap();
        assert_eq!(path, fallback_dir.join("PWR1.sensor"));
        assert_eq!(fs::read_to_string(path).unwrap(), "4.250000");
    }

    #[test]
    fn test_write_sanitizes_path_separators() {
        let dir = tempdir().unwrap();
        let writer = SensorFileWriter::with_dirs(Some(dir.path()), None);

        let path = writer.write("../PWR/1", 1.5).unwrap();
        // ".._PWR_1" then leading dots stripped
        assert_eq!(path, dir.path().join("_PWR_1.sensor"));
    }

    #[test]
    fn test_write_rejects_unusable_ids() {
        let dir = tempdir().unwrap();
        let writer = SensorFileWriter::with_dirs(Some(dir.path()), None);

        assert!(matches!(writer.write("", 1.0), Err(WriteError::InvalidId(_))));
        assert!(matches!(
            writer.write("...", 1.0),
            Err(WriteError::InvalidId(_))
        ));
    }

    #[test]
    fn test_sanitize_keeps_safe_ids_untouched() {
        assert_eq!(sanitize_id("PWRCPU"), Some("PWRCPU".to_string()));
        assert_eq!(sanitize_id("fan-1.rpm"), Some("fan-1.rpm".to_string()));
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_id("a/b\\c:d"), Some("a_b_c_d".to_string()));
        assert_eq!(sanitize_id("spaced id"), Some("spaced_id".to_string()));
    }
}
