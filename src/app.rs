//! The polling application.
//!
//! Once per fixed interval the app fetches a snapshot from its sensor
//! source and persists every power reading, divided by ten, through the
//! file writer. No failure in a tick terminates the loop; the retry
//! cadence is the interval itself.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::source::SensorSource;
use crate::writer::SensorFileWriter;

/// How often the sensor snapshot is refreshed.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Divisor applied to power readings before they are persisted.
const POWER_DIVISOR: f64 = 10.0;

/// Owns the wiring between a sensor source and the file writer.
#[derive(Debug)]
pub struct App {
    source: Box<dyn SensorSource>,
    writer: SensorFileWriter,
    interval: Duration,
}

impl App {
    pub fn new(source: Box<dyn SensorSource>, writer: SensorFileWriter) -> Self {
        Self {
            source,
            writer,
            interval: POLL_INTERVAL,
        }
    }

    /// One polling tick: fetch a snapshot and persist every power reading.
    ///
    /// A fetch failure is logged and absorbed (the producer is often
    /// simply not running yet); a single write failure does not stop the
    /// remaining records.
    pub fn poll_once(&self) {
        let snapshot = match self.source.sensor_data() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    source = self.source.description(),
                    error = %err,
                    "failed to read sensor values"
                );
                return;
            }
        };

        for (index, sensor) in snapshot.powers.iter().enumerate() {
            info!(index, id = %sensor.id, value = sensor.value, "power sensor");

            let scaled = sensor.value / POWER_DIVISOR;
            match self.writer.write(&sensor.id, scaled) {
                Ok(path) => debug!(path = %path.display(), "sensor file updated"),
                Err(err) => {
                    warn!(id = %sensor.id, error = %err, "failed to write sensor file");
                }
            }
        }
    }

    /// Poll forever at the fixed interval.
    pub fn run(&self) {
        info!(
            source = self.source.description(),
            interval_secs = self.interval.as_secs(),
            "starting update loop"
        );
        loop {
            self.poll_once();
            thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SensorRecord, SensorSnapshot};
    use crate::source::{AcquisitionError, FetchError};
    use std::fs;
    use tempfile::tempdir;

    #[derive(Debug)]
    struct FixedSource {
        snapshot: Option<SensorSnapshot>,
    }

    impl SensorSource for FixedSource {
        fn sensor_data(&self) -> Result<SensorSnapshot, FetchError> {
            match &self.snapshot {
                Some(snapshot) => Ok(snapshot.clone()),
                None => Err(FetchError::Acquisition(AcquisitionError::NotFound {
                    name: "test".to_string(),
                })),
            }
        }

        fn description(&self) -> &str {
            "fixed test source"
        }
    }

    fn power(id: &str, value: f64) -> SensorRecord {
        SensorRecord {
            id: id.to_string(),
            label: id.to_string(),
            value,
        }
    }

    fn writer_into(dir: &std::path::Path) -> SensorFileWriter {
        // Pin the primary location to the temp dir so tests never touch
        // the real executable or data directories.
        SensorFileWriter::with_dirs(Some(dir), None)
    }

    #[test]
    fn test_poll_once_persists_scaled_power_values() {
        let dir = tempdir().unwrap();
        let mut snapshot = SensorSnapshot::default();
        snapshot.powers.push(power("PWR1", 42.5));
        snapshot.powers.push(power("PWR2", 100.0));

        let app = App::new(
            Box::new(FixedSource {
                snapshot: Some(snapshot),
            }),
            writer_into(dir.path()),
        );
        app.poll_once();

        assert_eq!(
            fs::read_to_string(dir.path().join("PWR1.sensor")).unwrap(),
            "4.250000"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("PWR2.sensor")).unwrap(),
            "10.000000"
        );
    }

    #[test]
    fn test_poll_once_ignores_non_power_sensors() {
        let dir = tempdir().unwrap();
        let mut snapshot = SensorSnapshot::default();
        snapshot.fans.push(power("FAN1", 1200.0));

        let app = App::new(
            Box::new(FixedSource {
                snapshot: Some(snapshot),
            }),
            writer_into(dir.path()),
        );
        app.poll_once();

        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_poll_once_absorbs_fetch_failures() {
        let dir = tempdir().unwrap();
        let app = App::new(
            Box::new(FixedSource { snapshot: None }),
            writer_into(dir.path()),
        );

        // Must neither panic nor write anything
        app.poll_once();
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_poll_once_continues_past_a_bad_record() {
        let dir = tempdir().unwrap();
        let mut snapshot = SensorSnapshot::default();
        // Empty id cannot become a file name; the next record still lands
        snapshot.powers.push(power("", 10.0));
        snapshot.powers.push(power("PWR2", 20.0));

        let app = App::new(
            Box::new(FixedSource {
                snapshot: Some(snapshot),
            }),
            writer_into(dir.path()),
        );
        app.poll_once();

        assert_eq!(
            fs::read_to_string(dir.path().join("PWR2.sensor")).unwrap(),
            "2.000000"
        );
    }
}
