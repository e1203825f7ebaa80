//! Shared types for sensor snapshots.
//!
//! These types mirror the element structure AIDA64 publishes in its
//! shared-memory XML buffer. They serve as the common data format between
//! the acquisition/decode layer and downstream consumers.

/// One physical sensor reading. Immutable once decoded.
///
/// `id` doubles as the file-system key under which the reading is
/// persisted, so the writer sanitizes it before use.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    /// Stable sensor identifier (e.g. `PWRCPU`).
    pub id: String,
    /// Human-readable sensor name (e.g. `CPU Package`).
    pub label: String,
    /// Current reading, unit depending on the sensor kind.
    pub value: f64,
}

/// The four sensor categories AIDA64 reports, keyed by XML tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// `<fan>` elements - fan speeds in RPM.
    Fan,
    /// `<volt>` elements - voltage rails.
    Voltage,
    /// `<curr>` elements - current draw.
    Current,
    /// `<pwr>` elements - power draw in watts.
    Power,
}

impl SensorKind {
    /// Map an XML local tag name to a sensor kind.
    ///
    /// Returns `None` for every other element, which the decoder skips.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"fan" => Some(SensorKind::Fan),
            b"volt" => Some(SensorKind::Voltage),
            b"curr" => Some(SensorKind::Current),
            b"pwr" => Some(SensorKind::Power),
            _ => None,
        }
    }
}

/// One point-in-time capture of all recognized sensors.
///
/// Records are partitioned by their source tag, in document order within
/// each sequence. A snapshot is built fresh on every read and carries no
/// identity across reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    pub fans: Vec<SensorRecord>,
    pub voltages: Vec<SensorRecord>,
    pub currents: Vec<SensorRecord>,
    pub powers: Vec<SensorRecord>,
}

impl SensorSnapshot {
    /// Append a record to the sequence matching its kind.
    pub fn push(&mut self, kind: SensorKind, record: SensorRecord) {
        match kind {
            SensorKind::Fan => self.fans.push(record),
            SensorKind::Voltage => self.voltages.push(record),
            SensorKind::Current => self.currents.push(record),
            SensorKind::Power => self.powers.push(record),
        }
    }

    /// Total number of records across all four sequences.
    pub fn len(&self) -> usize {
        self.fans.len() + self.voltages.len() + self.currents.len() + self.powers.len()
    }

    /// Returns true if no sensor was captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
