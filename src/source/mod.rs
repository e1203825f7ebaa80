//! Sensor acquisition.
//!
//! This module provides a trait-based abstraction for obtaining sensor
//! snapshots ([`SensorSource`]) and the concrete [`SensorFetcher`] that
//! reads AIDA64's shared-memory buffer and decodes it.

mod shared_memory;

pub use shared_memory::{acquire_raw_buffer, AcquisitionError, SharedMemoryApi, SystemApi};

use std::fmt::Debug;

use thiserror::Error;

use crate::data::{decode, SensorSnapshot};

/// Name of the mapping AIDA64 publishes its sensor XML under.
pub const SHARED_MEMORY_NAME: &str = "AIDA64_SensorValues";

/// A failed snapshot fetch. Recoverable: the caller logs it and retries
/// on the next polling tick.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to acquire sensor buffer")]
    Acquisition(#[from] AcquisitionError),
}

/// How the raw sensor buffer is obtained.
///
/// Only shared memory exists today; the enum leaves room for other IPC
/// mechanisms without changing the fetcher's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Read the `AIDA64_SensorValues` named shared-memory mapping.
    SharedMemory,
}

/// Trait for obtaining sensor snapshots.
///
/// Implementations take `&self` and hold no mutable state, so overlapping
/// calls from an external scheduler are safe.
pub trait SensorSource: Send + Debug {
    /// Fetch the current snapshot.
    fn sensor_data(&self) -> Result<SensorSnapshot, FetchError>;

    /// Human-readable description of the source, for log lines.
    fn description(&self) -> &str;
}

/// Fetches sensor snapshots according to its [`AcquisitionMode`].
///
/// Stateless across calls: every fetch opens, reads and releases the
/// mapping independently.
#[derive(Debug)]
pub struct SensorFetcher<A: SharedMemoryApi = SystemApi> {
    mode: AcquisitionMode,
    api: A,
    description: String,
}

impl SensorFetcher<SystemApi> {
    /// Create a fetcher backed by the platform's shared-memory API.
    pub fn new(mode: AcquisitionMode) -> Self {
        Self::with_api(mode, SystemApi)
    }
}

impl<A: SharedMemoryApi> SensorFetcher<A> {
    /// Create a fetcher with a custom platform provider (used by tests).
    pub fn with_api(mode: AcquisitionMode, api: A) -> Self {
        let description = match mode {
            AcquisitionMode::SharedMemory => format!("shared memory: {SHARED_MEMORY_NAME}"),
        };
        Self {
            mode,
            api,
            description,
        }
    }

    /// The configured acquisition mode.
    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }
}

impl<A: SharedMemoryApi + Send + Debug> SensorSource for SensorFetcher<A> {
    fn sensor_data(&self) -> Result<SensorSnapshot, FetchError> {
        match self.mode {
            AcquisitionMode::SharedMemory => {
                let raw = acquire_raw_buffer(&self.api, SHARED_MEMORY_NAME)?;
                Ok(decode(&raw))
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}
