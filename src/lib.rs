//! # power-reader
//!
//! Bridges AIDA64 power sensor readings to flat per-sensor files.
//!
//! AIDA64 publishes its current sensor values as a NUL-terminated XML
//! buffer in a named shared-memory mapping (`AIDA64_SensorValues`). This
//! crate polls that mapping, decodes the buffer into typed sensor records,
//! and persists each power reading (divided by ten) to an `<id>.sensor`
//! file that an external display - an OS widget, peripheral firmware -
//! can poll.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          App                               │
//! │  ┌─────────┐      ┌──────────┐      ┌────────────────┐    │
//! │  │ source  │─────▶│   data   │─────▶│     writer     │    │
//! │  │ (bytes) │      │ (decode) │      │ (<id>.sensor)  │    │
//! │  └────┬────┘      └──────────┘      └────────────────┘    │
//! │       │                                                    │
//! │       ▼                                                    │
//! │  SharedMemoryApi ◀── Windows mapping calls | test fake     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Acquisition - the [`SensorSource`] trait, the
//!   shared-memory reader behind the [`source::SharedMemoryApi`] seam,
//!   and the [`SensorFetcher`] facade
//! - **[`data`]**: The sensor data model and the streaming XML decode
//! - **[`writer`]**: Sanitized per-sensor file persistence
//! - **[`app`]**: The fixed-interval polling loop tying it all together
//!
//! ## Usage
//!
//! ```no_run
//! use power_reader::{AcquisitionMode, App, SensorFetcher, SensorFileWriter};
//!
//! let source = SensorFetcher::new(AcquisitionMode::SharedMemory);
//! let app = App::new(Box::new(source), SensorFileWriter::new());
//! app.run();
//! ```
//!
//! Every failure in this crate is recoverable by design: a missing
//! mapping (producer not running), a malformed sensor element, or an
//! unwritable file is logged and retried on the next tick. Nothing here
//! terminates the process.

pub mod app;
pub mod data;
pub mod source;
pub mod writer;

// Re-export main types for convenience
pub use app::{App, POLL_INTERVAL};
pub use data::{decode, SensorKind, SensorRecord, SensorSnapshot};
pub use source::{
    AcquisitionError, AcquisitionMode, FetchError, SensorFetcher, SensorSource,
    SHARED_MEMORY_NAME,
};
pub use writer::{SensorFileWriter, WriteError};
