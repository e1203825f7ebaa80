//! Sensor data model and XML decoding.
//!
//! ## Submodules
//!
//! - [`record`]: Plain record and snapshot types ([`SensorRecord`],
//!   [`SensorSnapshot`], [`SensorKind`])
//! - [`decode`]: Streaming XML decode of the raw shared-memory buffer
//!
//! ## Data flow
//!
//! ```text
//! raw bytes (NUL-terminated XML from shared memory)
//!        |
//!        v
//! decode::decode()
//!        |
//!        +--> SensorSnapshot { fans, voltages, currents, powers }
//! ```

pub mod decode;
pub mod record;

pub use decode::decode;
pub use record::{SensorKind, SensorRecord, SensorSnapshot};
