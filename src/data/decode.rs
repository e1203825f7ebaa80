//! Streaming XML decode of the shared-memory sensor buffer.
//!
//! The buffer AIDA64 publishes is one XML document with `<fan>`, `<volt>`,
//! `<curr>` and `<pwr>` elements, each holding `<id>`, `<label>` and
//! `<value>` children. The decode is a forward token scan: it never
//! requires the document to be well-formed end-to-end, skips elements it
//! does not recognize, and drops an individual malformed element without
//! aborting the rest of the capture.

use std::borrow::Cow;

use quick_xml::escape::{unescape, EscapeError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::warn;

use super::record::{SensorKind, SensorRecord, SensorSnapshot};

/// Why a single sensor element (or the remaining stream) was given up on.
#[derive(Debug, Error)]
enum ElementError {
    #[error("xml stream error: {0}")]
    Stream(#[from] quick_xml::Error),
    #[error("input ended before the closing tag")]
    Truncated,
    #[error("missing <{0}> child")]
    MissingField(&'static str),
    #[error("malformed <value>: {0:?}")]
    InvalidValue(String),
    #[error("invalid escape sequence: {0}")]
    Escape(#[from] EscapeError),
}

impl ElementError {
    /// Stream-level failures end the scan; element-level ones are skipped.
    fn is_stream_level(&self) -> bool {
        matches!(self, ElementError::Stream(_) | ElementError::Truncated)
    }
}

/// Decode a raw sensor buffer into a snapshot.
///
/// Total by contract: a malformed element is logged and skipped, a
/// truncated or otherwise broken stream ends the scan early, and whatever
/// was accumulated so far is returned. Identical input always yields an
/// identical snapshot.
pub fn decode(raw: &[u8]) -> SensorSnapshot {
    // The producer writes UTF-8/ASCII; anything else is replaced rather
    // than rejected so one bad byte cannot void a whole capture.
    let text = String::from_utf8_lossy(raw);
    let mut reader = Reader::from_str(&text);
    reader.config_mut().trim_text(true);

    let mut snapshot = SensorSnapshot::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let Some(kind) = SensorKind::from_tag(start.local_name().as_ref()) else {
                    continue; // wrapping root or unrelated section
                };
                match read_record(&mut reader, &start) {
                    Ok(record) => snapshot.push(kind, record),
                    Err(err) if err.is_stream_level() => {
                        warn!(error = %err, "sensor stream ended mid-element");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, kind = ?kind, "skipping malformed sensor element");
                    }
                }
            }
            // A self-closing sensor element has no children at all
            Ok(Event::Empty(start)) => {
                if let Some(kind) = SensorKind::from_tag(start.local_name().as_ref()) {
                    warn!(kind = ?kind, "skipping empty sensor element");
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "stopping sensor scan on xml stream error");
                break;
            }
        }
    }

    snapshot
}

/// Read the children of one recognized sensor element into a record,
/// consuming events up to (and including) its closing tag.
fn read_record<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'a>,
) -> Result<SensorRecord, ElementError> {
    let mut id = None;
    let mut label = None;
    let mut value = None;

    loop {
        match reader.read_event()? {
            Event::Start(child) => match child.local_name().as_ref() {
                b"id" => id = Some(child_text(reader.read_text(child.name())?)?),
                b"label" => label = Some(child_text(reader.read_text(child.name())?)?),
                b"value" => value = Some(child_text(reader.read_text(child.name())?)?),
                _ => {
                    reader.read_to_end(child.name())?;
                }
            },
            Event::End(end) if end.name() == start.name() => break,
            Event::Eof => return Err(ElementError::Truncated),
            _ => {}
        }
    }

    let id = id.ok_or(ElementError::MissingField("id"))?;
    let label = label.ok_or(ElementError::MissingField("label"))?;
    let raw_value = value.ok_or(ElementError::MissingField("value"))?;
    let value = raw_value
        .trim()
        .parse::<f64>()
        .map_err(|_| ElementError::InvalidValue(raw_value))?;

    Ok(SensorRecord { id, label, value })
}

/// Resolve XML entities in a child element's raw text span.
///
/// `read_text` returns the span as written; entity references
/// (`&amp;`, `&#52;`, ...) still need resolving before the text is usable.
fn child_text(raw: Cow<'_, str>) -> Result<String, ElementError> {
    Ok(unescape(&raw)?.into_owned())
}
