//! Reassembly of records stored as ordered binary segments.
//!
//! The catalog splits each MARC record across rows of a `*_data` table keyed
//! by a sequence number. [`reassemble`] concatenates them in sequence order
//! and [`decode_segments`] turns the result into one [`Record`].

use encoding_rs::Encoding;
use tracing::debug;

use crate::error::{RecordKind, Result, VgerError};
use crate::reader::{decode_first, RECORD_TERMINATOR};
use crate::record::Record;

/// One stored fragment of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position of the fragment within the record.
    pub seqnum: i64,
    /// Raw fragment bytes.
    pub data: Vec<u8>,
}

impl Segment {
    /// Create a segment.
    #[must_use]
    pub fn new(seqnum: i64, data: impl Into<Vec<u8>>) -> Self {
        Segment {
            seqnum,
            data: data.into(),
        }
    }
}

/// Concatenate segments in ascending sequence order.
///
/// The sort is stable, so segments sharing a sequence number keep their
/// input order.
#[must_use]
pub fn reassemble(mut segments: Vec<Segment>) -> Vec<u8> {
    segments.sort_by_key(|segment| segment.seqnum);
    let total = segments.iter().map(|segment| segment.data.len()).sum();
    segments
        .into_iter()
        .fold(Vec::with_capacity(total), |mut buffer, segment| {
            buffer.extend_from_slice(&segment.data);
            buffer
        })
}

/// Reassemble and decode one record.
///
/// Only the first record in the buffer is decoded; trailing bytes are
/// logged and ignored.
///
/// # Errors
///
/// - [`VgerError::NotFound`] when there are no segments
/// - [`VgerError::Decode`] for malformed framing
/// - [`VgerError::TextDecode`] when field text is not valid in `encoding`
pub fn decode_segments(
    kind: RecordKind,
    id: i64,
    segments: Vec<Segment>,
    encoding: &'static Encoding,
) -> Result<Record> {
    if segments.is_empty() {
        return Err(VgerError::NotFound {
            kind,
            key: id.to_string(),
        });
    }

    let bytes = reassemble(segments);
    let record = decode_first(&bytes, encoding).map_err(|e| VgerError::from_marc(kind, id, e))?;

    let consumed = record.leader.record_length as usize;
    if let Some(trailing) = bytes.get(consumed..).filter(|rest| !rest.is_empty()) {
        debug!(
            %kind,
            id,
            trailing_bytes = trailing.len(),
            extra_records = memchr::memchr_iter(RECORD_TERMINATOR, trailing).count(),
            "ignoring data after the first record"
        );
    }

    Ok(record)
}
