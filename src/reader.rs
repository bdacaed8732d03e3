//! Decoding ISO 2709 records.
//!
//! [`MarcReader`] reads one record per call from any [`std::io::Read`]
//! source. Field text is decoded strictly in a configured encoding (UTF-8 by
//! default): bytes that do not decode are an error rather than being replaced,
//! so a record stored in a foreign encoding is reported instead of silently
//! mangled.
//!
//! ```
//! use std::io::Cursor;
//! use vger::MarcReader;
//!
//! let mut reader = MarcReader::new(Cursor::new(Vec::new()));
//! assert!(reader.read_record()?.is_none());
//! # Ok::<(), vger::MarcError>(())
//! ```

use std::io::Read;

use encoding_rs::{Encoding, UTF_8};

use crate::error::MarcError;
use crate::leader::{Leader, LEADER_LEN};
use crate::record::{Field, Record};

pub(crate) const FIELD_TERMINATOR: u8 = 0x1E;
pub(crate) const SUBFIELD_DELIMITER: u8 = 0x1F;
pub(crate) const RECORD_TERMINATOR: u8 = 0x1D;

/// Reader for ISO 2709 binary MARC records.
#[derive(Debug)]
pub struct MarcReader<R: Read> {
    reader: R,
    encoding: &'static Encoding,
    records_read: usize,
}

impl<R: Read> MarcReader<R> {
    /// Create a reader that expects UTF-8 field data.
    pub fn new(reader: R) -> Self {
        MarcReader {
            reader,
            encoding: UTF_8,
            records_read: 0,
        }
    }

    /// Expect field data in `encoding` instead of UTF-8.
    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Number of records returned so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Read the next record.
    ///
    /// Consumes exactly the bytes the leader's record length declares, so
    /// anything after the first record boundary is left in the source.
    /// Returns `Ok(None)` at a clean end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the framing is malformed, the input ends inside a
    /// record, or field text is not valid in the expected encoding.
    pub fn read_record(&mut self) -> Result<Option<Record>, MarcError> {
        let mut leader_bytes = [0u8; LEADER_LEN];
        match self.reader.read_exact(&mut leader_bytes) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(MarcError::IoError(e)),
        }

        let leader = Leader::from_bytes(&leader_bytes)?;
        leader.validate_for_reading()?;

        let mut body = vec![0u8; leader.record_length as usize - LEADER_LEN];
        self.reader.read_exact(&mut body).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                MarcError::TruncatedRecord(format!(
                    "expected {} bytes after the leader",
                    body.len()
                ))
            } else {
                MarcError::IoError(e)
            }
        })?;

        let record = parse_body(leader, &body, self.encoding)?;
        self.records_read += 1;
        Ok(Some(record))
    }
}

/// Decode the first record in `bytes`, ignoring anything after its boundary.
///
/// # Errors
///
/// Returns an error if `bytes` is empty or the first record is malformed.
pub fn decode_first(bytes: &[u8], encoding: &'static Encoding) -> Result<Record, MarcError> {
    MarcReader::new(bytes)
        .with_encoding(encoding)
        .read_record()?
        .ok_or_else(|| MarcError::TruncatedRecord("no record data".to_string()))
}

fn parse_body(
    leader: Leader,
    body: &[u8],
    encoding: &'static Encoding,
) -> Result<Record, MarcError> {
    let base = leader.data_base_address as usize - LEADER_LEN;
    let directory = &body[..base];
    let data = &body[base..];
    let mut record = Record::new(leader);

    // Directory entries are 12 bytes: tag(3) length(4) start(5)
    let mut pos = 0;
    while pos < directory.len() && directory[pos] != FIELD_TERMINATOR {
        let Some(entry) = directory.get(pos..pos + 12) else {
            return Err(MarcError::InvalidRecord(
                "Incomplete directory entry".to_string(),
            ));
        };
        pos += 12;

        let tag = String::from_utf8_lossy(&entry[0..3]).to_string();
        let length = parse_number(&entry[3..7])?;
        let start = parse_number(&entry[7..12])?;
        let Some(field_data) = data.get(start..start + length) else {
            return Err(MarcError::InvalidRecord(format!(
                "Field {tag} exceeds data area"
            )));
        };

        if is_control_tag(&tag) {
            let raw = field_data
                .strip_suffix(&[FIELD_TERMINATOR])
                .unwrap_or(field_data);
            let value = decode_text(raw, &tag, encoding)?;
            record.add_control_field(tag, value);
        } else {
            let field = parse_data_field(field_data, tag, encoding)?;
            record.add_field(field);
        }
    }

    Ok(record)
}

fn is_control_tag(tag: &str) -> bool {
    tag.len() == 3 && tag.bytes().all(|b| b.is_ascii_digit()) && tag < "010"
}

fn parse_data_field(
    data: &[u8],
    tag: String,
    encoding: &'static Encoding,
) -> Result<Field, MarcError> {
    if data.len() < 2 {
        return Err(MarcError::InvalidField(format!(
            "Tag {tag}: data field too short (needs indicators)"
        )));
    }

    let mut field = Field::new(tag, data[0] as char, data[1] as char);
    let mut rest = &data[2..];

    while let Some((&first, tail)) = rest.split_first() {
        if first == FIELD_TERMINATOR {
            break;
        }
        if first != SUBFIELD_DELIMITER {
            return Err(MarcError::InvalidField(format!(
                "Tag {}: expected subfield delimiter",
                field.tag
            )));
        }
        let Some((&code, tail)) = tail.split_first() else {
            break;
        };
        let end = tail
            .iter()
            .position(|&b| b == SUBFIELD_DELIMITER || b == FIELD_TERMINATOR)
            .unwrap_or(tail.len());
        let value = decode_text(&tail[..end], &field.tag, encoding)?;
        field.add_subfield(code as char, value);
        rest = &tail[end..];
    }

    Ok(field)
}

fn decode_text(bytes: &[u8], tag: &str, encoding: &'static Encoding) -> Result<String, MarcError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| MarcError::EncodingError {
            tag: tag.to_string(),
            encoding: encoding.name(),
        })
}

/// Parse a fixed-width ASCII number from a directory entry.
fn parse_number(bytes: &[u8]) -> Result<usize, MarcError> {
    let mut result = 0usize;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return Err(MarcError::InvalidRecord(format!(
                "Invalid numeric field: expected digits, got byte {}",
                byte as char
            )));
        }
        result = result * 10 + (byte - b'0') as usize;
    }
    Ok(result)
}
