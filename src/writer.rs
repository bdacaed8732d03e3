//! Encoding records to ISO 2709.
//!
//! Used to re-emit a decoded catalog record ([`crate::BibRecord::to_marc`])
//! and to build segment fixtures in tests.
//!
//! ```
//! use vger::{decode_first, Field, Leader, MarcWriter, Record};
//!
//! let mut record = Record::new(Leader::bibliographic());
//! let mut field = Field::new("245".to_string(), '1', '0');
//! field.add_subfield('a', "Title".to_string());
//! record.add_field(field);
//!
//! let mut buffer = Vec::new();
//! MarcWriter::new(&mut buffer).write_record(&record)?;
//! assert_eq!(decode_first(&buffer, encoding_rs::UTF_8)?.title(), Some("Title"));
//! # Ok::<(), vger::MarcError>(())
//! ```

use std::io::Write;

use crate::error::MarcError;
use crate::leader::LEADER_LEN;
use crate::reader::{FIELD_TERMINATOR, RECORD_TERMINATOR, SUBFIELD_DELIMITER};
use crate::record::Record;

/// Writer for ISO 2709 binary MARC records.
#[derive(Debug)]
pub struct MarcWriter<W: Write> {
    writer: W,
    records_written: usize,
}

impl<W: Write> MarcWriter<W> {
    /// Create a new writer.
    pub fn new(writer: W) -> Self {
        MarcWriter {
            writer,
            records_written: 0,
        }
    }

    /// Serialize one record, recomputing the leader's length counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not fit the ISO 2709 size limits
    /// or the underlying writer fails.
    pub fn write_record(&mut self, record: &Record) -> Result<(), MarcError> {
        let mut data_area = Vec::new();
        let mut directory = Vec::new();

        for (tag, values) in &record.control_fields {
            for value in values {
                let start = data_area.len();
                data_area.extend_from_slice(value.as_bytes());
                data_area.push(FIELD_TERMINATOR);
                push_entry(&mut directory, tag, data_area.len() - start, start)?;
            }
        }

        for field in record.fields() {
            let start = data_area.len();
            data_area.push(field.indicator1 as u8);
            data_area.push(field.indicator2 as u8);
            for subfield in &field.subfields {
                data_area.push(SUBFIELD_DELIMITER);
                let mut code = [0u8; 4];
                data_area.extend_from_slice(subfield.code.encode_utf8(&mut code).as_bytes());
                data_area.extend_from_slice(subfield.value.as_bytes());
            }
            data_area.push(FIELD_TERMINATOR);
            push_entry(&mut directory, &field.tag, data_area.len() - start, start)?;
        }
        directory.push(FIELD_TERMINATOR);

        let base_address = LEADER_LEN + directory.len();
        let record_length = base_address + data_area.len() + 1;
        if record_length > 99_999 {
            return Err(MarcError::InvalidRecord(format!(
                "Record length {record_length} exceeds 99999 bytes"
            )));
        }

        let mut leader = record.leader.clone();
        leader.record_length = u32::try_from(record_length)
            .map_err(|_| MarcError::InvalidRecord("Record length overflow".to_string()))?;
        leader.data_base_address = u32::try_from(base_address)
            .map_err(|_| MarcError::InvalidRecord("Base address overflow".to_string()))?;

        self.writer.write_all(&leader.as_bytes()?)?;
        self.writer.write_all(&directory)?;
        self.writer.write_all(&data_area)?;
        self.writer.write_all(&[RECORD_TERMINATOR])?;

        self.records_written += 1;
        Ok(())
    }

    /// Number of records written so far.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }
}

/// Encode a single record to a fresh buffer.
///
/// # Errors
///
/// See [`MarcWriter::write_record`].
pub fn encode_record(record: &Record) -> Result<Vec<u8>, MarcError> {
    let mut buffer = Vec::new();
    MarcWriter::new(&mut buffer).write_record(record)?;
    Ok(buffer)
}

fn push_entry(
    directory: &mut Vec<u8>,
    tag: &str,
    length: usize,
    start: usize,
) -> Result<(), MarcError> {
    if tag.len() != 3 {
        return Err(MarcError::InvalidField(format!(
            "Tag {tag:?} must be 3 characters"
        )));
    }
    if length > 9_999 {
        return Err(MarcError::InvalidField(format!(
            "Field {tag} is {length} bytes, the limit is 9999"
        )));
    }
    directory.extend_from_slice(tag.as_bytes());
    directory.extend_from_slice(format!("{length:04}{start:05}").as_bytes());
    Ok(())
}
