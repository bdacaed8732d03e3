//! The 24-byte MARC leader.
//!
//! Every record reassembled from catalog segments starts with a leader. The
//! catalog layer only needs a handful of its positions: the two length
//! counters that frame the record, the record type (to tell holdings from
//! bibliographic records) and the character coding flag.
//!
//! # Structure
//!
//! - Positions 0-4: Record length (5 digits)
//! - Position 5: Record status
//! - Position 6: Record type (`a` = language material, `x`/`y`/`v`/`u` = holdings)
//! - Position 7: Bibliographic level
//! - Position 8: Control record type
//! - Position 9: Character coding (space = MARC-8, a = UCS/Unicode)
//! - Positions 10-11: Indicator and subfield code counts
//! - Positions 12-16: Base address of data (5 digits)
//! - Positions 17-19: Encoding level, cataloging form, multipart level
//! - Positions 20-23: Entry map (usually "4500")

use crate::error::MarcError;
use serde::{Deserialize, Serialize};

/// Leader length in bytes.
pub const LEADER_LEN: usize = 24;

/// MARC leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    /// Record length - positions 0-4
    pub record_length: u32,
    /// Record status - position 5
    pub record_status: char,
    /// Type of record - position 6
    pub record_type: char,
    /// Bibliographic level - position 7
    pub bibliographic_level: char,
    /// Type of control - position 8
    pub control_record_type: char,
    /// Character coding scheme - position 9
    pub character_coding: char,
    /// Indicator count - position 10
    pub indicator_count: u8,
    /// Subfield code count - position 11
    pub subfield_code_count: u8,
    /// Base address of data - positions 12-16
    pub data_base_address: u32,
    /// Encoding level - position 17
    pub encoding_level: char,
    /// Cataloging form - position 18
    pub cataloging_form: char,
    /// Multipart resource record level - position 19
    pub multipart_level: char,
    /// Entry map - positions 20-23
    pub reserved: String,
}

impl Leader {
    /// Leader for a new Unicode bibliographic monograph record.
    ///
    /// Lengths are left at zero; the writer fills them in.
    #[must_use]
    pub fn bibliographic() -> Self {
        Leader {
            record_length: 0,
            record_status: 'n',
            record_type: 'a',
            bibliographic_level: 'm',
            control_record_type: ' ',
            character_coding: 'a',
            indicator_count: 2,
            subfield_code_count: 2,
            data_base_address: 0,
            encoding_level: ' ',
            cataloging_form: 'a',
            multipart_level: ' ',
            reserved: "4500".to_string(),
        }
    }

    /// Leader for a new Unicode single-part holdings record.
    #[must_use]
    pub fn holdings() -> Self {
        Leader {
            record_type: 'x',
            bibliographic_level: ' ',
            encoding_level: '2',
            cataloging_form: 'n',
            ..Leader::bibliographic()
        }
    }

    /// True when position 6 marks a holdings record.
    #[must_use]
    pub fn is_holdings(&self) -> bool {
        matches!(self.record_type, 'u' | 'v' | 'x' | 'y')
    }

    /// True when position 9 declares UCS/Unicode.
    #[must_use]
    pub fn is_unicode(&self) -> bool {
        self.character_coding == 'a'
    }

    /// Parse a leader from the first 24 bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidLeader`] if fewer than 24 bytes are given
    /// or a numeric position holds non-digits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MarcError> {
        if bytes.len() < LEADER_LEN {
            return Err(MarcError::InvalidLeader(format!(
                "Leader must be at least 24 bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Leader {
            record_length: parse_digits(&bytes[0..5])?,
            record_status: bytes[5] as char,
            record_type: bytes[6] as char,
            bibliographic_level: bytes[7] as char,
            control_record_type: bytes[8] as char,
            character_coding: bytes[9] as char,
            indicator_count: parse_count(bytes[10], 10)?,
            subfield_code_count: parse_count(bytes[11], 11)?,
            data_base_address: parse_digits(&bytes[12..17])?,
            encoding_level: bytes[17] as char,
            cataloging_form: bytes[18] as char,
            multipart_level: bytes[19] as char,
            reserved: String::from_utf8_lossy(&bytes[20..24]).to_string(),
        })
    }

    /// Check the framing counters before they are used for slicing.
    ///
    /// # Errors
    ///
    /// Returns an error if the record length or base address is below 24, or
    /// the base address points past the end of the record.
    pub fn validate_for_reading(&self) -> Result<(), MarcError> {
        if (self.record_length as usize) < LEADER_LEN {
            return Err(MarcError::InvalidLeader(format!(
                "Record length must be at least 24, got {}",
                self.record_length
            )));
        }
        if (self.data_base_address as usize) < LEADER_LEN {
            return Err(MarcError::InvalidLeader(format!(
                "Base address of data must be at least 24, got {}",
                self.data_base_address
            )));
        }
        if self.data_base_address > self.record_length {
            return Err(MarcError::InvalidLeader(format!(
                "Base address {} lies beyond record length {}",
                self.data_base_address, self.record_length
            )));
        }
        Ok(())
    }

    /// Serialize to 24 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry map is not exactly four bytes.
    pub fn as_bytes(&self) -> Result<Vec<u8>, MarcError> {
        let reserved = self.reserved.as_bytes();
        if reserved.len() != 4 {
            return Err(MarcError::InvalidLeader(format!(
                "Reserved field must be 4 characters, got {}",
                reserved.len()
            )));
        }

        let mut bytes = Vec::with_capacity(LEADER_LEN);
        bytes.extend_from_slice(format!("{:05}", self.record_length).as_bytes());
        bytes.push(self.record_status as u8);
        bytes.push(self.record_type as u8);
        bytes.push(self.bibliographic_level as u8);
        bytes.push(self.control_record_type as u8);
        bytes.push(self.character_coding as u8);
        bytes.push(count_digit(self.indicator_count, "Indicator count")?);
        bytes.push(count_digit(self.subfield_code_count, "Subfield code count")?);
        bytes.extend_from_slice(format!("{:05}", self.data_base_address).as_bytes());
        bytes.push(self.encoding_level as u8);
        bytes.push(self.cataloging_form as u8);
        bytes.push(self.multipart_level as u8);
        bytes.extend_from_slice(reserved);
        Ok(bytes)
    }
}

fn parse_count(byte: u8, position: usize) -> Result<u8, MarcError> {
    if byte.is_ascii_digit() {
        Ok(byte - b'0')
    } else {
        Err(MarcError::InvalidLeader(format!(
            "Invalid count at position {position}: {}",
            byte as char
        )))
    }
}

fn count_digit(count: u8, name: &str) -> Result<u8, MarcError> {
    if count <= 9 {
        Ok(b'0' + count)
    } else {
        Err(MarcError::InvalidLeader(format!(
            "{name} must be a single digit, got {count}"
        )))
    }
}

/// Parse a 5-digit ASCII number.
fn parse_digits(bytes: &[u8]) -> Result<u32, MarcError> {
    let mut value = 0u32;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return Err(MarcError::InvalidLeader(format!(
                "Invalid numeric field: '{}'",
                String::from_utf8_lossy(bytes)
            )));
        }
        value = value * 10 + u32::from(byte - b'0');
    }
    Ok(value)
}
