//! Audit-history timestamps.
//!
//! The history tables store local wall-clock times without an offset. They
//! are interpreted in the catalog's configured offset and normalized to UTC.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{RecordKind, Result, VgerError};

/// Normalize a stored `action_date` to UTC.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` (interpreted in `catalog_offset`) or an
/// RFC 3339 timestamp carrying its own offset.
///
/// # Errors
///
/// Returns [`VgerError::InvalidTimestamp`] when neither form parses.
pub fn normalize(
    value: &str,
    catalog_offset: UtcOffset,
    kind: RecordKind,
    id: i64,
) -> Result<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(ts.to_offset(UtcOffset::UTC));
    }
    PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .map(|naive| naive.assume_offset(catalog_offset).to_offset(UtcOffset::UTC))
    .map_err(|_| VgerError::InvalidTimestamp {
        kind,
        id,
        value: value.to_string(),
    })
}

/// Parse a `+HH:MM` / `-HH:MM` offset.
///
/// # Errors
///
/// Returns [`VgerError::Config`] for malformed offsets.
pub fn parse_offset(value: &str) -> Result<UtcOffset> {
    UtcOffset::parse(
        value,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|e| VgerError::Config(format!("invalid UTC offset {value:?}: {e}")))
}
