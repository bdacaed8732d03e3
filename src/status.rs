//! Status-column decoding and the row-cardinality policy.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RecordKind, Result, VgerError};

/// `item_barcode.barcode_status` value of an active barcode.
pub const BARCODE_ACTIVE: i64 = 1;

/// Decode a `suppress_in_opac` column.
///
/// `Y` is suppressed and `N` is visible. Anything else, NULL included, is an
/// error.
///
/// # Errors
///
/// Returns [`VgerError::InvalidSuppression`] carrying the value and record id.
pub fn decode_suppression(value: Option<&str>, kind: RecordKind, id: i64) -> Result<bool> {
    match value {
        Some("Y") => Ok(true),
        Some("N") => Ok(false),
        other => Err(VgerError::InvalidSuppression {
            kind,
            id,
            value: other.map(str::to_string),
        }),
    }
}

/// What to do when an optional relationship returns more rows than expected.
///
/// Applies to active barcodes, item notes and bib links of a holding. It
/// never applies to structural invariants such as an item belonging to more
/// than one holding, which always fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardinalityPolicy {
    /// Log a warning and use the first row.
    #[default]
    Warn,
    /// Fail with [`VgerError::Anomaly`].
    Strict,
}

impl CardinalityPolicy {
    /// Reduce `rows` to its first element according to the policy.
    ///
    /// Returns `Ok(None)` for an empty list.
    ///
    /// # Errors
    ///
    /// Under [`CardinalityPolicy::Strict`], more than one row is an error.
    pub fn first<T>(self, what: &'static str, key: &str, rows: Vec<T>) -> Result<Option<T>> {
        let count = rows.len();
        if count > 1 {
            match self {
                CardinalityPolicy::Warn => {
                    warn!(what, key, rows = count, "unexpected extra rows, using the first");
                },
                CardinalityPolicy::Strict => {
                    return Err(VgerError::Anomaly {
                        what,
                        key: key.to_string(),
                        rows: count,
                    });
                },
            }
        }
        Ok(rows.into_iter().next())
    }
}

/// Require exactly one row for a structural one-to-one relationship.
///
/// # Errors
///
/// Zero rows is [`VgerError::NotFound`]; more than one is
/// [`VgerError::Cardinality`].
pub fn exactly_one<T>(what: &'static str, kind: RecordKind, key: &str, rows: Vec<T>) -> Result<T> {
    let count = rows.len();
    match rows.into_iter().next() {
        None => Err(VgerError::NotFound {
            kind,
            key: key.to_string(),
        }),
        Some(row) if count == 1 => Ok(row),
        Some(_) => Err(VgerError::Cardinality {
            what,
            key: key.to_string(),
            rows: count,
        }),
    }
}
