//! Error types for catalog access.
//!
//! Two layers live here: [`MarcError`] is raised by the binary record codec
//! (leader, reader, writer) and knows nothing about the catalog, while
//! [`VgerError`] is what every session, assembler and traversal operation
//! returns. Codec failures cross into the catalog layer at the segment
//! boundary, where they pick up the identifier of the record being decoded.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Error raised by the ISO 2709 codec.
#[derive(Error, Debug)]
pub enum MarcError {
    /// Error indicating an invalid or malformed MARC record.
    #[error("Invalid MARC record: {0}")]
    InvalidRecord(String),

    /// Error indicating an invalid leader (24-byte header).
    #[error("Invalid leader: {0}")]
    InvalidLeader(String),

    /// Error indicating an invalid field structure.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Field data could not be decoded in the expected text encoding.
    #[error("Encoding error: bytes are not valid {encoding} in field {tag}")]
    EncodingError {
        /// Tag of the field holding the offending bytes.
        tag: String,
        /// Name of the encoding the bytes were expected to be in.
        encoding: &'static str,
    },

    /// Error indicating a truncated or incomplete record.
    #[error("Truncated record: {0}")]
    TruncatedRecord(String),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Kind of catalog entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Bibliographic record.
    Bib,
    /// Holdings (MFHD) record.
    Holdings,
    /// Item record.
    Item,
    /// Item barcode.
    Barcode,
    /// Location row.
    Location,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Bib => "bib",
            RecordKind::Holdings => "mfhd",
            RecordKind::Item => "item",
            RecordKind::Barcode => "barcode",
            RecordKind::Location => "location",
        };
        f.write_str(name)
    }
}

/// Error type for all catalog operations.
#[derive(Error, Debug)]
pub enum VgerError {
    /// Zero rows where exactly one entity was expected.
    #[error("{kind} {key} not found")]
    NotFound {
        /// Entity kind that was looked up.
        kind: RecordKind,
        /// Identifier or barcode used for the lookup.
        key: String,
    },

    /// The reassembled binary record is malformed.
    #[error("could not decode {kind} {id}: {source}")]
    Decode {
        /// Entity kind being decoded.
        kind: RecordKind,
        /// Identifier of the record.
        id: i64,
        /// Underlying codec failure.
        #[source]
        source: MarcError,
    },

    /// The record holds bytes that are not valid in the expected text encoding.
    #[error("{kind} {id} is not valid {encoding} (field {tag})")]
    TextDecode {
        /// Entity kind being decoded.
        kind: RecordKind,
        /// Identifier of the record.
        id: i64,
        /// MARC field tag, or column name for relational text.
        tag: String,
        /// Expected encoding.
        encoding: &'static str,
    },

    /// A suppression column held something other than `Y` or `N`.
    #[error("bad suppression value {value:?} for {kind} {id}")]
    InvalidSuppression {
        /// Entity kind.
        kind: RecordKind,
        /// Identifier of the record.
        id: i64,
        /// Offending column value; `None` for SQL NULL.
        value: Option<String>,
    },

    /// An audit timestamp could not be parsed.
    #[error("bad audit timestamp {value:?} for {kind} {id}")]
    InvalidTimestamp {
        /// Entity kind.
        kind: RecordKind,
        /// Identifier of the record.
        id: i64,
        /// Offending column value.
        value: String,
    },

    /// A structural one-to-one invariant of the store is broken.
    #[error("{what} for {key} matched {rows} rows; the store is inconsistent")]
    Cardinality {
        /// Relationship that was violated.
        what: &'static str,
        /// Key being resolved.
        key: String,
        /// Number of rows found.
        rows: usize,
    },

    /// Extra rows for an optional relationship, raised only under the strict policy.
    #[error("{what} for {key} matched {rows} rows")]
    Anomaly {
        /// Relationship with extra rows.
        what: &'static str,
        /// Key being resolved.
        key: String,
        /// Number of rows found.
        rows: usize,
    },

    /// A holdings record lacks a usable `004` bib cross-reference.
    #[error("mfhd {mfhd_id} has no usable 004 bib reference")]
    MissingBibReference {
        /// Identifier of the holdings record.
        mfhd_id: i64,
    },

    /// An iteration scope named no locations.
    #[error("location scope must name at least one location")]
    EmptyScope,

    /// A location name did not resolve to an id.
    #[error("location {name:?} not found")]
    LocationNotFound {
        /// Location name that was looked up.
        name: String,
    },

    /// No write-back channel was configured on the session.
    #[error("write-back channel is not available")]
    WriteBackUnavailable,

    /// No cataloging location is configured, so item saves cannot proceed.
    #[error("no cataloging location configured")]
    MissingCatalogingLocation,

    /// The external update call reported failure.
    #[error("write-back update failed: {result:?}")]
    WriteBackFailed {
        /// Result tuple returned by the external call, verbatim.
        result: Vec<Value>,
    },

    /// Two tables have no declared foreign-key edge.
    #[error("no declared join between {from} and {to}")]
    UndeclaredJoin {
        /// Left-hand table.
        from: String,
        /// Right-hand table.
        to: String,
    },

    /// A table is not part of the schema graph.
    #[error("table {0} is not declared in the schema graph")]
    UnknownTable(String),

    /// A price string is not a two-decimal amount.
    #[error("invalid price {0:?}")]
    InvalidPrice(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error from the relational store.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VgerError {
    /// Attach catalog context to a codec failure.
    pub(crate) fn from_marc(kind: RecordKind, id: i64, err: MarcError) -> Self {
        match err {
            MarcError::EncodingError { tag, encoding } => VgerError::TextDecode {
                kind,
                id,
                tag,
                encoding,
            },
            source => VgerError::Decode { kind, id, source },
        }
    }

    /// True when the error is a text-encoding failure.
    #[must_use]
    pub fn is_text_decode(&self) -> bool {
        matches!(self, VgerError::TextDecode { .. })
    }

    /// True for failures confined to a single record's stored data, as
    /// opposed to store, configuration or caller errors.
    #[must_use]
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            VgerError::NotFound { .. }
                | VgerError::Decode { .. }
                | VgerError::TextDecode { .. }
                | VgerError::InvalidSuppression { .. }
                | VgerError::InvalidTimestamp { .. }
        )
    }
}

/// Convenience type alias for [`std::result::Result`] with [`VgerError`].
pub type Result<T> = std::result::Result<T, VgerError>;
