//! Bibliographic assembler.
//!
//! A bib is stored as a `bib_master` row carrying the suppression flag, an
//! ordered run of `bib_data` segments holding the binary record and any
//! number of `bib_history` audit rows. [`Session::get_bib`] reads all three
//! in one statement; the newest audit timestamp comes from a window
//! aggregate so every segment row carries it.

use rusqlite::Row;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{RecordKind, Result, VgerError};
use crate::holdings::HoldingsRecord;
use crate::record::Record;
use crate::schema::SchemaGraph;
use crate::segment::{decode_segments, Segment};
use crate::session::Session;
use crate::status::decode_suppression;
use crate::timestamp::normalize;
use crate::writer::encode_record;

/// One row of a segment query: a fragment plus the per-record columns
/// repeated on every row.
#[derive(Debug, Clone)]
pub(crate) struct SegmentRow {
    pub(crate) seqnum: i64,
    pub(crate) data: Vec<u8>,
    pub(crate) suppress: Option<String>,
    pub(crate) action_date: Option<String>,
}

impl SegmentRow {
    /// Read the first four columns of a segment query.
    pub(crate) fn from_row(
        session: &Session,
        kind: RecordKind,
        id: i64,
        row: &Row<'_>,
    ) -> Result<Self> {
        Ok(SegmentRow {
            seqnum: row.get(0)?,
            data: row.get::<_, Option<Vec<u8>>>(1)?.unwrap_or_default(),
            suppress: session.text(row, 2, kind, id)?,
            action_date: session.text(row, 3, kind, id)?,
        })
    }
}

/// A decoded record with its provenance columns.
#[derive(Debug, Clone)]
pub(crate) struct Assembled {
    pub(crate) record: Record,
    pub(crate) suppressed: bool,
    pub(crate) last_modified: Option<OffsetDateTime>,
}

/// Decode the segments, then the suppression flag, then the audit timestamp.
pub(crate) fn assemble(
    session: &Session,
    kind: RecordKind,
    id: i64,
    rows: Vec<SegmentRow>,
) -> Result<Assembled> {
    let (suppress, action_date) = match rows.first() {
        Some(row) => (row.suppress.clone(), row.action_date.clone()),
        None => (None, None),
    };
    let segments = rows
        .into_iter()
        .map(|row| Segment::new(row.seqnum, row.data))
        .collect();

    let record = decode_segments(kind, id, segments, session.encoding())?;
    let suppressed = decode_suppression(suppress.as_deref(), kind, id)?;
    let last_modified = action_date
        .map(|value| normalize(&value, session.utc_offset(), kind, id))
        .transpose()?;

    Ok(Assembled {
        record,
        suppressed,
        last_modified,
    })
}

/// A bibliographic record.
#[derive(Debug, Clone)]
pub struct BibRecord<'s> {
    session: &'s Session,
    bib_id: i64,
    record: Record,
    suppressed: bool,
    last_modified: Option<OffsetDateTime>,
}

impl<'s> BibRecord<'s> {
    /// Bib id.
    #[must_use]
    pub fn bib_id(&self) -> i64 {
        self.bib_id
    }

    /// The decoded MARC record.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Whether the bib is hidden from the public catalog.
    #[must_use]
    pub fn suppressed(&self) -> bool {
        self.suppressed
    }

    /// Newest audit timestamp, in UTC; `None` without history rows.
    #[must_use]
    pub fn last_modified(&self) -> Option<OffsetDateTime> {
        self.last_modified
    }

    /// Title proper (245 $a).
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.record.title()
    }

    /// Control number (001).
    #[must_use]
    pub fn control_number(&self) -> Option<&str> {
        self.record.control_number()
    }

    /// Re-encode the record as ISO 2709.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Decode`] if the record exceeds format limits.
    pub fn to_marc(&self) -> Result<Vec<u8>> {
        encode_record(&self.record).map_err(|e| VgerError::from_marc(RecordKind::Bib, self.bib_id, e))
    }

    /// Holdings attached to this bib, by mfhd id.
    ///
    /// Re-queries on every call.
    ///
    /// # Errors
    ///
    /// Fails on the first holding that cannot be assembled.
    pub fn holdings(&self) -> Result<Vec<HoldingsRecord<'s>>> {
        let query = self
            .session
            .schema()
            .query("bib_mfhd")?
            .select("bib_mfhd.mfhd_id")
            .filter_eq("bib_mfhd", "bib_id", self.bib_id)?
            .order_by("bib_mfhd", "mfhd_id")?;
        self.session
            .ids(&query)?
            .into_iter()
            .map(|mfhd_id| self.session.get_mfhd(mfhd_id))
            .collect()
    }
}

impl Session {
    /// Fetch and decode one bibliographic record.
    ///
    /// # Errors
    ///
    /// - [`VgerError::NotFound`] when the bib has no segments
    /// - [`VgerError::Decode`] / [`VgerError::TextDecode`] for unreadable records
    /// - [`VgerError::InvalidSuppression`] unless the flag is `Y` or `N`
    /// - [`VgerError::InvalidTimestamp`] for unparseable audit rows
    pub fn get_bib(&self, bib_id: i64) -> Result<BibRecord<'_>> {
        debug!(bib_id, "get_bib");
        let query = self
            .schema()
            .query("bib_master")?
            .distinct()
            .select("bib_data.seqnum")
            .select(SchemaGraph::raw("bib_data", "record_segment"))
            .select("bib_master.suppress_in_opac")
            .select("MAX(bib_history.action_date) OVER (PARTITION BY bib_master.bib_id)")
            .join("bib_master", "bib_data")?
            .left_join("bib_master", "bib_history")?
            .filter_eq("bib_master", "bib_id", bib_id)?
            .order_by("bib_data", "seqnum")?;
        let rows = self.rows(&query, |row| {
            SegmentRow::from_row(self, RecordKind::Bib, bib_id, row)
        })?;
        let assembled = assemble(self, RecordKind::Bib, bib_id, rows)?;

        Ok(BibRecord {
            session: self,
            bib_id,
            record: assembled.record,
            suppressed: assembled.suppressed,
            last_modified: assembled.last_modified,
        })
    }
}
