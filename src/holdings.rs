//! Holdings (MFHD) assembler.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::bib::{assemble, BibRecord, SegmentRow};
use crate::error::{RecordKind, Result, VgerError};
use crate::item::{ItemKey, ItemRecord};
use crate::record::Record;
use crate::schema::SchemaGraph;
use crate::session::Session;
use crate::writer::encode_record;

/// Type of holdings record (leader/06).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldingsType {
    /// x - Single-part item holdings (monographs)
    SinglePartItem,
    /// y - Serial item holdings
    SerialItem,
    /// v - Multipart item holdings (sets and multivolume monographs)
    MultipartItem,
    /// u - Unknown
    Unknown,
}

/// A holdings record with its location.
#[derive(Debug, Clone)]
pub struct HoldingsRecord<'s> {
    session: &'s Session,
    mfhd_id: i64,
    record: Record,
    suppressed: bool,
    location_id: i64,
    location_code: String,
    location_display_name: Option<String>,
    last_modified: Option<OffsetDateTime>,
}

impl<'s> HoldingsRecord<'s> {
    /// Holdings id.
    #[must_use]
    pub fn mfhd_id(&self) -> i64 {
        self.mfhd_id
    }

    /// The decoded MARC holdings record.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Whether the holding is hidden from the public catalog.
    #[must_use]
    pub fn suppressed(&self) -> bool {
        self.suppressed
    }

    /// Id of the holding's location.
    #[must_use]
    pub fn location_id(&self) -> i64 {
        self.location_id
    }

    /// Code of the holding's location.
    #[must_use]
    pub fn location_code(&self) -> &str {
        &self.location_code
    }

    /// Public name of the holding's location.
    #[must_use]
    pub fn location_display_name(&self) -> Option<&str> {
        self.location_display_name.as_deref()
    }

    /// Newest audit timestamp, in UTC.
    #[must_use]
    pub fn last_modified(&self) -> Option<OffsetDateTime> {
        self.last_modified
    }

    /// Control number (001).
    #[must_use]
    pub fn control_number(&self) -> Option<&str> {
        self.record.control_number()
    }

    /// Holdings type from the leader.
    #[must_use]
    pub fn holdings_type(&self) -> HoldingsType {
        match self.record.leader.record_type {
            'x' => HoldingsType::SinglePartItem,
            'y' => HoldingsType::SerialItem,
            'v' => HoldingsType::MultipartItem,
            _ => HoldingsType::Unknown,
        }
    }

    /// Bib id from the `004` control field, if it holds an integer.
    #[must_use]
    pub fn bib_reference(&self) -> Option<i64> {
        self.record
            .get_control_field("004")
            .and_then(|value| value.trim().parse().ok())
    }

    /// Call number from 852 $h and $i.
    #[must_use]
    pub fn call_number(&self) -> Option<String> {
        let field = self.record.get_field("852")?;
        let parts: Vec<&str> = field
            .subfields
            .iter()
            .filter(|sf| matches!(sf.code, 'h' | 'i'))
            .map(|sf| sf.value.trim())
            .filter(|value| !value.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Re-encode the record as ISO 2709.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Decode`] if the record exceeds format limits.
    pub fn to_marc(&self) -> Result<Vec<u8>> {
        encode_record(&self.record)
            .map_err(|e| VgerError::from_marc(RecordKind::Holdings, self.mfhd_id, e))
    }

    /// The bib this holding references through its `004` field.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::MissingBibReference`] when `004` is absent or not
    /// an integer, otherwise whatever [`Session::get_bib`] returns.
    pub fn get_bib(&self) -> Result<BibRecord<'s>> {
        let bib_id = self
            .bib_reference()
            .ok_or(VgerError::MissingBibReference {
                mfhd_id: self.mfhd_id,
            })?;
        self.session.get_bib(bib_id)
    }

    /// Items attached to this holding, by item id.
    ///
    /// # Errors
    ///
    /// Fails on the first item that cannot be assembled.
    pub fn get_items(&self) -> Result<Vec<ItemRecord<'s>>> {
        let query = self
            .session
            .schema()
            .query("mfhd_item")?
            .select("mfhd_item.item_id")
            .filter_eq("mfhd_item", "mfhd_id", self.mfhd_id)?
            .order_by("mfhd_item", "item_id")?;
        self.session
            .ids(&query)?
            .into_iter()
            .map(|item_id| self.session.get_item(ItemKey::Id(item_id)))
            .collect()
    }
}

impl Session {
    /// Fetch and decode one holdings record with its location.
    ///
    /// # Errors
    ///
    /// Same as [`Session::get_bib`]. A holding whose location row is
    /// missing has no rows and is [`VgerError::NotFound`].
    pub fn get_mfhd(&self, mfhd_id: i64) -> Result<HoldingsRecord<'_>> {
        debug!(mfhd_id, "get_mfhd");
        let query = self
            .schema()
            .query("mfhd_master")?
            .distinct()
            .select("mfhd_data.seqnum")
            .select(SchemaGraph::raw("mfhd_data", "record_segment"))
            .select("mfhd_master.suppress_in_opac")
            .select("MAX(mfhd_history.action_date) OVER (PARTITION BY mfhd_master.mfhd_id)")
            .select("location.location_id")
            .select("location.location_code")
            .select("location.location_display_name")
            .join("mfhd_master", "mfhd_data")?
            .join("mfhd_master", "location")?
            .left_join("mfhd_master", "mfhd_history")?
            .filter_eq("mfhd_master", "mfhd_id", mfhd_id)?
            .order_by("mfhd_data", "seqnum")?;

        let mut location = None;
        let rows = self.rows(&query, |row| {
            if location.is_none() {
                location = Some((
                    row.get::<_, i64>(4)?,
                    self.text(row, 5, RecordKind::Holdings, mfhd_id)?
                        .unwrap_or_default(),
                    self.text(row, 6, RecordKind::Holdings, mfhd_id)?,
                ));
            }
            SegmentRow::from_row(self, RecordKind::Holdings, mfhd_id, row)
        })?;
        let assembled = assemble(self, RecordKind::Holdings, mfhd_id, rows)?;
        let (location_id, location_code, location_display_name) =
            location.ok_or_else(|| VgerError::NotFound {
                kind: RecordKind::Holdings,
                key: mfhd_id.to_string(),
            })?;

        Ok(HoldingsRecord {
            session: self,
            mfhd_id,
            record: assembled.record,
            suppressed: assembled.suppressed,
            location_id,
            location_code,
            location_display_name,
            last_modified: assembled.last_modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::leader::Leader;
    use crate::record::Field;
    use rusqlite::Connection;

    fn holding<'s>(session: &'s Session, bib_ref: Option<&str>) -> HoldingsRecord<'s> {
        let mut builder = Record::builder(Leader::holdings()).control_field_str("001", "55");
        if let Some(value) = bib_ref {
            builder = builder.control_field_str("004", value);
        }
        let record = builder
            .field(
                Field::builder("852".to_string(), '0', ' ')
                    .subfield_str('b', "hill")
                    .subfield_str('h', "PS3545.H16")
                    .subfield_str('i', "A6 1990 ")
                    .build(),
            )
            .build();
        HoldingsRecord {
            session,
            mfhd_id: 55,
            record,
            suppressed: false,
            location_id: 1,
            location_code: "hill".to_string(),
            location_display_name: None,
            last_modified: None,
        }
    }

    #[test]
    fn reads_embedded_fields() {
        let session =
            Session::from_connection(Connection::open_in_memory().unwrap(), Config::default())
                .unwrap();
        let mfhd = holding(&session, Some(" 1234 "));
        assert_eq!(mfhd.bib_reference(), Some(1234));
        assert_eq!(mfhd.call_number().as_deref(), Some("PS3545.H16 A6 1990"));
        assert_eq!(mfhd.holdings_type(), HoldingsType::SinglePartItem);
    }

    #[test]
    fn unusable_004_is_missing_reference() {
        let session =
            Session::from_connection(Connection::open_in_memory().unwrap(), Config::default())
                .unwrap();
        for bib_ref in [None, Some("ocm0001")] {
            assert!(matches!(
                holding(&session, bib_ref).get_bib(),
                Err(VgerError::MissingBibReference { mfhd_id: 55 })
            ));
        }
    }
}
