//! Item assembler, traversals and write-back.
//!
//! Items are purely relational: one `item` row, the `mfhd_item` link row
//! carrying the enumeration strings, and optional notes, barcodes and
//! statuses. Every attribute is public and mutable; [`ItemRecord::save`]
//! pushes the whole item through the session's write-back channel.

use rusqlite::Row;
use tracing::{debug, info};

use crate::batchcat::{update_succeeded, ItemSlot, SlotValue};
use crate::bib::BibRecord;
use crate::error::{RecordKind, Result, VgerError};
use crate::holdings::HoldingsRecord;
use crate::price::Price;
use crate::session::Session;
use crate::status::{exactly_one, BARCODE_ACTIVE};

/// How to look up an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    /// By item id.
    Id(i64),
    /// By active barcode.
    Barcode(String),
}

impl From<i64> for ItemKey {
    fn from(id: i64) -> Self {
        ItemKey::Id(id)
    }
}

impl From<&str> for ItemKey {
    fn from(barcode: &str) -> Self {
        ItemKey::Barcode(barcode.to_string())
    }
}

/// An item, existing or not yet created.
#[derive(Debug, Clone)]
pub struct ItemRecord<'s> {
    session: &'s Session,
    /// Item id; `None` until the catalog creates the item.
    pub item_id: Option<i64>,
    /// Owning holdings id.
    pub mfhd_id: i64,
    /// Item type id.
    pub item_type_id: i64,
    /// Permanent location id.
    pub perm_location_id: i64,
    /// Temporary location id.
    pub temp_location_id: Option<i64>,
    /// Temporary item type id.
    pub temp_type_id: Option<i64>,
    /// Copy number.
    pub copy_number: i64,
    /// Number of pieces.
    pub pieces: i64,
    /// Replacement price.
    pub price: Price,
    /// Enumeration, e.g. `v.3`.
    pub enumeration: Option<String>,
    /// Chronology, e.g. `1998`.
    pub chronology: Option<String>,
    /// Caption.
    pub caption: Option<String>,
    /// Free-text enumeration.
    pub free_text: Option<String>,
    /// Spine label.
    pub spine_label: Option<String>,
    /// Year.
    pub year: Option<String>,
    /// First item note. Read-only: notes are not part of the write-back.
    pub note: Option<String>,
}

/// Voyager stores "no value" in optional id columns as 0.
fn nonzero(value: Option<i64>) -> Option<i64> {
    value.filter(|&v| v != 0)
}

impl<'s> ItemRecord<'s> {
    /// A new, unsaved item on a holding.
    #[must_use]
    pub fn new(session: &'s Session, mfhd_id: i64) -> Self {
        ItemRecord {
            session,
            item_id: None,
            mfhd_id,
            item_type_id: 0,
            perm_location_id: 0,
            temp_location_id: None,
            temp_type_id: None,
            copy_number: 0,
            pieces: 1,
            price: Price::default(),
            enumeration: None,
            chronology: None,
            caption: None,
            free_text: None,
            spine_label: None,
            year: None,
            note: None,
        }
    }

    fn from_row(session: &'s Session, item_id: i64, row: &Row<'_>) -> Result<Self> {
        let text = |idx| session.text(row, idx, RecordKind::Item, item_id);
        Ok(ItemRecord {
            session,
            item_id: Some(item_id),
            mfhd_id: row.get(0)?,
            item_type_id: row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
            perm_location_id: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
            temp_location_id: nonzero(row.get(3)?),
            temp_type_id: nonzero(row.get(4)?),
            copy_number: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
            pieces: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
            price: Price::from_cents(row.get::<_, Option<i64>>(7)?.unwrap_or_default()),
            spine_label: text(8)?,
            enumeration: text(9)?,
            chronology: text(10)?,
            year: text(11)?,
            caption: text(12)?,
            free_text: text(13)?,
            note: text(14)?,
        })
    }

    /// The value a write-back slot receives for this item.
    ///
    /// Missing strings become empty strings and missing ids become 0.
    #[must_use]
    pub fn slot_value(&self, slot: ItemSlot) -> SlotValue {
        let text = |value: &Option<String>| SlotValue::Text(value.clone().unwrap_or_default());
        match slot {
            ItemSlot::CaptionNum => text(&self.caption),
            ItemSlot::ChronNum => text(&self.chronology),
            ItemSlot::EnumNum => text(&self.enumeration),
            ItemSlot::FreeText => text(&self.free_text),
            ItemSlot::SpineLabel => text(&self.spine_label),
            ItemSlot::Year => text(&self.year),
            ItemSlot::CopyNumber => SlotValue::Int(self.copy_number),
            ItemSlot::ItemId => SlotValue::Int(self.item_id.unwrap_or(0)),
            ItemSlot::ItemTypeId => SlotValue::Int(self.item_type_id),
            ItemSlot::MfhdId => SlotValue::Int(self.mfhd_id),
            ItemSlot::PermLocationId => SlotValue::Int(self.perm_location_id),
            ItemSlot::Pieces => SlotValue::Int(self.pieces),
            ItemSlot::Price => SlotValue::Int(self.price.cents()),
            ItemSlot::TempLocationId => SlotValue::Int(self.temp_location_id.unwrap_or(0)),
            ItemSlot::TempTypeId => SlotValue::Int(self.temp_type_id.unwrap_or(0)),
        }
    }

    fn key(&self) -> String {
        match self.item_id {
            Some(id) => id.to_string(),
            None => format!("new item on mfhd {}", self.mfhd_id),
        }
    }

    /// The owning holding.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Cardinality`] if more than one holding links the
    /// item, which the store should never allow.
    pub fn get_mfhd(&self) -> Result<HoldingsRecord<'s>> {
        let Some(item_id) = self.item_id else {
            return self.session.get_mfhd(self.mfhd_id);
        };
        let query = self
            .session
            .schema()
            .query("mfhd_item")?
            .select("mfhd_item.mfhd_id")
            .filter_eq("mfhd_item", "item_id", item_id)?;
        let mfhd_id = exactly_one(
            "holdings of item",
            RecordKind::Item,
            &item_id.to_string(),
            self.session.ids(&query)?,
        )?;
        self.session.get_mfhd(mfhd_id)
    }

    /// The bib the item's holding is linked to.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::NotFound`] when no bib is linked and
    /// [`VgerError::Anomaly`] for several under the strict policy.
    pub fn get_bib(&self) -> Result<BibRecord<'s>> {
        let schema = self.session.schema();
        let query = match self.item_id {
            Some(item_id) => schema
                .query("mfhd_item")?
                .distinct()
                .select("bib_mfhd.bib_id")
                .join("mfhd_item", "bib_mfhd")?
                .filter_eq("mfhd_item", "item_id", item_id)?,
            None => schema
                .query("bib_mfhd")?
                .distinct()
                .select("bib_mfhd.bib_id")
                .filter_eq("bib_mfhd", "mfhd_id", self.mfhd_id)?,
        }
        .order_by("bib_mfhd", "bib_id")?;

        let key = self.key();
        let bib_id = self
            .session
            .policy()
            .first("bib of item", &key, self.session.ids(&query)?)?
            .ok_or_else(|| VgerError::NotFound {
                kind: RecordKind::Bib,
                key: format!("of item {key}"),
            })?;
        self.session.get_bib(bib_id)
    }

    /// The item's active barcode.
    ///
    /// # Errors
    ///
    /// Store errors, or [`VgerError::Anomaly`] for several active barcodes
    /// under the strict policy.
    pub fn barcode(&self) -> Result<Option<String>> {
        let Some(item_id) = self.item_id else {
            return Ok(None);
        };
        let query = self
            .session
            .schema()
            .query("item_barcode")?
            .select("item_barcode.item_barcode")
            .filter_eq("item_barcode", "item_id", item_id)?
            .filter_eq("item_barcode", "barcode_status", BARCODE_ACTIVE)?
            .order_by("item_barcode", "item_barcode")?;
        let barcodes = self.session.rows(&query, |row| {
            Ok(self
                .session
                .text(row, 0, RecordKind::Item, item_id)?
                .unwrap_or_default())
        })?;
        self.session
            .policy()
            .first("active barcode of item", &item_id.to_string(), barcodes)
    }

    /// Descriptions of the item's current statuses.
    ///
    /// # Errors
    ///
    /// Store errors only.
    pub fn status(&self) -> Result<Vec<String>> {
        let Some(item_id) = self.item_id else {
            return Ok(Vec::new());
        };
        let query = self
            .session
            .schema()
            .query("item_status")?
            .select("item_status_type.item_status_desc")
            .join("item_status", "item_status_type")?
            .filter_eq("item_status", "item_id", item_id)?
            .order_by("item_status", "item_status")?;
        self.session.rows(&query, |row| {
            Ok(self
                .session
                .text(row, 0, RecordKind::Item, item_id)?
                .unwrap_or_default())
        })
    }

    /// Push every attribute through the write-back channel.
    ///
    /// The cataloging location is resolved before any slot is assigned.
    /// Nothing is rolled back if the channel fails part-way.
    ///
    /// # Errors
    ///
    /// - [`VgerError::WriteBackUnavailable`] without a channel; nothing else
    ///   is touched
    /// - [`VgerError::MissingCatalogingLocation`] /
    ///   [`VgerError::LocationNotFound`] before the channel is called
    /// - [`VgerError::WriteBackFailed`] with the channel's result when it
    ///   reports failure
    pub fn save(&self) -> Result<()> {
        let mut channel = self.session.write_back()?;
        let location = self
            .session
            .config()
            .cataloging_location
            .as_deref()
            .ok_or(VgerError::MissingCatalogingLocation)?;
        let cat_location_id = self.session.get_location_id(location)?;

        for slot in ItemSlot::ALL {
            channel.set_item_field(slot, self.slot_value(slot))?;
        }
        let result = channel.update_item_data(cat_location_id)?;
        if !update_succeeded(&result) {
            return Err(VgerError::WriteBackFailed { result });
        }

        info!(
            item = %self.key(),
            mfhd_id = self.mfhd_id,
            cat_location_id,
            "item saved"
        );
        Ok(())
    }
}

impl Session {
    /// Look up an item by id or active barcode.
    ///
    /// # Errors
    ///
    /// See [`Session::get_item_by_id`] and [`Session::get_item_by_barcode`].
    pub fn get_item(&self, key: impl Into<ItemKey>) -> Result<ItemRecord<'_>> {
        match key.into() {
            ItemKey::Id(id) => self.get_item_by_id(id),
            ItemKey::Barcode(barcode) => self.get_item_by_barcode(&barcode),
        }
    }

    /// Look up an item by id.
    ///
    /// Extra rows (several notes, say) follow the cardinality policy.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::NotFound`] when the item or its holdings link is
    /// missing.
    pub fn get_item_by_id(&self, item_id: i64) -> Result<ItemRecord<'_>> {
        debug!(item_id, "get_item");
        let query = self
            .schema()
            .query("item")?
            .select("mfhd_item.mfhd_id")
            .select("item.item_type_id")
            .select("item.perm_location")
            .select("item.temp_location")
            .select("item.temp_item_type_id")
            .select("item.copy_number")
            .select("item.pieces")
            .select("item.price")
            .select("item.spine_label")
            .select("mfhd_item.item_enum")
            .select("mfhd_item.chron")
            .select("mfhd_item.year")
            .select("mfhd_item.caption")
            .select("mfhd_item.freetext")
            .select("item_note.item_note")
            .join("item", "mfhd_item")?
            .left_join("item", "item_note")?
            .filter_eq("item", "item_id", item_id)?
            .order_by("mfhd_item", "mfhd_id")?;
        let rows = self.rows(&query, |row| ItemRecord::from_row(self, item_id, row))?;
        self.policy()
            .first("item row", &item_id.to_string(), rows)?
            .ok_or_else(|| VgerError::NotFound {
                kind: RecordKind::Item,
                key: item_id.to_string(),
            })
    }

    /// Look up an item by active barcode.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::NotFound`] of kind barcode when no active
    /// barcode matches.
    pub fn get_item_by_barcode(&self, barcode: &str) -> Result<ItemRecord<'_>> {
        debug!(barcode, "get_item");
        let query = self
            .schema()
            .query("item_barcode")?
            .distinct()
            .select("item.item_id")
            .join("item_barcode", "item")?
            .filter_eq("item_barcode", "item_barcode", barcode.to_string())?
            .filter_eq("item_barcode", "barcode_status", BARCODE_ACTIVE)?
            .order_by("item", "item_id")?;
        let item_id = self
            .policy()
            .first("active barcode", barcode, self.ids(&query)?)?
            .ok_or_else(|| VgerError::NotFound {
                kind: RecordKind::Barcode,
                key: barcode.to_string(),
            })?;
        self.get_item_by_id(item_id)
    }
}
