//! Contract of the external write-back channel.
//!
//! The catalog's system of record only accepts item edits through a
//! stateful client: the caller fills named slots describing one "current
//! item" and then invokes an update. The client itself is proprietary, so
//! this crate only defines the seam; a session is given an implementation
//! at construction, or none.

use std::fmt;

use serde_json::Value;

use crate::error::Result;

/// Named slots of the channel's current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemSlot {
    /// Caption string.
    CaptionNum,
    /// Chronology string.
    ChronNum,
    /// Copy number.
    CopyNumber,
    /// Enumeration string.
    EnumNum,
    /// Free-text enumeration.
    FreeText,
    /// Item id (0 for a new item).
    ItemId,
    /// Item type id.
    ItemTypeId,
    /// Owning holdings id.
    MfhdId,
    /// Permanent location id.
    PermLocationId,
    /// Piece count.
    Pieces,
    /// Price in cents.
    Price,
    /// Spine label.
    SpineLabel,
    /// Temporary location id (0 for none).
    TempLocationId,
    /// Temporary item type id (0 for none).
    TempTypeId,
    /// Year.
    Year,
}

impl ItemSlot {
    /// Every slot, in the order they are assigned.
    pub const ALL: [ItemSlot; 15] = [
        ItemSlot::CaptionNum,
        ItemSlot::ChronNum,
        ItemSlot::CopyNumber,
        ItemSlot::EnumNum,
        ItemSlot::FreeText,
        ItemSlot::ItemId,
        ItemSlot::ItemTypeId,
        ItemSlot::MfhdId,
        ItemSlot::PermLocationId,
        ItemSlot::Pieces,
        ItemSlot::Price,
        ItemSlot::SpineLabel,
        ItemSlot::TempLocationId,
        ItemSlot::TempTypeId,
        ItemSlot::Year,
    ];

    /// Slot name as the external client spells it.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ItemSlot::CaptionNum => "CaptionNum",
            ItemSlot::ChronNum => "ChronNum",
            ItemSlot::CopyNumber => "CopyNumber",
            ItemSlot::EnumNum => "EnumNum",
            ItemSlot::FreeText => "FreeText",
            ItemSlot::ItemId => "ItemID",
            ItemSlot::ItemTypeId => "ItemTypeID",
            ItemSlot::MfhdId => "MfhdID",
            ItemSlot::PermLocationId => "PermLocationID",
            ItemSlot::Pieces => "Pieces",
            ItemSlot::Price => "Price",
            ItemSlot::SpineLabel => "SpineLabel",
            ItemSlot::TempLocationId => "TempLocationID",
            ItemSlot::TempTypeId => "TempTypeID",
            ItemSlot::Year => "Year",
        }
    }
}

impl fmt::Display for ItemSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value assigned to a slot. The channel never receives nulls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    /// String slot.
    Text(String),
    /// Integer slot.
    Int(i64),
}

/// A stateful write-back client.
///
/// Implementations are not expected to be thread-safe; a session serializes
/// its own calls.
pub trait WriteBackChannel {
    /// Assign one slot of the current item.
    ///
    /// # Errors
    ///
    /// Implementation-defined transport failures.
    fn set_item_field(&mut self, slot: ItemSlot, value: SlotValue) -> Result<()>;

    /// Commit the current item, attributing the change to a cataloging location.
    ///
    /// Returns the client's result tuple; its first element is the status.
    ///
    /// # Errors
    ///
    /// Implementation-defined transport failures. A reported failure status
    /// is not an `Err` here; callers inspect it with [`update_succeeded`].
    fn update_item_data(&mut self, cat_location_id: i64) -> Result<Vec<Value>>;
}

/// True when the first element of an update result is falsy (0, false,
/// null, empty).
#[must_use]
pub fn update_succeeded(result: &[Value]) -> bool {
    match result.first() {
        None => false,
        Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}
