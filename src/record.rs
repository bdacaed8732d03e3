//! Decoded MARC record structures.
//!
//! - [`Record`]: a decoded bibliographic or holdings record
//! - [`Field`]: a variable data field (010+)
//! - [`Subfield`]: a coded data element within a field
//!
//! # Examples
//!
//! ```
//! use vger::{Field, Leader, Record};
//!
//! let record = Record::builder(Leader::bibliographic())
//!     .control_field_str("001", "12345")
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Title")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(record.title(), Some("Title"));
//! ```

use crate::leader::Leader;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A decoded MARC record.
///
/// Fields are grouped by tag in an `IndexMap`. Tags keep the order they were
/// first seen in and repeated fields keep their relative order, so a record
/// that is decoded and re-encoded loses no fields but emits each tag's fields
/// together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record leader
    pub leader: Leader,
    /// Control fields (001-009), tag -> values
    pub control_fields: IndexMap<String, Vec<String>>,
    /// Data fields (010+), tag -> fields
    pub fields: IndexMap<String, Vec<Field>>,
}

/// A data field (tags 010 and higher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field tag (3 characters)
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
    /// Subfields; most fields carry four or fewer
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    /// Subfield code
    pub code: char,
    /// Subfield value
    pub value: String,
}

impl Record {
    /// Create an empty record with the given leader.
    #[must_use]
    pub fn new(leader: Leader) -> Self {
        Record {
            leader,
            control_fields: IndexMap::new(),
            fields: IndexMap::new(),
        }
    }

    /// Start a [`RecordBuilder`].
    #[must_use]
    pub fn builder(leader: Leader) -> RecordBuilder {
        RecordBuilder {
            record: Record::new(leader),
        }
    }

    /// Append a control field. Repeatable tags such as 006 and 007 keep
    /// every value.
    pub fn add_control_field(&mut self, tag: String, value: String) {
        self.control_fields.entry(tag).or_default().push(value);
    }

    /// First value of a control field.
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .get(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a control field.
    #[must_use]
    pub fn get_control_fields(&self, tag: &str) -> Option<&[String]> {
        self.control_fields.get(tag).map(Vec::as_slice)
    }

    /// Append a data field.
    pub fn add_field(&mut self, field: Field) {
        self.fields.entry(field.tag.clone()).or_default().push(field);
    }

    /// All data fields with the given tag.
    #[must_use]
    pub fn get_fields(&self, tag: &str) -> Option<&[Field]> {
        self.fields.get(tag).map(Vec::as_slice)
    }

    /// First data field with the given tag.
    #[must_use]
    pub fn get_field(&self, tag: &str) -> Option<&Field> {
        self.fields.get(tag).and_then(|fields| fields.first())
    }

    /// Iterate over all data fields, grouped by tag.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values().flatten()
    }

    /// Title proper (245 $a).
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get_field("245").and_then(|f| f.get_subfield('a'))
    }

    /// Control number (001).
    #[must_use]
    pub fn control_number(&self) -> Option<&str> {
        self.get_control_field("001")
    }
}

/// Fluent builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field.
    #[must_use]
    pub fn control_field_str(mut self, tag: &str, value: &str) -> Self {
        self.record
            .add_control_field(tag.to_string(), value.to_string());
        self
    }

    /// Add a data field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.record.add_field(field);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

impl Field {
    /// Create a data field without subfields.
    #[must_use]
    pub fn new(tag: String, indicator1: char, indicator2: char) -> Self {
        Field {
            tag,
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Start a [`FieldBuilder`].
    #[must_use]
    pub fn builder(tag: String, indicator1: char, indicator2: char) -> FieldBuilder {
        FieldBuilder {
            field: Field::new(tag, indicator1, indicator2),
        }
    }

    /// Append a subfield.
    pub fn add_subfield(&mut self, code: char, value: String) {
        self.subfields.push(Subfield { code, value });
    }

    /// First value for a subfield code.
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Iterate over values with a specific code.
    pub fn subfields_by_code(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }
}

/// Fluent builder for [`Field`].
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Add a subfield.
    #[must_use]
    pub fn subfield_str(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield(code, value.to_string());
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Field {
        self.field
    }
}
