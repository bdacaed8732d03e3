#![warn(missing_docs)]

//! # vger: Voyager catalog access
//!
//! Reads bibliographic, holdings and item data out of a Voyager-style
//! relational catalog and pushes item edits back through an external
//! write-back client.
//!
//! Bibs and holdings are stored as MARC 21 records split across ordered
//! binary segments; they are reassembled, decoded with a strict ISO 2709
//! reader and returned together with their suppression flag and the newest
//! audit timestamp. Items are purely relational. Every entity borrows the
//! [`Session`] it came from and navigates to its neighbours on demand.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vger::{Config, Scope, Session};
//!
//! # fn main() -> vger::Result<()> {
//! let session = Session::open(Config::from_file("vger.json")?.with_env_overrides()?)?;
//!
//! let bib = session.get_bib(1_234_567)?;
//! println!("{:?} suppressed={}", bib.title(), bib.suppressed());
//!
//! for mfhd in bib.holdings()? {
//!     for item in mfhd.get_items()? {
//!         println!("{} {:?} {}", mfhd.location_code(), item.enumeration, item.price);
//!     }
//! }
//!
//! let mut bibs = session.iter_bibs(&Scope::library(1), false)?;
//! for bib in bibs.by_ref() {
//!     println!("{}", bib?.bib_id());
//! }
//! println!("{} skipped", bibs.skipped().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`session`]: Connection, schema graph and write-back capability
//! - [`schema`]: Declared tables and foreign-key edges; every join comes from here
//! - [`segment`]: Segment reassembly and decoding
//! - [`bib`], [`holdings`], [`item`]: Entity assemblers and traversals
//! - [`iter`]: Lazy scoped iteration
//! - [`batchcat`]: Write-back channel contract
//! - [`record`], [`reader`], [`writer`], [`leader`]: ISO 2709 codec
//! - [`error`]: Error types and result type

pub mod batchcat;
pub mod bib;
pub mod config;
pub mod enumeration;
pub mod error;
pub mod holdings;
pub mod item;
pub mod iter;
pub mod leader;
pub mod location;
pub mod price;
pub mod reader;
/// Core MARC record structures (`Record`, `Field`, `Subfield`)
pub mod record;
pub mod schema;
pub mod scope;
pub mod segment;
pub mod session;
pub mod status;
pub mod timestamp;
pub mod writer;

pub use batchcat::{update_succeeded, ItemSlot, SlotValue, WriteBackChannel};
pub use bib::BibRecord;
pub use config::{Config, WriteBackConfig};
pub use enumeration::{parse_enum, EnumerationRange};
pub use error::{MarcError, RecordKind, Result, VgerError};
pub use holdings::{HoldingsRecord, HoldingsType};
pub use item::{ItemKey, ItemRecord};
pub use iter::{ScopedIter, Skipped};
pub use leader::Leader;
pub use location::Location;
pub use price::Price;
pub use reader::{decode_first, MarcReader};
pub use record::{Field, FieldBuilder, Record, RecordBuilder, Subfield};
pub use schema::{ForeignKey, Query, SchemaGraph};
pub use scope::Scope;
pub use segment::{decode_segments, reassemble, Segment};
pub use session::Session;
pub use status::{decode_suppression, exactly_one, CardinalityPolicy};
pub use writer::{encode_record, MarcWriter};
