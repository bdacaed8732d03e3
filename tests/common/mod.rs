//! Common test helpers: an in-memory catalog builder and a scripted
//! write-back channel.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rusqlite::{params, Connection};
use serde_json::{json, Value};
use vger::{
    encode_record, Config, Field, ItemSlot, Leader, Record, Session, SlotValue, WriteBackChannel,
};

/// Bytes per stored segment in fixtures.
pub const SEGMENT_SIZE: usize = 40;

/// Name of the cataloging location in the standard fixture.
pub const CATALOGING_LOCATION: &str = "Hillman Cataloging";

const DDL: &str = "
    CREATE TABLE location (location_id INTEGER PRIMARY KEY, location_code TEXT,
                           location_name TEXT, location_display_name TEXT, library_id INTEGER);
    CREATE TABLE bib_master (bib_id INTEGER PRIMARY KEY, suppress_in_opac TEXT);
    CREATE TABLE bib_data (bib_id INTEGER, seqnum INTEGER, record_segment BLOB);
    CREATE TABLE bib_history (bib_id INTEGER, action_date TEXT);
    CREATE TABLE bib_location (bib_id INTEGER, location_id INTEGER);
    CREATE TABLE bib_text (bib_id INTEGER, title TEXT);
    CREATE TABLE bib_index (bib_id INTEGER, index_code TEXT, normal_heading TEXT);
    CREATE TABLE bib_mfhd (bib_id INTEGER, mfhd_id INTEGER);
    CREATE TABLE mfhd_master (mfhd_id INTEGER PRIMARY KEY, suppress_in_opac TEXT,
                              location_id INTEGER);
    CREATE TABLE mfhd_data (mfhd_id INTEGER, seqnum INTEGER, record_segment BLOB);
    CREATE TABLE mfhd_history (mfhd_id INTEGER, action_date TEXT);
    CREATE TABLE mfhd_item (mfhd_id INTEGER, item_id INTEGER, item_enum TEXT, chron TEXT,
                            year TEXT, caption TEXT, freetext TEXT);
    CREATE TABLE item (item_id INTEGER PRIMARY KEY, perm_location INTEGER,
                       temp_location INTEGER, item_type_id INTEGER, temp_item_type_id INTEGER,
                       copy_number INTEGER, pieces INTEGER, price INTEGER, spine_label TEXT);
    CREATE TABLE item_barcode (item_id INTEGER, item_barcode TEXT, barcode_status INTEGER);
    CREATE TABLE item_note (item_id INTEGER, item_note TEXT);
    CREATE TABLE item_status (item_id INTEGER, item_status INTEGER);
    CREATE TABLE item_status_type (item_status_type INTEGER PRIMARY KEY, item_status_desc TEXT);
";

/// A bibliographic record with a control number and a title.
pub fn bib_record(bib_id: i64, title: &str) -> Record {
    Record::builder(Leader::bibliographic())
        .control_field_str("001", &bib_id.to_string())
        .field(
            Field::builder("245".to_string(), '1', '0')
                .subfield_str('a', title)
                .build(),
        )
        .build()
}

/// A holdings record pointing at `bib_id` through 004.
pub fn mfhd_record(mfhd_id: i64, bib_id: Option<i64>, location_code: &str) -> Record {
    let mut builder =
        Record::builder(Leader::holdings()).control_field_str("001", &mfhd_id.to_string());
    if let Some(bib_id) = bib_id {
        builder = builder.control_field_str("004", &bib_id.to_string());
    }
    builder
        .field(
            Field::builder("852".to_string(), '0', ' ')
                .subfield_str('b', location_code)
                .subfield_str('h', "PS3545")
                .subfield_str('i', ".H16 1990")
                .build(),
        )
        .build()
}

/// An encoded bib whose title holds a single Latin-1 `é`.
pub fn latin1_bib(bib_id: i64) -> Vec<u8> {
    let mut bytes = encode_record(&bib_record(bib_id, "Cafx society")).expect("encode");
    let pos = bytes
        .windows(4)
        .position(|w| w == b"Cafx")
        .expect("title bytes");
    bytes[pos + 3] = 0xE9;
    bytes
}

/// Split bytes into `(seqnum, chunk)` pairs numbered from 1.
pub fn split(bytes: &[u8], size: usize) -> Vec<(i64, Vec<u8>)> {
    bytes
        .chunks(size)
        .zip(1_i64..)
        .map(|(chunk, seqnum)| (seqnum, chunk.to_vec()))
        .collect()
}

/// Encode a record and split it into reversed segments.
pub fn segments(record: &Record) -> Vec<(i64, Vec<u8>)> {
    let bytes = encode_record(record).expect("fixture record encodes");
    let mut segments = split(&bytes, SEGMENT_SIZE);
    segments.reverse();
    segments
}

/// Builder for a catalog database.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Empty catalog in memory.
    pub fn new() -> Self {
        Self::with_connection(Connection::open_in_memory().expect("open in-memory db"))
    }

    /// Empty catalog in a database file.
    pub fn at(path: &Path) -> Self {
        Self::with_connection(Connection::open(path).expect("open db file"))
    }

    fn with_connection(conn: Connection) -> Self {
        conn.execute_batch(DDL).expect("create catalog tables");
        Catalog { conn }
    }

    /// Run raw SQL against the fixture.
    pub fn execute(&self, sql: &str) -> &Self {
        self.conn.execute_batch(sql).expect("fixture sql");
        self
    }

    pub fn location(&self, id: i64, code: &str, name: &str, display: Option<&str>, library_id: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO location VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, code, name, display, library_id],
            )
            .expect("insert location");
        self
    }

    /// A bib master row with no segments.
    pub fn bib_master(&self, bib_id: i64, suppress: Option<&str>, location_id: i64) -> &Self {
        self.conn
            .execute("INSERT INTO bib_master VALUES (?1, ?2)", params![bib_id, suppress])
            .expect("insert bib_master");
        self.conn
            .execute("INSERT INTO bib_location VALUES (?1, ?2)", params![bib_id, location_id])
            .expect("insert bib_location");
        self
    }

    /// Segments of a bib, inserted in the order given.
    pub fn bib_segments(&self, bib_id: i64, segments: &[(i64, Vec<u8>)]) -> &Self {
        for (seqnum, data) in segments {
            self.conn
                .execute(
                    "INSERT INTO bib_data VALUES (?1, ?2, ?3)",
                    params![bib_id, seqnum, data],
                )
                .expect("insert bib_data");
        }
        self
    }

    /// A complete bib: master row, location link and segments.
    pub fn bib(&self, bib_id: i64, record: &Record, suppress: &str, location_id: i64) -> &Self {
        self.bib_master(bib_id, Some(suppress), location_id)
            .bib_segments(bib_id, &segments(record))
    }

    pub fn bib_history(&self, bib_id: i64, action_date: &str) -> &Self {
        self.conn
            .execute("INSERT INTO bib_history VALUES (?1, ?2)", params![bib_id, action_date])
            .expect("insert bib_history");
        self
    }

    /// Link a bib to a holding.
    pub fn bib_mfhd(&self, bib_id: i64, mfhd_id: i64) -> &Self {
        self.conn
            .execute("INSERT INTO bib_mfhd VALUES (?1, ?2)", params![bib_id, mfhd_id])
            .expect("insert bib_mfhd");
        self
    }

    /// A complete holding linked to `bib_id`.
    pub fn mfhd(&self, mfhd_id: i64, bib_id: i64, record: &Record, suppress: &str, location_id: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO mfhd_master VALUES (?1, ?2, ?3)",
                params![mfhd_id, suppress, location_id],
            )
            .expect("insert mfhd_master");
        for (seqnum, data) in segments(record) {
            self.conn
                .execute(
                    "INSERT INTO mfhd_data VALUES (?1, ?2, ?3)",
                    params![mfhd_id, seqnum, data],
                )
                .expect("insert mfhd_data");
        }
        self.bib_mfhd(bib_id, mfhd_id)
    }

    pub fn mfhd_history(&self, mfhd_id: i64, action_date: &str) -> &Self {
        self.conn
            .execute("INSERT INTO mfhd_history VALUES (?1, ?2)", params![mfhd_id, action_date])
            .expect("insert mfhd_history");
        self
    }

    /// An item on a holding.
    pub fn item(&self, item_id: i64, mfhd_id: i64, enumeration: Option<&str>, price_cents: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO item VALUES (?1, 1, 0, 3, 0, 1, 1, ?2, NULL)",
                params![item_id, price_cents],
            )
            .expect("insert item");
        self.mfhd_item(mfhd_id, item_id, enumeration)
    }

    /// Link an item to a holding.
    pub fn mfhd_item(&self, mfhd_id: i64, item_id: i64, enumeration: Option<&str>) -> &Self {
        self.conn
            .execute(
                "INSERT INTO mfhd_item VALUES (?1, ?2, ?3, NULL, NULL, NULL, NULL)",
                params![mfhd_id, item_id, enumeration],
            )
            .expect("insert mfhd_item");
        self
    }

    pub fn barcode(&self, item_id: i64, barcode: &str, status: i64) -> &Self {
        self.conn
            .execute(
                "INSERT INTO item_barcode VALUES (?1, ?2, ?3)",
                params![item_id, barcode, status],
            )
            .expect("insert item_barcode");
        self
    }

    pub fn note(&self, item_id: i64, note: &str) -> &Self {
        self.conn
            .execute("INSERT INTO item_note VALUES (?1, ?2)", params![item_id, note])
            .expect("insert item_note");
        self
    }

    pub fn status(&self, item_id: i64, status: i64, description: &str) -> &Self {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO item_status_type VALUES (?1, ?2)",
                params![status, description],
            )
            .expect("insert item_status_type");
        self.conn
            .execute("INSERT INTO item_status VALUES (?1, ?2)", params![item_id, status])
            .expect("insert item_status");
        self
    }

    /// Open a session over this catalog.
    pub fn session(self, config: Config) -> Session {
        Session::from_connection(self.conn, config).expect("session over fixture")
    }
}

/// The standard fixture.
///
/// Libraries 10 (locations 1, 2) and 20 (location 3).
///
/// | bib | title | suppressed | location | holdings |
/// |-----|-------|------------|----------|----------|
/// | 100 | Moby Dick | N | 1 | 200 (loc 1), 201 (loc 2) |
/// | 101 | Hidden history | Y | 1 | |
/// | 102 | Darlington papers | N | 3 | 202 (loc 3, suppressed) |
///
/// Items: 300 and 301 on 200, 302 on 201, 303 on 202.
pub fn standard() -> Catalog {
    let catalog = Catalog::new();
    populate(&catalog);
    catalog
}

/// Fill a catalog with the standard fixture.
pub fn populate(catalog: &Catalog) {
    catalog
        .location(1, "hill", CATALOGING_LOCATION, Some("Hillman Library"), 10)
        .location(2, "hillr", "Hillman Reserve", None, 10)
        .location(3, "dar", "Darlington", Some("Darlington Room"), 20);

    catalog
        .bib(100, &bib_record(100, "Moby Dick"), "N", 1)
        .bib_history(100, "2019-01-01 10:00:00")
        .bib_history(100, "2020-06-15 12:30:00")
        .bib(101, &bib_record(101, "Hidden history"), "Y", 1)
        .bib(102, &bib_record(102, "Darlington papers"), "N", 3);

    catalog
        .mfhd(200, 100, &mfhd_record(200, Some(100), "hill"), "N", 1)
        .mfhd_history(200, "2021-02-03 04:05:06")
        .mfhd(201, 100, &mfhd_record(201, Some(100), "hillr"), "N", 2)
        .mfhd(202, 102, &mfhd_record(202, Some(102), "dar"), "Y", 3);

    catalog
        .item(300, 200, Some("v.1"), 12345)
        .barcode(300, "36000000000300", 1)
        .note(300, "Brittle pages")
        .status(300, 1, "Not Charged")
        .item(301, 200, Some("v.2"), 0)
        .barcode(301, "OLD301", 2)
        .barcode(301, "36000000000301", 1)
        .item(302, 201, None, 500)
        .item(303, 202, None, 0);
}

/// Config naming the standard cataloging location.
pub fn config() -> Config {
    Config {
        cataloging_location: Some(CATALOGING_LOCATION.to_string()),
        library_id: Some(10),
        ..Config::default()
    }
}

/// Everything a [`RecordingChannel`] was asked to do.
#[derive(Debug, Default)]
pub struct ChannelLog {
    pub slots: Vec<(ItemSlot, SlotValue)>,
    pub updates: Vec<i64>,
}

/// Write-back channel that records calls and returns a scripted result.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    pub log: Rc<RefCell<ChannelLog>>,
    result: Vec<Value>,
}

impl RecordingChannel {
    /// Channel reporting success.
    pub fn ok() -> Self {
        Self::returning(vec![json!(0)])
    }

    /// Channel returning `result` from every update.
    pub fn returning(result: Vec<Value>) -> Self {
        RecordingChannel {
            log: Rc::default(),
            result,
        }
    }

    /// Value last assigned to `slot`.
    pub fn slot(&self, slot: ItemSlot) -> Option<SlotValue> {
        self.log
            .borrow()
            .slots
            .iter()
            .rev()
            .find(|(s, _)| *s == slot)
            .map(|(_, value)| value.clone())
    }
}

impl WriteBackChannel for RecordingChannel {
    fn set_item_field(&mut self, slot: ItemSlot, value: SlotValue) -> vger::Result<()> {
        self.log.borrow_mut().slots.push((slot, value));
        Ok(())
    }

    fn update_item_data(&mut self, cat_location_id: i64) -> vger::Result<Vec<Value>> {
        self.log.borrow_mut().updates.push(cat_location_id);
        Ok(self.result.clone())
    }
}
