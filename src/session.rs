//! Catalog session.
//!
//! A [`Session`] exclusively owns one store connection, the schema graph and
//! the configuration. Entities returned by lookups borrow the session for
//! lazy traversal and never outlive it. A session is used from one thread at
//! a time; the write-back channel sits in a `RefCell`, which keeps `Session`
//! from being `Sync`.
//!
//! ```
//! use vger::{Config, Session};
//!
//! let conn = rusqlite::Connection::open_in_memory()?;
//! let session = Session::from_connection(conn, Config::default())?;
//! assert!(!session.has_write_back());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::cell::{RefCell, RefMut};
use std::fmt;

use encoding_rs::Encoding;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, Row, Statement};
use time::UtcOffset;
use tracing::debug;

use crate::batchcat::WriteBackChannel;
use crate::config::Config;
use crate::error::{RecordKind, Result, VgerError};
use crate::schema::{Query, SchemaGraph};
use crate::status::CardinalityPolicy;

/// An open connection to the catalog.
pub struct Session {
    conn: Connection,
    schema: SchemaGraph,
    config: Config,
    encoding: &'static Encoding,
    utc_offset: UtcOffset,
    write_back: Option<RefCell<Box<dyn WriteBackChannel>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.config.database)
            .field("schema", &self.schema.qualifier())
            .field("encoding", &self.encoding.name())
            .field("write_back", &self.write_back.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Database`] if the store cannot be opened and
    /// [`VgerError::Config`] for invalid options.
    pub fn open(config: Config) -> Result<Self> {
        let conn = Connection::open(&config.database)?;
        Self::from_connection(conn, config)
    }

    /// Wrap an existing connection.
    ///
    /// Attaches [`Config::attach`] under the schema qualifier when both are set.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Config`] for an invalid qualifier, encoding or
    /// offset, and [`VgerError::Database`] if attaching fails.
    pub fn from_connection(conn: Connection, config: Config) -> Result<Self> {
        if let Some(schema) = &config.schema {
            if !is_identifier(schema) {
                return Err(VgerError::Config(format!(
                    "schema qualifier {schema:?} is not a plain identifier"
                )));
            }
            if let Some(path) = &config.attach {
                let path = path.to_string_lossy();
                conn.execute(&format!("ATTACH DATABASE ?1 AS {schema}"), [&*path])?;
                debug!(%path, %schema, "attached catalog database");
            }
        }

        Ok(Session {
            schema: SchemaGraph::voyager(config.schema.clone()),
            encoding: config.encoding()?,
            utc_offset: config.utc_offset()?,
            conn,
            config,
            write_back: None,
        })
    }

    /// Install a write-back channel.
    #[must_use]
    pub fn with_write_back(mut self, channel: Box<dyn WriteBackChannel>) -> Self {
        self.write_back = Some(RefCell::new(channel));
        self
    }

    /// True when item saves can be attempted.
    #[must_use]
    pub fn has_write_back(&self) -> bool {
        self.write_back.is_some()
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The schema graph all traversals use.
    #[must_use]
    pub fn schema(&self) -> &SchemaGraph {
        &self.schema
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub(crate) fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    pub(crate) fn policy(&self) -> CardinalityPolicy {
        self.config.cardinality
    }

    /// Run a query and map every row.
    pub(crate) fn rows<T>(
        &self,
        query: &Query<'_>,
        mut map: impl FnMut(&Row<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let sql = query.sql();
        debug!(%sql, "query");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(params_from_iter(query.params()))?;
        let mut mapped = Vec::new();
        while let Some(row) = rows.next()? {
            mapped.push(map(row)?);
        }
        Ok(mapped)
    }

    /// Run a query returning one integer column.
    pub(crate) fn ids(&self, query: &Query<'_>) -> Result<Vec<i64>> {
        self.rows(query, |row| Ok(row.get(0)?))
    }

    /// Read a text column of a record's row in the record encoding.
    ///
    /// Bytes that are not valid in that encoding fail with
    /// [`VgerError::TextDecode`] naming the column.
    pub(crate) fn text(
        &self,
        row: &Row<'_>,
        idx: usize,
        kind: RecordKind,
        id: i64,
    ) -> Result<Option<String>> {
        let bytes = match row.get_ref(idx)? {
            ValueRef::Null => return Ok(None),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes,
            other => {
                return Err(rusqlite::Error::InvalidColumnType(
                    idx,
                    column_name(row, idx),
                    other.data_type(),
                )
                .into())
            },
        };
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| Some(text.into_owned()))
            .ok_or_else(|| VgerError::TextDecode {
                kind,
                id,
                tag: column_name(row, idx),
                encoding: self.encoding.name(),
            })
    }

    /// Borrow the write-back channel.
    pub(crate) fn write_back(&self) -> Result<RefMut<'_, Box<dyn WriteBackChannel>>> {
        self.write_back
            .as_ref()
            .map(RefCell::borrow_mut)
            .ok_or(VgerError::WriteBackUnavailable)
    }
}

fn column_name(row: &Row<'_>, idx: usize) -> String {
    let stmt: &Statement<'_> = row.as_ref();
    stmt.column_name(idx)
        .map_or_else(|_| idx.to_string(), str::to_string)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
