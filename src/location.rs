//! Location lookups.

use rusqlite::Row;
use serde::Serialize;

use crate::error::{RecordKind, Result, VgerError};
use crate::schema::Query;
use crate::session::Session;

/// A row of the `location` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Location id.
    pub id: i64,
    /// Short location code.
    pub code: String,
    /// Staff-facing name; cataloging locations are resolved by this.
    pub name: Option<String>,
    /// Public display name.
    pub display_name: Option<String>,
    /// Owning library.
    pub library_id: Option<i64>,
}

impl Location {
    fn columns(query: Query<'_>) -> Query<'_> {
        query
            .select("location.location_id")
            .select("location.location_code")
            .select("location.location_name")
            .select("location.location_display_name")
            .select("location.library_id")
    }

    fn from_row(session: &Session, row: &Row<'_>) -> Result<Self> {
        let id = row.get(0)?;
        let text = |idx| session.text(row, idx, RecordKind::Location, id);
        Ok(Location {
            id,
            code: text(1)?.unwrap_or_default(),
            name: text(2)?,
            display_name: text(3)?,
            library_id: row.get(4)?,
        })
    }
}

impl Session {
    /// Resolve a location name to its id.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::LocationNotFound`] when no location has that
    /// name, and [`VgerError::Anomaly`] for duplicate names under the strict
    /// policy.
    pub fn get_location_id(&self, name: &str) -> Result<i64> {
        let query = self
            .schema()
            .query("location")?
            .select("location.location_id")
            .filter_eq("location", "location_name", name.to_string())?
            .order_by("location", "location_id")?;
        self.policy()
            .first("location name", name, self.ids(&query)?)?
            .ok_or_else(|| VgerError::LocationNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a location by code.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::NotFound`] for unknown codes.
    pub fn get_location(&self, code: &str) -> Result<Location> {
        let query = Location::columns(self.schema().query("location")?)
            .filter_eq("location", "location_code", code.to_string())?
            .order_by("location", "location_id")?;
        let rows = self.rows(&query, |row| Location::from_row(self, row))?;
        self.policy()
            .first("location code", code, rows)?
            .ok_or_else(|| VgerError::NotFound {
                kind: RecordKind::Location,
                key: code.to_string(),
            })
    }

    /// Every location owned by a library, by id.
    ///
    /// # Errors
    ///
    /// Store errors only; an unknown library yields an empty list.
    pub fn library_locations(&self, library_id: i64) -> Result<Vec<Location>> {
        let query = Location::columns(self.schema().query("location")?)
            .filter_eq("location", "library_id", library_id)?
            .order_by("location", "location_id")?;
        self.rows(&query, |row| Location::from_row(self, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::status::CardinalityPolicy;
    use rusqlite::Connection;

    fn session(policy: CardinalityPolicy) -> Session {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE location (location_id INTEGER, location_code TEXT, location_name TEXT,
                                    location_display_name TEXT, library_id INTEGER);
             INSERT INTO location VALUES (1, 'hill', 'Hillman Cataloging', 'Hillman Library', 10);
             INSERT INTO location VALUES (2, 'hillr', 'Hillman Reserve', NULL, 10);
             INSERT INTO location VALUES (3, 'dar', 'Darlington', 'Darlington Room', 20);
             INSERT INTO location VALUES (4, 'dup', 'Darlington', NULL, 20);",
        )
        .unwrap();
        let config = Config {
            cardinality: policy,
            ..Config::default()
        };
        Session::from_connection(conn, config).unwrap()
    }

    #[test]
    fn resolves_names_and_codes() {
        let session = session(CardinalityPolicy::Warn);
        assert_eq!(session.get_location_id("Hillman Reserve").unwrap(), 2);

        let hill = session.get_location("hill").unwrap();
        assert_eq!(hill.id, 1);
        assert_eq!(hill.display_name.as_deref(), Some("Hillman Library"));
        assert_eq!(hill.library_id, Some(10));
    }

    #[test]
    fn unknown_names_and_codes_fail() {
        let session = session(CardinalityPolicy::Warn);
        assert!(matches!(
            session.get_location_id("Nowhere"),
            Err(VgerError::LocationNotFound { name }) if name == "Nowhere"
        ));
        assert!(matches!(
            session.get_location("zzz"),
            Err(VgerError::NotFound { kind: RecordKind::Location, .. })
        ));
    }

    #[test]
    fn duplicate_names_follow_policy() {
        assert_eq!(
            session(CardinalityPolicy::Warn)
                .get_location_id("Darlington")
                .unwrap(),
            3
        );
        assert!(matches!(
            session(CardinalityPolicy::Strict).get_location_id("Darlington"),
            Err(VgerError::Anomaly { rows: 2, .. })
        ));
    }

    #[test]
    fn lists_library_locations() {
        let session = session(CardinalityPolicy::Warn);
        let codes: Vec<String> = session
            .library_locations(10)
            .unwrap()
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, ["hill", "hillr"]);
        assert!(session.library_locations(99).unwrap().is_empty());
    }
}
