//! Filters for bulk iteration.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, VgerError};
use crate::schema::Query;

/// Which part of the catalog a bulk iteration covers.
///
/// Exactly one of a location set or an owning library; the two cannot be
/// combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Records at any of these location ids.
    Locations(Vec<i64>),
    /// Records at any location owned by this library id.
    Library(i64),
}

impl Scope {
    /// Scope over a set of location ids.
    pub fn locations(ids: impl IntoIterator<Item = i64>) -> Self {
        Scope::Locations(ids.into_iter().collect())
    }

    /// Scope over one owning library.
    #[must_use]
    pub fn library(id: i64) -> Self {
        Scope::Library(id)
    }

    /// Scope over the configured default library.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Config`] when no `library_id` is configured.
    pub fn default_library(config: &Config) -> Result<Self> {
        config
            .library_id
            .map(Scope::Library)
            .ok_or_else(|| VgerError::Config("no library_id configured".to_string()))
    }

    /// Restrict a query that has joined the `location` table.
    pub(crate) fn apply<'g>(&self, query: Query<'g>) -> Result<Query<'g>> {
        match self {
            Scope::Locations(ids) => query.filter_in("location", "location_id", ids.iter().copied()),
            Scope::Library(id) => query.filter_eq("location", "library_id", *id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaGraph;

    #[test]
    fn library_scope_filters_on_owner() {
        let graph = SchemaGraph::voyager(None);
        let query = Scope::library(4)
            .apply(graph.query("location").unwrap().select("location.location_id"))
            .unwrap();
        assert!(query.sql().ends_with("WHERE location.library_id = ?"));
    }

    #[test]
    fn empty_location_scope_is_rejected() {
        let graph = SchemaGraph::voyager(None);
        let result = Scope::locations([]).apply(graph.query("location").unwrap());
        assert!(matches!(result, Err(VgerError::EmptyScope)));
    }

    #[test]
    fn default_library_requires_config() {
        assert!(Scope::default_library(&Config::default()).is_err());
        let config = Config {
            library_id: Some(2),
            ..Config::default()
        };
        assert_eq!(Scope::default_library(&config).unwrap(), Scope::Library(2));
    }
}
