//! Lazy bulk iteration over a scope.
//!
//! Each `iter_*` call builds its id query up front, so a bad scope fails
//! before anything runs, and executes it on the first `next()`. Entities are
//! then assembled one at a time. A record whose own stored data is unusable
//! (missing rows, undecodable bytes, a bad suppression flag or timestamp) is
//! logged, remembered in [`ScopedIter::skipped`] and passed over. Any other
//! error is yielded once and ends the iteration.

use std::iter::FusedIterator;
use std::vec;

use tracing::{debug, warn};

use crate::bib::BibRecord;
use crate::error::{RecordKind, Result, VgerError};
use crate::holdings::HoldingsRecord;
use crate::item::ItemRecord;
use crate::schema::Query;
use crate::scope::Scope;
use crate::session::Session;

/// A record passed over during iteration.
#[derive(Debug)]
pub struct Skipped {
    /// Entity kind.
    pub kind: RecordKind,
    /// Id of the skipped record.
    pub id: i64,
    /// Why it was skipped.
    pub error: VgerError,
}

/// Pull-based iterator over the entities of one scope, in id order.
#[derive(Debug)]
pub struct ScopedIter<'s, T> {
    session: &'s Session,
    kind: RecordKind,
    query: Query<'s>,
    ids: Option<vec::IntoIter<i64>>,
    fetch: fn(&'s Session, i64) -> Result<T>,
    skipped: Vec<Skipped>,
    done: bool,
}

impl<'s, T> ScopedIter<'s, T> {
    fn new(
        session: &'s Session,
        kind: RecordKind,
        query: Query<'s>,
        fetch: fn(&'s Session, i64) -> Result<T>,
    ) -> Self {
        ScopedIter {
            session,
            kind,
            query,
            ids: None,
            fetch,
            skipped: Vec::new(),
            done: false,
        }
    }

    /// Records skipped so far.
    #[must_use]
    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }
}

impl<T> Iterator for ScopedIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.ids.is_none() {
            match self.session.ids(&self.query) {
                Ok(ids) => {
                    debug!(kind = %self.kind, count = ids.len(), "iterating");
                    self.ids = Some(ids.into_iter());
                },
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                },
            }
        }

        while let Some(id) = self.ids.as_mut().and_then(Iterator::next) {
            match (self.fetch)(self.session, id) {
                Ok(entity) => return Some(Ok(entity)),
                Err(error) if error.is_record_local() => {
                    warn!(kind = %self.kind, id, %error, "skipping record");
                    self.skipped.push(Skipped {
                        kind: self.kind,
                        id,
                        error,
                    });
                },
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                },
            }
        }
        self.done = true;
        None
    }
}

impl<T> FusedIterator for ScopedIter<'_, T> {}

fn visible<'g>(query: Query<'g>, table: &str, include_suppressed: bool) -> Result<Query<'g>> {
    if include_suppressed {
        Ok(query)
    } else {
        query.filter_eq(table, "suppress_in_opac", "N".to_string())
    }
}

impl Session {
    /// Bibs at the scope's locations, by bib id.
    ///
    /// Suppressed bibs are left out unless `include_suppressed` is set.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::EmptyScope`] for an empty location set.
    pub fn iter_bibs(
        &self,
        scope: &Scope,
        include_suppressed: bool,
    ) -> Result<ScopedIter<'_, BibRecord<'_>>> {
        let query = self
            .schema()
            .query("bib_master")?
            .distinct()
            .select("bib_master.bib_id")
            .walk(&["bib_master", "bib_location", "location"])?;
        let query = visible(scope.apply(query)?, "bib_master", include_suppressed)?
            .order_by("bib_master", "bib_id")?;
        Ok(ScopedIter::new(self, RecordKind::Bib, query, Session::get_bib))
    }

    /// Holdings at the scope's locations, by mfhd id.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::EmptyScope`] for an empty location set.
    pub fn iter_mfhds(
        &self,
        scope: &Scope,
        include_suppressed: bool,
    ) -> Result<ScopedIter<'_, HoldingsRecord<'_>>> {
        let query = self
            .schema()
            .query("mfhd_master")?
            .select("mfhd_master.mfhd_id")
            .join("mfhd_master", "location")?;
        let query = visible(scope.apply(query)?, "mfhd_master", include_suppressed)?
            .order_by("mfhd_master", "mfhd_id")?;
        Ok(ScopedIter::new(self, RecordKind::Holdings, query, Session::get_mfhd))
    }

    /// Items whose holding is at the scope's locations, by item id.
    ///
    /// Suppression is that of the owning holding.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::EmptyScope`] for an empty location set.
    pub fn iter_items(
        &self,
        scope: &Scope,
        include_suppressed: bool,
    ) -> Result<ScopedIter<'_, ItemRecord<'_>>> {
        let query = self
            .schema()
            .query("item")?
            .distinct()
            .select("item.item_id")
            .walk(&["item", "mfhd_item", "mfhd_master", "location"])?;
        let query = visible(scope.apply(query)?, "mfhd_master", include_suppressed)?
            .order_by("item", "item_id")?;
        Ok(ScopedIter::new(self, RecordKind::Item, query, Session::get_item_by_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rusqlite::Connection;

    fn session() -> Session {
        Session::from_connection(Connection::open_in_memory().unwrap(), Config::default()).unwrap()
    }

    #[test]
    fn empty_scope_fails_before_querying() {
        let session = session();
        let empty = Scope::locations([]);
        assert!(matches!(session.iter_bibs(&empty, false), Err(VgerError::EmptyScope)));
        assert!(matches!(session.iter_mfhds(&empty, true), Err(VgerError::EmptyScope)));
        assert!(matches!(session.iter_items(&empty, false), Err(VgerError::EmptyScope)));
    }

    #[test]
    fn store_errors_end_iteration() {
        let session = session();
        let mut bibs = session.iter_bibs(&Scope::library(1), false).unwrap();
        assert!(matches!(bibs.next(), Some(Err(VgerError::Database(_)))));
        assert!(bibs.next().is_none());
        assert!(bibs.skipped().is_empty());
    }
}
