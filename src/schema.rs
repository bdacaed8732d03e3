//! Declared tables and foreign-key edges of the catalog store.
//!
//! Every join the crate issues is rendered from a [`SchemaGraph`] edge; a
//! pair of tables without a declared edge cannot be joined at all. The graph
//! is an immutable value built once per session.
//!
//! ```
//! use vger::SchemaGraph;
//!
//! let graph = SchemaGraph::voyager(None);
//! let sql = graph
//!     .query("mfhd_item")?
//!     .select("bib_mfhd.bib_id")
//!     .join("mfhd_item", "bib_mfhd")?
//!     .filter_eq("mfhd_item", "item_id", 10)?
//!     .sql();
//! assert_eq!(
//!     sql,
//!     "SELECT bib_mfhd.bib_id FROM mfhd_item \
//!      JOIN bib_mfhd ON mfhd_item.mfhd_id = bib_mfhd.mfhd_id \
//!      WHERE mfhd_item.item_id = ?"
//! );
//! # Ok::<(), vger::VgerError>(())
//! ```

use indexmap::IndexSet;
use rusqlite::types::Value;

use crate::error::{Result, VgerError};

/// A `(table, column)` pair.
pub type ColumnRef = (&'static str, &'static str);

/// An undirected foreign-key edge between two columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    /// One end of the edge.
    pub left: ColumnRef,
    /// The other end.
    pub right: ColumnRef,
}

impl ForeignKey {
    const fn new(left: ColumnRef, right: ColumnRef) -> Self {
        ForeignKey { left, right }
    }

    /// The edge oriented so that its first column belongs to `from`.
    fn oriented(&self, from: &str, to: &str) -> Option<(ColumnRef, ColumnRef)> {
        if self.left.0 == from && self.right.0 == to {
            Some((self.left, self.right))
        } else if self.right.0 == from && self.left.0 == to {
            Some((self.right, self.left))
        } else {
            None
        }
    }
}

/// Tables of the Voyager catalog that the crate reads.
pub const VOYAGER_TABLES: &[&str] = &[
    "mfhd_master",
    "mfhd_data",
    "mfhd_history",
    "bib_location",
    "bib_master",
    "bib_data",
    "bib_history",
    "bib_index",
    "item",
    "mfhd_item",
    "item_note",
    "bib_text",
    "bib_mfhd",
    "item_status",
    "item_status_type",
    "location",
    "item_barcode",
];

/// Foreign-key edges of the Voyager catalog.
pub const VOYAGER_EDGES: &[ForeignKey] = &[
    ForeignKey::new(("item", "item_id"), ("mfhd_item", "item_id")),
    ForeignKey::new(("item", "item_id"), ("item_note", "item_id")),
    ForeignKey::new(("item", "item_id"), ("item_status", "item_id")),
    ForeignKey::new(("item", "item_id"), ("item_barcode", "item_id")),
    ForeignKey::new(("bib_master", "bib_id"), ("bib_location", "bib_id")),
    ForeignKey::new(("bib_master", "bib_id"), ("bib_text", "bib_id")),
    ForeignKey::new(("bib_master", "bib_id"), ("bib_mfhd", "bib_id")),
    ForeignKey::new(("bib_master", "bib_id"), ("bib_index", "bib_id")),
    ForeignKey::new(("bib_master", "bib_id"), ("bib_data", "bib_id")),
    ForeignKey::new(("bib_master", "bib_id"), ("bib_history", "bib_id")),
    ForeignKey::new(
        ("item_status", "item_status"),
        ("item_status_type", "item_status_type"),
    ),
    ForeignKey::new(("mfhd_master", "mfhd_id"), ("bib_mfhd", "mfhd_id")),
    ForeignKey::new(("mfhd_master", "mfhd_id"), ("mfhd_item", "mfhd_id")),
    ForeignKey::new(("mfhd_master", "mfhd_id"), ("mfhd_data", "mfhd_id")),
    ForeignKey::new(("mfhd_master", "mfhd_id"), ("mfhd_history", "mfhd_id")),
    ForeignKey::new(("bib_mfhd", "mfhd_id"), ("mfhd_item", "mfhd_id")),
    ForeignKey::new(("location", "location_id"), ("mfhd_master", "location_id")),
    ForeignKey::new(("location", "location_id"), ("bib_location", "location_id")),
];

/// Declared tables and join edges, optionally under a schema qualifier.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    qualifier: Option<String>,
    tables: IndexSet<&'static str>,
    edges: Vec<ForeignKey>,
}

impl SchemaGraph {
    /// Build a graph from explicit tables and edges.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UnknownTable`] if an edge names an undeclared table.
    pub fn new(
        qualifier: Option<String>,
        tables: &[&'static str],
        edges: &[ForeignKey],
    ) -> Result<Self> {
        let tables: IndexSet<&'static str> = tables.iter().copied().collect();
        for edge in edges {
            for (table, _) in [edge.left, edge.right] {
                if !tables.contains(table) {
                    return Err(VgerError::UnknownTable(table.to_string()));
                }
            }
        }
        Ok(SchemaGraph {
            qualifier,
            tables,
            edges: edges.to_vec(),
        })
    }

    /// The Voyager catalog graph.
    #[must_use]
    pub fn voyager(qualifier: Option<String>) -> Self {
        SchemaGraph {
            qualifier,
            tables: VOYAGER_TABLES.iter().copied().collect(),
            edges: VOYAGER_EDGES.to_vec(),
        }
    }

    /// Schema qualifier prefixed to every table reference.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Declared tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.iter().copied()
    }

    /// Declared edges.
    #[must_use]
    pub fn edges(&self) -> &[ForeignKey] {
        &self.edges
    }

    /// The declared edge between two tables, oriented `from` -> `to`.
    #[must_use]
    pub fn edge(&self, from: &str, to: &str) -> Option<(ColumnRef, ColumnRef)> {
        self.edges.iter().find_map(|edge| edge.oriented(from, to))
    }

    /// Render a table reference for a `FROM` or `JOIN` clause.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UnknownTable`] for undeclared tables.
    pub fn table(&self, name: &str) -> Result<String> {
        if !self.tables.contains(name) {
            return Err(VgerError::UnknownTable(name.to_string()));
        }
        Ok(match &self.qualifier {
            Some(schema) => format!("{schema}.{name} AS {name}"),
            None => name.to_string(),
        })
    }

    /// Store expression returning a column's raw bytes.
    #[must_use]
    pub fn raw(table: &str, column: &str) -> String {
        format!("CAST({table}.{column} AS BLOB)")
    }

    fn join_clause(&self, kind: &str, from: &str, to: &str) -> Result<String> {
        let ((lt, lc), (rt, rc)) = self.edge(from, to).ok_or_else(|| VgerError::UndeclaredJoin {
            from: from.to_string(),
            to: to.to_string(),
        })?;
        Ok(format!(
            "{kind} {} ON {lt}.{lc} = {rt}.{rc}",
            self.table(to)?
        ))
    }

    /// Render `JOIN to ON ...` along the declared edge.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UndeclaredJoin`] when no edge joins the tables.
    pub fn join(&self, from: &str, to: &str) -> Result<String> {
        self.join_clause("JOIN", from, to)
    }

    /// Render `LEFT JOIN to ON ...` along the declared edge.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UndeclaredJoin`] when no edge joins the tables.
    pub fn left_join(&self, from: &str, to: &str) -> Result<String> {
        self.join_clause("LEFT JOIN", from, to)
    }

    /// Start a query rooted at `table`.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UnknownTable`] for undeclared tables.
    pub fn query(&self, table: &str) -> Result<Query<'_>> {
        Ok(Query {
            graph: self,
            distinct: false,
            select: Vec::new(),
            from: self.table(table)?,
            joins: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            params: Vec::new(),
        })
    }
}

/// A `SELECT` whose joins all come from a [`SchemaGraph`].
#[derive(Debug, Clone)]
pub struct Query<'g> {
    graph: &'g SchemaGraph,
    distinct: bool,
    select: Vec<String>,
    from: String,
    joins: Vec<String>,
    filters: Vec<String>,
    order_by: Vec<String>,
    params: Vec<Value>,
}

impl Query<'_> {
    /// Add a result column or expression.
    #[must_use]
    pub fn select(mut self, expr: impl Into<String>) -> Self {
        self.select.push(expr.into());
        self
    }

    /// Use `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Inner-join along a declared edge.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UndeclaredJoin`] when no edge joins the tables.
    pub fn join(mut self, from: &str, to: &str) -> Result<Self> {
        self.joins.push(self.graph.join(from, to)?);
        Ok(self)
    }

    /// Left-join along a declared edge.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UndeclaredJoin`] when no edge joins the tables.
    pub fn left_join(mut self, from: &str, to: &str) -> Result<Self> {
        self.joins.push(self.graph.left_join(from, to)?);
        Ok(self)
    }

    /// Inner-join each consecutive pair of `path`.
    ///
    /// # Errors
    ///
    /// Fails on the first pair without a declared edge.
    pub fn walk(self, path: &[&str]) -> Result<Self> {
        path.windows(2)
            .try_fold(self, |query, pair| query.join(pair[0], pair[1]))
    }

    fn column(&self, table: &str, column: &str) -> Result<String> {
        if self.graph.tables.contains(table) {
            Ok(format!("{table}.{column}"))
        } else {
            Err(VgerError::UnknownTable(table.to_string()))
        }
    }

    /// Add `table.column = ?`.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UnknownTable`] for undeclared tables.
    pub fn filter_eq(mut self, table: &str, column: &str, value: impl Into<Value>) -> Result<Self> {
        let column = self.column(table, column)?;
        self.filters.push(format!("{column} = ?"));
        self.params.push(value.into());
        Ok(self)
    }

    /// Add `table.column IN (?, ...)`.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UnknownTable`] for undeclared tables and
    /// [`VgerError::EmptyScope`] for an empty value list.
    pub fn filter_in<V: Into<Value>>(
        mut self,
        table: &str,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let column = self.column(table, column)?;
        let start = self.params.len();
        self.params.extend(values.into_iter().map(Into::into));
        let count = self.params.len() - start;
        if count == 0 {
            return Err(VgerError::EmptyScope);
        }
        let placeholders = vec!["?"; count].join(", ");
        self.filters.push(format!("{column} IN ({placeholders})"));
        Ok(self)
    }

    /// Add an ascending sort key.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::UnknownTable`] for undeclared tables.
    pub fn order_by(mut self, table: &str, column: &str) -> Result<Self> {
        let column = self.column(table, column)?;
        self.order_by.push(column);
        Ok(self)
    }

    /// Bound parameters in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Render the statement.
    #[must_use]
    pub fn sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.select.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.from);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filters.join(" AND "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_undirected() {
        let graph = SchemaGraph::voyager(None);
        assert_eq!(
            graph.edge("mfhd_item", "item"),
            Some((("mfhd_item", "item_id"), ("item", "item_id")))
        );
        assert_eq!(
            graph.edge("item", "mfhd_item"),
            Some((("item", "item_id"), ("mfhd_item", "item_id")))
        );
    }

    #[test]
    fn undeclared_join_is_refused() {
        let graph = SchemaGraph::voyager(None);
        assert!(graph.edge("bib_data", "item").is_none());
        assert!(matches!(
            graph.join("bib_data", "item"),
            Err(VgerError::UndeclaredJoin { .. })
        ));
    }

    #[test]
    fn unknown_table_is_refused() {
        let graph = SchemaGraph::voyager(None);
        assert!(matches!(graph.table("patron"), Err(VgerError::UnknownTable(_))));
        assert!(graph.query("patron").is_err());
    }

    #[test]
    fn every_edge_endpoint_is_declared() {
        let graph = SchemaGraph::voyager(None);
        let tables: Vec<&str> = graph.tables().collect();
        for edge in graph.edges() {
            assert!(tables.contains(&edge.left.0), "{edge:?}");
            assert!(tables.contains(&edge.right.0), "{edge:?}");
        }
    }

    #[test]
    fn new_validates_edges() {
        let err = SchemaGraph::new(
            None,
            &["item"],
            &[ForeignKey::new(("item", "item_id"), ("mfhd_item", "item_id"))],
        );
        assert!(matches!(err, Err(VgerError::UnknownTable(t)) if t == "mfhd_item"));
    }

    #[test]
    fn qualifier_aliases_tables() {
        let graph = SchemaGraph::voyager(Some("pittdb".to_string()));
        assert_eq!(graph.table("bib_data").unwrap(), "pittdb.bib_data AS bib_data");
        assert_eq!(
            graph.join("location", "mfhd_master").unwrap(),
            "JOIN pittdb.mfhd_master AS mfhd_master ON location.location_id = mfhd_master.location_id"
        );
    }

    #[test]
    fn walk_renders_a_join_path() {
        let graph = SchemaGraph::voyager(None);
        let query = graph
            .query("item")
            .unwrap()
            .select("item.item_id")
            .walk(&["item", "mfhd_item", "mfhd_master", "location"])
            .unwrap()
            .filter_in("location", "location_id", [1_i64, 2])
            .unwrap()
            .order_by("item", "item_id")
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT item.item_id FROM item \
             JOIN mfhd_item ON item.item_id = mfhd_item.item_id \
             JOIN mfhd_master ON mfhd_item.mfhd_id = mfhd_master.mfhd_id \
             JOIN location ON mfhd_master.location_id = location.location_id \
             WHERE location.location_id IN (?, ?) ORDER BY item.item_id"
        );
        assert_eq!(query.params().len(), 2);
    }

    #[test]
    fn empty_in_list_is_rejected() {
        let graph = SchemaGraph::voyager(None);
        let result = graph
            .query("location")
            .unwrap()
            .filter_in("location", "location_id", Vec::<i64>::new());
        assert!(matches!(result, Err(VgerError::EmptyScope)));
    }
}
