use aboutdb_types::{Scalar, ScalarKind};

use crate::error::IndexResult;

/// A row stored in an index table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexRow {
    /// Auto-incremented row id, in insertion order.
    pub id: i64,
    /// Identity of the object the value was derived from.
    pub identity: String,
    /// The derived, coerced value.
    pub value: Scalar,
}

/// A row waiting to be inserted into `table`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowInsert {
    pub table: String,
    pub identity: String,
    pub value: Scalar,
}

/// Storage for index tables.
///
/// Each table has an auto-incrementing row id, an identity column and one
/// typed value column. The engine relies on nothing beyond insertion and
/// equality-filtered selection.
///
/// All implementations must satisfy these invariants:
/// - [`insert_rows`](Self::insert_rows) applies every row or none of them.
/// - Selections return rows in insertion order.
pub trait IndexBackend: Send {
    /// Create an empty table whose value column holds `kind`.
    fn create_table(&mut self, table: &str, kind: ScalarKind) -> IndexResult<()>;

    /// Drop a table and its rows. Dropping a missing table is a no-op.
    fn drop_table(&mut self, table: &str) -> IndexResult<()>;

    /// Append rows, possibly spanning several tables, as one unit.
    fn insert_rows(&mut self, rows: &[RowInsert]) -> IndexResult<()>;

    /// Identities of the rows whose value equals `value`.
    fn select_ids(&self, table: &str, value: &Scalar) -> IndexResult<Vec<String>>;

    /// Value of the most recently inserted row for `identity`.
    fn latest_value(&self, table: &str, identity: &str) -> IndexResult<Option<Scalar>>;

    /// Every row of a table.
    fn rows(&self, table: &str) -> IndexResult<Vec<IndexRow>>;
}
