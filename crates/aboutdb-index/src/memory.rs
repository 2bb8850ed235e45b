use std::collections::HashMap;

use aboutdb_types::{Scalar, ScalarKind};

use crate::backend::{IndexBackend, IndexRow, RowInsert};
use crate::error::{IndexError, IndexResult};

struct Table {
    kind: ScalarKind,
    next_id: i64,
    rows: Vec<IndexRow>,
}

/// In-memory, `Vec`-backed index tables.
///
/// Intended for tests and embedding. Rows are kept in insertion order and
/// scanned linearly on selection.
#[derive(Default)]
pub struct InMemoryIndexBackend {
    tables: HashMap<String, Table>,
}

impl InMemoryIndexBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn table(&self, name: &str) -> IndexResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| IndexError::UnknownTable(name.to_string()))
    }
}

impl IndexBackend for InMemoryIndexBackend {
    fn create_table(&mut self, table: &str, kind: ScalarKind) -> IndexResult<()> {
        if self.tables.contains_key(table) {
            return Err(IndexError::DuplicateIndex(table.to_string()));
        }
        self.tables.insert(
            table.to_string(),
            Table {
                kind,
                next_id: 1,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> IndexResult<()> {
        self.tables.remove(table);
        Ok(())
    }

    fn insert_rows(&mut self, rows: &[RowInsert]) -> IndexResult<()> {
        // Validate the whole batch before touching any table.
        for row in rows {
            let table = self.table(&row.table)?;
            if row.value.kind() != table.kind {
                return Err(IndexError::IndexValueTypeMismatch {
                    index: row.table.clone(),
                    expected: table.kind,
                    value: row.value.to_string(),
                });
            }
        }
        for row in rows {
            if let Some(table) = self.tables.get_mut(&row.table) {
                let id = table.next_id;
                table.next_id += 1;
                table.rows.push(IndexRow {
                    id,
                    identity: row.identity.clone(),
                    value: row.value.clone(),
                });
            }
        }
        Ok(())
    }

    fn select_ids(&self, table: &str, value: &Scalar) -> IndexResult<Vec<String>> {
        Ok(self
            .table(table)?
            .rows
            .iter()
            .filter(|row| &row.value == value)
            .map(|row| row.identity.clone())
            .collect())
    }

    fn latest_value(&self, table: &str, identity: &str) -> IndexResult<Option<Scalar>> {
        Ok(self
            .table(table)?
            .rows
            .iter()
            .rev()
            .find(|row| row.identity == identity)
            .map(|row| row.value.clone()))
    }

    fn rows(&self, table: &str) -> IndexResult<Vec<IndexRow>> {
        Ok(self.table(table)?.rows.clone())
    }
}

impl std::fmt::Debug for InMemoryIndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndexBackend")
            .field("table_count", &self.tables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(table: &str, identity: &str, value: impl Into<Scalar>) -> RowInsert {
        RowInsert {
            table: table.into(),
            identity: identity.into(),
            value: value.into(),
        }
    }

    #[test]
    fn create_and_select() {
        let mut b = InMemoryIndexBackend::new();
        b.create_table("TAGS", ScalarKind::Text).unwrap();
        b.insert_rows(&[insert("TAGS", "A", "a"), insert("TAGS", "A", "b")])
            .unwrap();
        b.insert_rows(&[insert("TAGS", "B", "b")]).unwrap();

        assert_eq!(b.select_ids("TAGS", &"b".into()).unwrap(), vec!["A", "B"]);
        assert_eq!(b.select_ids("TAGS", &"a".into()).unwrap(), vec!["A"]);
        assert!(b.select_ids("TAGS", &"z".into()).unwrap().is_empty());
    }

    #[test]
    fn row_ids_increase() {
        let mut b = InMemoryIndexBackend::new();
        b.create_table("T", ScalarKind::Integer).unwrap();
        b.insert_rows(&[insert("T", "A", 1), insert("T", "B", 2)]).unwrap();
        let ids: Vec<i64> = b.rows("T").unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn latest_value_is_most_recent_row() {
        let mut b = InMemoryIndexBackend::new();
        b.create_table("SCHEMA", ScalarKind::Text).unwrap();
        b.insert_rows(&[insert("SCHEMA", "A", "Entry")]).unwrap();
        b.insert_rows(&[insert("SCHEMA", "A", "Variant")]).unwrap();
        assert_eq!(
            b.latest_value("SCHEMA", "A").unwrap(),
            Some(Scalar::text("Variant"))
        );
        assert_eq!(b.latest_value("SCHEMA", "B").unwrap(), None);
    }

    #[test]
    fn duplicate_table_rejected() {
        let mut b = InMemoryIndexBackend::new();
        b.create_table("T", ScalarKind::Text).unwrap();
        let err = b.create_table("T", ScalarKind::Text).unwrap_err();
        assert!(matches!(err, IndexError::DuplicateIndex(_)));
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut b = InMemoryIndexBackend::new();
        b.create_table("T", ScalarKind::Text).unwrap();
        let err = b
            .insert_rows(&[insert("T", "A", "ok"), insert("MISSING", "A", "x")])
            .unwrap_err();
        assert!(matches!(err, IndexError::UnknownTable(_)));
        assert!(b.rows("T").unwrap().is_empty());

        let err = b
            .insert_rows(&[insert("T", "A", "ok"), insert("T", "A", 5)])
            .unwrap_err();
        assert!(matches!(err, IndexError::IndexValueTypeMismatch { .. }));
        assert!(b.rows("T").unwrap().is_empty());
    }

    #[test]
    fn drop_table_removes_rows() {
        let mut b = InMemoryIndexBackend::new();
        b.create_table("T", ScalarKind::Text).unwrap();
        b.drop_table("T").unwrap();
        b.drop_table("T").unwrap();
        assert!(b.is_empty());
        assert!(matches!(b.rows("T"), Err(IndexError::UnknownTable(_))));
    }
}
