//! SQLite-backed index tables.

use std::path::Path;

use aboutdb_types::{Scalar, ScalarKind};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::backend::{IndexBackend, IndexRow, RowInsert};
use crate::error::{IndexError, IndexResult};

/// Index tables held in an owned SQLite connection.
///
/// Table names reach SQL text only after
/// [`IndexDefinition::table_name`](crate::IndexDefinition::table_name)
/// reduced them to `A-Z` and `_`. They are always quoted, so names that
/// collide with SQL keywords (`ORDER`, `GROUP`) work as plain identifiers.
pub struct SqliteIndexBackend {
    conn: Connection,
}

impl SqliteIndexBackend {
    /// Open a private in-memory database.
    pub fn open_in_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory().map_err(backend_err)?;
        Ok(Self { conn })
    }

    /// Open (or create) a database file.
    ///
    /// Tables are created fresh by the engine; a file that already holds a
    /// table of the same name makes that definition fail.
    pub fn open(path: &Path) -> IndexResult<Self> {
        let conn = Connection::open(path).map_err(backend_err)?;
        debug!(path = %path.display(), "opened sqlite index store");
        Ok(Self { conn })
    }
}

fn backend_err(e: rusqlite::Error) -> IndexError {
    IndexError::Backend(e.to_string())
}

fn to_sql(value: &Scalar) -> Value {
    match value {
        Scalar::Text(s) => Value::Text(s.clone()),
        Scalar::Integer(i) => Value::Integer(i64::from(*i)),
    }
}

fn from_sql(value: Value) -> IndexResult<Scalar> {
    match value {
        Value::Text(s) => Ok(Scalar::Text(s)),
        Value::Integer(i) => i32::try_from(i)
            .map(Scalar::Integer)
            .map_err(|_| IndexError::Backend(format!("integer {i} out of range"))),
        other => Err(IndexError::Backend(format!(
            "unexpected column type {:?}",
            other.data_type()
        ))),
    }
}

impl IndexBackend for SqliteIndexBackend {
    fn create_table(&mut self, table: &str, kind: ScalarKind) -> IndexResult<()> {
        self.conn
            .execute(
                &format!(
                    "CREATE TABLE \"{table}\" (
                        ID INTEGER PRIMARY KEY AUTOINCREMENT,
                        OBJECT_ID VARCHAR(64) NOT NULL,
                        VALUE {}
                    )",
                    kind.sql_type()
                ),
                [],
            )
            .map_err(backend_err)?;
        self.conn
            .execute(
                &format!("CREATE INDEX \"IDX_{table}_VALUE\" ON \"{table}\"(VALUE)"),
                [],
            )
            .map_err(backend_err)?;
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> IndexResult<()> {
        self.conn
            .execute(&format!("DROP TABLE IF EXISTS \"{table}\""), [])
            .map_err(backend_err)?;
        Ok(())
    }

    fn insert_rows(&mut self, rows: &[RowInsert]) -> IndexResult<()> {
        let tx = self.conn.transaction().map_err(backend_err)?;
        for row in rows {
            tx.execute(
                &format!(
                    "INSERT INTO \"{}\" (OBJECT_ID, VALUE) VALUES (?1, ?2)",
                    row.table
                ),
                params![row.identity, to_sql(&row.value)],
            )
            .map_err(backend_err)?;
        }
        // Dropping an uncommitted transaction rolls it back.
        tx.commit().map_err(backend_err)
    }

    fn select_ids(&self, table: &str, value: &Scalar) -> IndexResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT OBJECT_ID FROM \"{table}\" WHERE VALUE = ?1 ORDER BY ID"
            ))
            .map_err(backend_err)?;
        let ids = stmt
            .query_map(params![to_sql(value)], |row| row.get::<_, String>(0))
            .map_err(backend_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend_err)?;
        Ok(ids)
    }

    fn latest_value(&self, table: &str, identity: &str) -> IndexResult<Option<Scalar>> {
        let value = self
            .conn
            .query_row(
                &format!(
                    "SELECT VALUE FROM \"{table}\" WHERE OBJECT_ID = ?1 ORDER BY ID DESC LIMIT 1"
                ),
                params![identity],
                |row| row.get::<_, Value>(0),
            )
            .optional()
            .map_err(backend_err)?;
        value.map(from_sql).transpose()
    }

    fn rows(&self, table: &str) -> IndexResult<Vec<IndexRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT ID, OBJECT_ID, VALUE FROM \"{table}\" ORDER BY ID"
            ))
            .map_err(backend_err)?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Value>(2)?,
                ))
            })
            .map_err(backend_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend_err)?;
        raw.into_iter()
            .map(|(id, identity, value)| {
                Ok(IndexRow {
                    id,
                    identity,
                    value: from_sql(value)?,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for SqliteIndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteIndexBackend")
            .field("path", &self.conn.path())
            .finish()
    }
}
