//! Index dispatch: feeds field writes into matching tables and answers
//! value lookups.

use aboutdb_types::{FieldValue, Scalar};
use tracing::{debug, info};

use crate::backend::{IndexBackend, IndexRow, RowInsert};
use crate::definition::IndexDefinition;
use crate::error::{IndexError, IndexResult};
use crate::memory::InMemoryIndexBackend;

/// One field write, as seen by the index engine.
#[derive(Clone, Copy, Debug)]
pub struct FieldWrite<'a> {
    pub identity: &'a str,
    /// Schema of the object at the time of the write.
    pub schema: Option<&'a str>,
    pub field: &'a str,
    pub value: &'a FieldValue,
}

/// Identities matching a lookup, in table insertion order.
///
/// The matching ids are read from the backend when the lookup runs;
/// iteration only walks the collected list, so later writes are not seen.
#[derive(Debug, Default)]
pub struct Lookup {
    ids: std::vec::IntoIter<String>,
}

impl Lookup {
    fn new(ids: Vec<String>) -> Self {
        Self {
            ids: ids.into_iter(),
        }
    }
}

impl Iterator for Lookup {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.ids.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Lookup {}

/// Owns the index definitions and the backend holding their tables.
pub struct IndexEngine {
    definitions: Vec<IndexDefinition>,
    backend: Box<dyn IndexBackend>,
}

impl IndexEngine {
    /// Create an engine over the given backend.
    pub fn new(backend: Box<dyn IndexBackend>) -> Self {
        Self {
            definitions: Vec::new(),
            backend,
        }
    }

    /// Create an engine with in-memory tables.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryIndexBackend::new()))
    }

    /// All definitions, in definition order.
    pub fn definitions(&self) -> &[IndexDefinition] {
        &self.definitions
    }

    /// Register a definition and create its table.
    pub fn define(&mut self, definition: IndexDefinition) -> IndexResult<()> {
        self.define_with(definition, &[]).map(|_| ())
    }

    /// Register a definition and index the given existing writes into it.
    ///
    /// Either the table is created with every back-filled row, or nothing
    /// changes. Returns the number of back-filled rows.
    pub fn define_with(
        &mut self,
        definition: IndexDefinition,
        existing: &[FieldWrite<'_>],
    ) -> IndexResult<usize> {
        let table = definition.table_name()?;
        if self
            .definitions
            .iter()
            .any(|d| d.table_name().is_ok_and(|t| t == table))
        {
            return Err(IndexError::DuplicateIndex(table));
        }
        // Lookups dispatch on (schema, name), so that pair must be unique too.
        if self
            .definitions
            .iter()
            .any(|d| d.answers(definition.schema(), definition.name()))
        {
            return Err(IndexError::DuplicateIndex(match definition.schema() {
                Some(schema) => format!("{schema}/{}", definition.name()),
                None => definition.name().to_string(),
            }));
        }

        let mut rows = Vec::new();
        for write in existing
            .iter()
            .filter(|w| definition.handles(w.schema, w.field))
        {
            plan_rows(&definition, &table, write, &mut rows)?;
        }

        self.backend.create_table(&table, definition.kind())?;
        if let Err(e) = self.backend.insert_rows(&rows) {
            self.backend.drop_table(&table)?;
            return Err(e);
        }

        info!(
            table = %table,
            schema = ?definition.schema(),
            field = definition.field(),
            backfilled = rows.len(),
            "index defined"
        );
        self.definitions.push(definition);
        Ok(rows.len())
    }

    /// Feed a field write into every matching definition.
    ///
    /// Multi-values produce one row per element. If any element fails to
    /// derive, no row is written. Returns the number of rows written.
    pub fn index(
        &mut self,
        identity: &str,
        schema: Option<&str>,
        field: &str,
        value: &FieldValue,
    ) -> IndexResult<usize> {
        let write = FieldWrite {
            identity,
            schema,
            field,
            value,
        };
        let rows = self.plan(&write)?;
        self.commit(&rows)?;
        Ok(rows.len())
    }

    /// Compute the rows a write would produce without inserting them.
    pub fn plan(&self, write: &FieldWrite<'_>) -> IndexResult<Vec<RowInsert>> {
        let mut rows = Vec::new();
        for definition in self
            .definitions
            .iter()
            .filter(|d| d.handles(write.schema, write.field))
        {
            let table = definition.table_name()?;
            plan_rows(definition, &table, write, &mut rows)?;
        }
        Ok(rows)
    }

    /// Insert rows produced by [`plan`](Self::plan) as one unit.
    pub fn commit(&mut self, rows: &[RowInsert]) -> IndexResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        debug!(rows = rows.len(), "index rows");
        self.backend.insert_rows(rows)
    }

    /// The definition a lookup of (`schema`, `name`) dispatches to.
    ///
    /// An exact schema match wins over a schema-independent definition of the
    /// same name.
    pub fn resolve(&self, schema: Option<&str>, name: &str) -> Option<&IndexDefinition> {
        let exact = schema.and_then(|_| self.definitions.iter().find(|d| d.answers(schema, name)));
        exact.or_else(|| self.definitions.iter().find(|d| d.answers(None, name)))
    }

    /// Identities whose indexed value equals `value`.
    ///
    /// An unindexed (schema, name) pair yields an empty lookup.
    pub fn lookup(&self, schema: Option<&str>, name: &str, value: &Scalar) -> IndexResult<Lookup> {
        let Some(definition) = self.resolve(schema, name) else {
            debug!(?schema, name, "lookup on unindexed field");
            return Ok(Lookup::default());
        };
        let value = definition.coerce(value)?;
        let ids = self.backend.select_ids(&definition.table_name()?, &value)?;
        debug!(?schema, name, %value, hits = ids.len(), "lookup");
        Ok(Lookup::new(ids))
    }

    /// Whether a schema-independent index covers `field`.
    pub fn handles_field(&self, field: &str) -> bool {
        self.definitions.iter().any(|d| d.handles_field(field))
    }

    /// Most recently indexed value of `field` for `identity`, read from the
    /// schema-independent index on that field.
    pub fn value_for(&self, identity: &str, field: &str) -> IndexResult<Option<Scalar>> {
        match self.definitions.iter().find(|d| d.handles_field(field)) {
            Some(definition) => self
                .backend
                .latest_value(&definition.table_name()?, identity),
            None => Ok(None),
        }
    }

    /// Every row of the table owned by a definition.
    pub fn rows(&self, definition: &IndexDefinition) -> IndexResult<Vec<IndexRow>> {
        self.backend.rows(&definition.table_name()?)
    }
}

fn plan_rows(
    definition: &IndexDefinition,
    table: &str,
    write: &FieldWrite<'_>,
    rows: &mut Vec<RowInsert>,
) -> IndexResult<()> {
    for element in write.value.elements() {
        rows.push(RowInsert {
            table: table.to_string(),
            identity: write.identity.to_string(),
            value: definition.derive(element)?,
        });
    }
    Ok(())
}

impl std::fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEngine")
            .field("definitions", &self.definitions)
            .finish()
    }
}
