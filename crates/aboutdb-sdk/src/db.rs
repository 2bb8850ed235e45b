//! The [`AboutDb`] facade.
//!
//! A write runs codec -> chunk allocator -> index engine -> register. Every
//! step that can fail runs before the first step that mutates visible state,
//! so a failed write leaves no trace except possibly unreferenced chunk bytes.

use aboutdb_index::{
    FieldWrite, InMemoryIndexBackend, IndexBackend, IndexDefinition, IndexEngine, Lookup,
};
use aboutdb_store::{codec, ChunkSet, Register, StoreError};
use aboutdb_types::{
    Document, FieldValue, Location, Pointer, ResolvedValue, Scalar, ID_FIELD, SCHEMA_FIELD,
};
use tracing::{debug, info};

use crate::config::{BackendKind, StoreConfig};
use crate::error::{SdkError, SdkResult};

/// Embedded object store.
///
/// Writers need `&mut self`; share an instance across threads behind a
/// `Mutex` so that each write commits before the next one starts.
pub struct AboutDb {
    config: StoreConfig,
    chunks: ChunkSet,
    register: Register,
    index: IndexEngine,
}

impl AboutDb {
    /// Open a store with default configuration and in-memory indexes.
    pub fn in_memory() -> SdkResult<Self> {
        Self::open(StoreConfig::default())
    }

    /// Open a store, building the index backend named by the config.
    pub fn open(config: StoreConfig) -> SdkResult<Self> {
        let backend = open_backend(&config.index_backend)?;
        Self::with_backend(config, backend)
    }

    /// Open a store over a caller-supplied index backend.
    pub fn with_backend(config: StoreConfig, backend: Box<dyn IndexBackend>) -> SdkResult<Self> {
        config.validate()?;
        let mut index = IndexEngine::new(backend);
        index.define(IndexDefinition::global(SCHEMA_FIELD))?;
        info!(
            chunk_capacity = config.chunk_capacity,
            backend = ?config.index_backend,
            "store opened"
        );
        Ok(Self {
            chunks: ChunkSet::new(config.chunk_capacity),
            register: Register::new(),
            index,
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The index engine, for inspecting definitions and their rows.
    pub fn index_engine(&self) -> &IndexEngine {
        &self.index
    }

    /// Number of chunks allocated so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Bytes appended to chunks, including bytes of overwritten values.
    pub fn bytes_used(&self) -> usize {
        self.chunks.bytes_used()
    }

    /// Live identities in sorted order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.register.identities()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.register.contains(identity)
    }

    // ---- Index definitions ----

    /// Add a secondary index.
    ///
    /// With `backfill_on_define` set, values already stored are indexed as
    /// part of the definition. Returns the number of back-filled rows.
    pub fn define_index(&mut self, definition: IndexDefinition) -> SdkResult<usize> {
        if !self.config.backfill_on_define {
            self.index.define(definition)?;
            return Ok(0);
        }

        let field = definition.field().to_string();
        let mut existing = Vec::new();
        for (identity, fields) in self.register.iter() {
            let Some(location) = fields.get(&field) else {
                continue;
            };
            let Some(value) = self.stored_value(location)? else {
                continue;
            };
            existing.push((identity.to_string(), self.schema_of(identity)?, value));
        }
        let writes: Vec<FieldWrite<'_>> = existing
            .iter()
            .map(|(identity, schema, value)| FieldWrite {
                identity,
                schema: schema.as_deref(),
                field: &field,
                value,
            })
            .collect();
        Ok(self.index.define_with(definition, &writes)?)
    }

    // ---- Writes ----

    /// Store a value into a field, replacing any previous value.
    pub fn store(
        &mut self,
        identity: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> SdkResult<()> {
        let value = value.into();
        check_field(field)?;
        debug!(identity, field, ?value, "store");

        let encoded: Vec<_> = value
            .elements()
            .iter()
            .map(|element| (element.kind(), codec::encode(element)))
            .collect();
        for (_, bytes) in &encoded {
            self.chunks.check_fits(bytes.len())?;
        }

        let schema = if field == SCHEMA_FIELD {
            match &value {
                FieldValue::Scalar(s) => Some(scalar_text(s)),
                FieldValue::Multi(_) => {
                    return Err(StoreError::UnsupportedType(format!(
                        "{SCHEMA_FIELD} must be a single value"
                    ))
                    .into())
                }
            }
        } else {
            self.schema_of(identity)?
        };
        let rows = self.index.plan(&FieldWrite {
            identity,
            schema: schema.as_deref(),
            field,
            value: &value,
        })?;

        let mut pointers = Vec::with_capacity(encoded.len());
        for (kind, bytes) in &encoded {
            pointers.push(self.chunks.allocate(*kind, bytes)?);
        }
        self.index.commit(&rows)?;

        let location = match value {
            FieldValue::Scalar(_) => Location::Scalar(pointers[0]),
            FieldValue::Multi(_) => Location::Multi(pointers),
        };
        self.register.put(identity, field, location);
        Ok(())
    }

    /// Store a dynamically typed JSON value.
    ///
    /// Strings, 32-bit integers and arrays of those are accepted; anything
    /// else is rejected as an unsupported type before any state changes.
    pub fn store_json(
        &mut self,
        identity: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> SdkResult<()> {
        let value = codec::field_value_from_json(value)?;
        self.store(identity, field, value)
    }

    /// Make a field refer to another object. No bytes are allocated.
    ///
    /// The target need not exist yet; it is resolved on read.
    pub fn link(&mut self, identity: &str, field: &str, target: &str) -> SdkResult<()> {
        check_field(field)?;
        if field == SCHEMA_FIELD {
            return Err(SdkError::ReservedField(field.to_string()));
        }
        debug!(identity, field, target, "link");
        self.register
            .put(identity, field, Location::Reference(target.to_string()));
        Ok(())
    }

    /// Remove an object. Its chunk bytes and index rows are left in place.
    pub fn delete(&mut self, identity: &str) -> SdkResult<()> {
        debug!(identity, "delete");
        self.register.delete(identity)?;
        Ok(())
    }

    // ---- Reads ----

    /// Read every field of an object, following links.
    ///
    /// The result also carries the implicit [`ID_FIELD`].
    pub fn get(&self, identity: &str) -> SdkResult<Document> {
        debug!(identity, "get");
        self.resolve_object(identity, &mut Vec::new())
    }

    /// Read a single field, following a link if the field holds one.
    pub fn get_field(&self, identity: &str, field: &str) -> SdkResult<ResolvedValue> {
        debug!(identity, field, "get field");
        let location = self.register.get_field(identity, field)?;
        let mut path = vec![identity.to_string()];
        self.resolve_location(location, &mut path)
    }

    /// Current schema of an object, if it has one.
    pub fn schema_of(&self, identity: &str) -> SdkResult<Option<String>> {
        let has_schema = self
            .register
            .get(identity)
            .map(|fields| fields.contains_key(SCHEMA_FIELD))
            .unwrap_or(false);
        if !has_schema {
            return Ok(None);
        }
        Ok(self
            .index
            .value_for(identity, SCHEMA_FIELD)?
            .map(|s| scalar_text(&s)))
    }

    /// Identities of `schema` objects whose index `name` holds `value`.
    ///
    /// Unindexed fields yield an empty lookup.
    pub fn lookup(&self, schema: &str, name: &str, value: impl Into<Scalar>) -> SdkResult<Lookup> {
        Ok(self.index.lookup(Some(schema), name, &value.into())?)
    }

    /// Like [`lookup`](Self::lookup), against schema-independent indexes.
    pub fn lookup_any(&self, name: &str, value: impl Into<Scalar>) -> SdkResult<Lookup> {
        Ok(self.index.lookup(None, name, &value.into())?)
    }

    // ---- Resolution ----

    fn resolve_object(&self, identity: &str, path: &mut Vec<String>) -> SdkResult<Document> {
        if path.iter().any(|seen| seen == identity) || path.len() >= self.config.max_link_depth {
            let mut path = path.clone();
            path.push(identity.to_string());
            return Err(SdkError::CyclicReference { path });
        }
        let fields = self.register.get(identity)?;

        path.push(identity.to_string());
        let mut document = Document::new(identity);
        for (field, location) in fields {
            document.insert(field.clone(), self.resolve_location(location, path)?);
        }
        path.pop();
        Ok(document)
    }

    fn resolve_location(
        &self,
        location: &Location,
        path: &mut Vec<String>,
    ) -> SdkResult<ResolvedValue> {
        match location {
            Location::Scalar(pointer) => Ok(ResolvedValue::Scalar(self.read_scalar(pointer)?)),
            Location::Multi(pointers) => pointers
                .iter()
                .map(|p| self.read_scalar(p))
                .collect::<SdkResult<Vec<_>>>()
                .map(ResolvedValue::Multi),
            Location::Reference(target) => {
                self.resolve_object(target, path).map(ResolvedValue::Object)
            }
        }
    }

    fn read_scalar(&self, pointer: &Pointer) -> SdkResult<Scalar> {
        let bytes = self.chunks.read(pointer)?;
        Ok(codec::decode(pointer.kind, bytes)?)
    }

    /// Decode a stored location back into the value that was written.
    /// References have no stored value.
    fn stored_value(&self, location: &Location) -> SdkResult<Option<FieldValue>> {
        Ok(match location {
            Location::Scalar(p) => Some(FieldValue::Scalar(self.read_scalar(p)?)),
            Location::Multi(ps) => Some(FieldValue::Multi(
                ps.iter()
                    .map(|p| self.read_scalar(p))
                    .collect::<SdkResult<_>>()?,
            )),
            Location::Reference(_) => None,
        })
    }
}

impl std::fmt::Debug for AboutDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AboutDb")
            .field("objects", &self.register.len())
            .field("chunks", &self.chunks.len())
            .field("bytes_used", &self.chunks.bytes_used())
            .field("indexes", &self.index.definitions().len())
            .finish()
    }
}

fn check_field(field: &str) -> SdkResult<()> {
    if field == ID_FIELD {
        return Err(SdkError::ReservedField(field.to_string()));
    }
    Ok(())
}

fn scalar_text(value: &Scalar) -> String {
    match value {
        Scalar::Text(s) => s.clone(),
        Scalar::Integer(i) => i.to_string(),
    }
}

fn open_backend(kind: &BackendKind) -> SdkResult<Box<dyn IndexBackend>> {
    match kind {
        BackendKind::Memory => Ok(Box::new(InMemoryIndexBackend::new())),
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite { path } => {
            let backend = match path {
                Some(path) => aboutdb_index::SqliteIndexBackend::open(path)?,
                None => aboutdb_index::SqliteIndexBackend::open_in_memory()?,
            };
            Ok(Box::new(backend))
        }
        #[cfg(not(feature = "sqlite"))]
        BackendKind::Sqlite { .. } => Err(SdkError::Config(
            "sqlite index backend requires the `sqlite` feature".into(),
        )),
    }
}
