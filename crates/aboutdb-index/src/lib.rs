//! Secondary indexes for AboutDB.
//!
//! An [`IndexDefinition`] derives a typed value table from one field of the
//! objects of a schema (or of every object, for schema-independent
//! definitions). The [`IndexEngine`] owns the definitions and the backing
//! store that holds their tables, appends rows as fields are written and
//! answers value lookups without touching primary storage.
//!
//! # Key Types
//!
//! - [`IndexDefinition`] -- (schema, name, source field, extractor, value type)
//! - [`IndexEngine`] -- dispatches writes and lookups to definitions
//! - [`IndexBackend`] -- table storage seam
//! - [`InMemoryIndexBackend`] -- `Vec`-backed tables for tests and embedding
//! - `SqliteIndexBackend` -- relational tables via SQLite (feature `sqlite`)

pub mod backend;
pub mod definition;
pub mod engine;
pub mod error;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::{IndexBackend, IndexRow, RowInsert};
pub use definition::{Extractor, IndexDefinition};
pub use engine::{FieldWrite, IndexEngine, Lookup};
pub use error::{IndexError, IndexResult};
pub use memory::InMemoryIndexBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIndexBackend;
