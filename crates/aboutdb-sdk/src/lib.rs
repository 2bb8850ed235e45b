//! Embedded object store for AboutDB.
//!
//! [`AboutDb`] is the main entry point for applications embedding AboutDB.
//! It persists named fields of identified objects into append-only chunks,
//! resolves them back through the register, follows links between objects
//! and keeps secondary indexes current for value lookups.
//!
//! ```
//! use aboutdb_sdk::{AboutDb, IndexDefinition};
//!
//! let mut db = AboutDb::in_memory().unwrap();
//! db.define_index(IndexDefinition::for_schema("Entry", "tags")).unwrap();
//! db.store("A", "*schema", "Entry").unwrap();
//! db.store("A", "tags", vec!["a", "b"]).unwrap();
//!
//! let hits: Vec<String> = db.lookup("Entry", "tags", "b").unwrap().collect();
//! assert_eq!(hits, vec!["A"]);
//! assert_eq!(db.get("A").unwrap().id(), "A");
//! ```

pub mod config;
pub mod db;
pub mod error;

pub use config::{BackendKind, StoreConfig};
pub use db::AboutDb;
pub use error::{ErrorKind, SdkError, SdkResult};

// Re-export key types
pub use aboutdb_index::{IndexDefinition, IndexEngine, IndexRow, Lookup};
pub use aboutdb_types::{
    Document, FieldValue, Location, Pointer, ResolvedValue, Scalar, ScalarKind, ID_FIELD,
    SCHEMA_FIELD,
};
