//! Primary storage for AboutDB.
//!
//! Field values live as encoded bytes in fixed-capacity, append-only chunks.
//! The register maps each (identity, field) pair to the [`Location`] of those
//! bytes, or to another identity when the field is a link.
//!
//! # Components
//!
//! - [`codec`] -- scalar to bytes and back
//! - [`ChunkSet`] -- growable set of fixed-capacity byte arenas
//! - [`Register`] -- identity -> field -> location indirection table
//!
//! # Design Rules
//!
//! 1. Bytes are only ever appended; a chunk's cursor never moves backwards.
//! 2. Overwritten values stay allocated but unreferenced. Reclamation is not
//!    performed here.
//! 3. Pointers are produced only by [`ChunkSet::allocate`]; a pointer that
//!    does not fit its chunk is reported as [`StoreError::CorruptPointer`].
//!
//! [`Location`]: aboutdb_types::Location

pub mod chunk;
pub mod codec;
pub mod error;
pub mod register;

pub use chunk::{Chunk, ChunkSet, DEFAULT_CHUNK_CAPACITY};
pub use error::{StoreError, StoreResult};
pub use register::{FieldMap, Register};
