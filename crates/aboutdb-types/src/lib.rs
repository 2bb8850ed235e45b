//! Foundation types for AboutDB.
//!
//! Every other AboutDB crate depends on `aboutdb-types`. The types here
//! describe values as the caller sees them and locations as the register
//! records them; no crate-level behavior lives here.
//!
//! # Key Types
//!
//! - [`Scalar`] / [`ScalarKind`] -- a single text or integer value and its type tag
//! - [`FieldValue`] -- what a caller writes: one scalar or an ordered list of them
//! - [`Pointer`] -- (chunk, kind, offset, length) address of encoded bytes
//! - [`Location`] -- what the register holds per field: pointer(s) or a reference
//! - [`ResolvedValue`] / [`Document`] -- what a read returns

pub mod error;
pub mod location;
pub mod value;

pub use error::TypeError;
pub use location::{Location, Pointer};
pub use value::{Document, FieldValue, ResolvedValue, Scalar, ScalarKind, ID_FIELD, SCHEMA_FIELD};
