//! Error types for the index crate.

use aboutdb_types::ScalarKind;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Another definition already owns the derived table name or the
    /// (schema, name) pair.
    #[error("duplicate index: {0}")]
    DuplicateIndex(String),

    /// The definition's names reduce to an empty table name.
    #[error("invalid index name: {0:?}")]
    InvalidIndexName(String),

    /// A value could not be converted to the index's value type.
    #[error("index {index} expects {expected} values, got {value}")]
    IndexValueTypeMismatch {
        index: String,
        expected: ScalarKind,
        value: String,
    },

    /// A row referenced a table the backend does not hold.
    #[error("unknown index table: {0}")]
    UnknownTable(String),

    /// The backing store failed.
    #[error("index backend error: {0}")]
    Backend(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
