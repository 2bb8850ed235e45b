use aboutdb_types::Pointer;

/// Errors from primary storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The codec cannot encode or decode the value.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The encoded value is larger than a whole chunk.
    #[error("value of {len} bytes exceeds chunk capacity of {capacity} bytes")]
    ValueTooLarge { len: usize, capacity: usize },

    /// A pointer references bytes outside its chunk.
    #[error("corrupt pointer {pointer}: {reason}")]
    CorruptPointer { pointer: Pointer, reason: String },

    /// The identity has no register entries.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The identity exists but has no such field.
    #[error("field not found: {identity}::{field}")]
    FieldNotFound { identity: String, field: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
