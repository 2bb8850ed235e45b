use aboutdb_index::IndexError;
use aboutdb_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Link resolution revisited an object or exceeded the depth limit.
    #[error("cyclic reference: {}", path.join(" -> "))]
    CyclicReference { path: Vec<String> },

    #[error("field {0:?} is reserved")]
    ReservedField(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SdkResult<T> = Result<T, SdkError>;

/// Failure category, independent of the layer that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedType,
    ValueTooLarge,
    CorruptPointer,
    NotFound,
    DuplicateIndex,
    InvalidIndexName,
    IndexValueTypeMismatch,
    CyclicReference,
    ReservedField,
    Backend,
    Config,
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => match e {
                StoreError::UnsupportedType(_) => ErrorKind::UnsupportedType,
                StoreError::ValueTooLarge { .. } => ErrorKind::ValueTooLarge,
                StoreError::CorruptPointer { .. } => ErrorKind::CorruptPointer,
                StoreError::NotFound(_) | StoreError::FieldNotFound { .. } => ErrorKind::NotFound,
            },
            Self::Index(e) => match e {
                IndexError::DuplicateIndex(_) => ErrorKind::DuplicateIndex,
                IndexError::InvalidIndexName(_) => ErrorKind::InvalidIndexName,
                IndexError::IndexValueTypeMismatch { .. } => ErrorKind::IndexValueTypeMismatch,
                IndexError::UnknownTable(_) | IndexError::Backend(_) => ErrorKind::Backend,
            },
            Self::CyclicReference { .. } => ErrorKind::CyclicReference,
            Self::ReservedField(_) => ErrorKind::ReservedField,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}
