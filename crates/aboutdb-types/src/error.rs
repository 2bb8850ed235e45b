use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown scalar kind: {0}")]
    UnknownKind(String),

    #[error("cannot convert {value} to {expected}")]
    Conversion { value: String, expected: String },
}
