use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ScalarKind;

/// Address of one encoded scalar inside the chunk set.
///
/// Pointers are only produced by the chunk allocator and never mutated; an
/// update to a field produces a fresh pointer that replaces the old one in the
/// register.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    /// Id of the chunk holding the bytes.
    pub chunk: usize,
    /// How the bytes decode.
    pub kind: ScalarKind,
    /// Byte offset within the chunk.
    pub offset: usize,
    /// Number of encoded bytes.
    pub length: usize,
}

impl Pointer {
    pub fn new(chunk: usize, kind: ScalarKind, offset: usize, length: usize) -> Self {
        Self {
            chunk,
            kind,
            offset,
            length,
        }
    }

    /// One past the last byte this pointer covers.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Pnt [{}:{}] {}:{}>",
            self.kind, self.length, self.chunk, self.offset
        )
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What the register records for one (identity, field) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// A single scalar stored in a chunk.
    Scalar(Pointer),
    /// An ordered list of scalars, one pointer per element.
    Multi(Vec<Pointer>),
    /// A link to another object, resolved by identity on read.
    Reference(String),
}

impl Location {
    /// The target identity, if this location is a reference.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Reference(target) => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_end() {
        let p = Pointer::new(0, ScalarKind::Text, 10, 5);
        assert_eq!(p.end(), 15);
    }

    #[test]
    fn pointer_debug_format() {
        let p = Pointer::new(1, ScalarKind::Integer, 8, 4);
        assert_eq!(format!("{p:?}"), "<Pnt [integer:4] 1:8>");
    }

    #[test]
    fn only_references_have_targets() {
        assert_eq!(Location::Reference("F1".into()).target(), Some("F1"));
        let p = Pointer::new(0, ScalarKind::Text, 0, 1);
        assert_eq!(Location::Scalar(p).target(), None);
        assert_eq!(Location::Multi(vec![p]).target(), None);
    }
}
