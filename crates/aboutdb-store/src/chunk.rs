//! Append-only chunk arena.
//!
//! A [`ChunkSet`] starts with one chunk and appends a fresh chunk of the same
//! capacity whenever the current one cannot hold the next value. Chunks are
//! addressed by their position in the set.

use aboutdb_types::{Pointer, ScalarKind};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Default chunk capacity in bytes (128 KiB).
pub const DEFAULT_CHUNK_CAPACITY: usize = 2 << 16;

/// A fixed-capacity byte arena with a monotonically increasing write cursor.
pub struct Chunk {
    id: usize,
    data: Vec<u8>,
    cursor: usize,
}

impl Chunk {
    fn new(id: usize, capacity: usize) -> Self {
        Self {
            id,
            data: vec![0u8; capacity],
            cursor: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes written so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes still available for appending.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    fn append(&mut self, bytes: &[u8]) -> usize {
        let start = self.cursor;
        let end = start + bytes.len();
        self.data[start..end].copy_from_slice(bytes);
        self.cursor = end;
        start
    }

    fn slice(&self, offset: usize, length: usize) -> Option<&[u8]> {
        let end = offset.checked_add(length)?;
        if end > self.cursor {
            return None;
        }
        Some(&self.data[offset..end])
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Growable, append-only collection of equally sized chunks.
#[derive(Debug)]
pub struct ChunkSet {
    chunks: Vec<Chunk>,
    capacity: usize,
}

impl ChunkSet {
    /// Create a set holding one empty chunk of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            chunks: vec![Chunk::new(0, capacity)],
            capacity,
        }
    }

    /// Capacity of every chunk in the set.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of chunks allocated so far. Never zero.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Total bytes appended across all chunks, live or not.
    pub fn bytes_used(&self) -> usize {
        self.chunks.iter().map(Chunk::cursor).sum()
    }

    /// Check that a value of `len` bytes can ever be stored.
    pub fn check_fits(&self, len: usize) -> StoreResult<()> {
        if len > self.capacity {
            return Err(StoreError::ValueTooLarge {
                len,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Append `bytes` and return a pointer to them.
    ///
    /// Writes into the current chunk when it has room, otherwise opens a new
    /// chunk first. A value longer than one chunk's capacity is
    /// [`StoreError::ValueTooLarge`].
    pub fn allocate(&mut self, kind: ScalarKind, bytes: &[u8]) -> StoreResult<Pointer> {
        self.check_fits(bytes.len())?;

        let mut current = self.chunks.len() - 1;
        if self.chunks[current].remaining() < bytes.len() {
            current = self.chunks.len();
            warn!(chunk = current, capacity = self.capacity, "chunk full, opening new chunk");
            self.chunks.push(Chunk::new(current, self.capacity));
        }

        let chunk = &mut self.chunks[current];
        let offset = chunk.append(bytes);
        let pointer = Pointer::new(chunk.id(), kind, offset, bytes.len());
        debug!(%pointer, "allocated");
        Ok(pointer)
    }

    /// Read exactly the bytes a pointer covers.
    pub fn read(&self, pointer: &Pointer) -> StoreResult<&[u8]> {
        let chunk = self
            .chunks
            .get(pointer.chunk)
            .ok_or_else(|| StoreError::CorruptPointer {
                pointer: *pointer,
                reason: format!("chunk {} does not exist", pointer.chunk),
            })?;
        chunk
            .slice(pointer.offset, pointer.length)
            .ok_or_else(|| StoreError::CorruptPointer {
                pointer: *pointer,
                reason: format!(
                    "range {}..{} outside written region of {} bytes",
                    pointer.offset,
                    pointer.end(),
                    chunk.cursor()
                ),
            })
    }
}

impl Default for ChunkSet {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_CAPACITY)
    }
}
