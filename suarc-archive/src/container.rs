//! Shared record-walking interface of archives and linkers.
//!
//! Both container kinds are a fixed header followed by self-sizing records.
//! [`Record`] parses one record at a byte position; [`Container`] builds
//! polling, iteration, lookup and counting on top of it, identically for
//! both kinds.

use crate::detect::Compression;
use std::marker::PhantomData;
use suarc_core::error::Result;
use tracing::warn;

/// One parsed record inside a container buffer.
pub trait Record<'a>: Sized {
    /// Parse the record starting at `position` in `bytes`.
    ///
    /// `bytes` is the used prefix of the container. The record must lie
    /// entirely inside it.
    fn parse(bytes: &'a [u8], position: usize) -> Result<Self>;

    /// Total bytes occupied by the record.
    fn record_size(&self) -> usize;

    /// Entry name without terminator or length prefix.
    fn name(&self) -> &'a [u8];

    /// Byte offset of the record from the container start.
    fn position(&self) -> usize;

    /// Raw record bytes.
    fn raw(&self) -> &'a [u8];
}

/// Byte-exact name comparison.
///
/// The first bytes are compared before the rest; most names in a container
/// already differ there.
pub fn names_match(name: &[u8], query: &[u8]) -> bool {
    name.len() == query.len()
        && name.first() == query.first()
        && name.get(1..) == query.get(1..)
}

/// Iterator over the records of a container.
///
/// Stops at the end of the used prefix, or at the first record that fails
/// to parse (logged at `warn`).
#[derive(Debug, Clone)]
pub struct Records<'a, R> {
    bytes: &'a [u8],
    position: usize,
    _record: PhantomData<R>,
}

impl<'a, R> Records<'a, R> {
    /// Walk `bytes` starting at `position`.
    pub fn new(bytes: &'a [u8], position: usize) -> Self {
        Self {
            bytes,
            position,
            _record: PhantomData,
        }
    }

    /// An iterator yielding nothing.
    pub fn empty() -> Self {
        Self::new(&[], 0)
    }
}

impl<'a, R: Record<'a>> Iterator for Records<'a, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        if self.position >= self.bytes.len() {
            return None;
        }

        match R::parse(self.bytes, self.position) {
            Ok(record) => {
                self.position += record.record_size();
                Some(record)
            }
            Err(e) => {
                warn!(position = self.position, "stopping at malformed record: {}", e);
                self.position = self.bytes.len();
                None
            }
        }
    }
}

/// Operations shared by [`Archive`](crate::Archive) and
/// [`Linker`](crate::Linker).
pub trait Container {
    /// Record view type.
    type Entry<'a>: Record<'a>
    where
        Self: 'a;

    /// The used prefix of the buffer.
    fn as_bytes(&self) -> &[u8];

    /// Offset of the first record, right after the header.
    fn first_record_offset(&self) -> usize;

    /// Compression state detected when the container was opened.
    fn compression(&self) -> Compression;

    /// Current poll position.
    fn cursor(&self) -> usize;

    /// Move the poll position.
    fn set_cursor(&mut self, cursor: usize);

    /// Walk records starting at `position`.
    fn records_from(&self, position: usize) -> Records<'_, Self::Entry<'_>> {
        Records::new(self.as_bytes(), position)
    }

    /// Iterate over all records without touching the poll cursor.
    ///
    /// Yields nothing for a container that is not plain.
    fn entries(&self) -> Records<'_, Self::Entry<'_>> {
        if self.compression().is_plain() {
            self.records_from(self.first_record_offset())
        } else {
            Records::empty()
        }
    }

    /// Return the record at the cursor and advance past it.
    ///
    /// At the end (or on a malformed record) this returns `None` and moves
    /// the cursor back to the first record, so the next call starts over.
    fn poll(&mut self) -> Option<Self::Entry<'_>> {
        let cursor = self.cursor();
        let next = if self.compression().is_plain() {
            self.records_from(cursor)
                .next()
                .map(|entry| cursor + entry.record_size())
        } else {
            None
        };

        match next {
            Some(next) => {
                self.set_cursor(next);
                self.records_from(cursor).next()
            }
            None => {
                self.rewind();
                None
            }
        }
    }

    /// Reset the poll cursor to the first record.
    fn rewind(&mut self) {
        let first = self.first_record_offset();
        self.set_cursor(first);
    }

    /// Find the first record named `name`.
    ///
    /// Names must match exactly: `b"abc"` does not find a record named
    /// `b"abcd"`, and the containers' `add` accepts both as distinct names.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    fn find(&self, name: &[u8]) -> Option<Self::Entry<'_>> {
        assert!(!name.is_empty(), "entry name must not be empty");
        self.entries().find(|entry| names_match(entry.name(), name))
    }

    /// Whether a record named `name` exists.
    fn contains(&self, name: &[u8]) -> bool {
        self.find(name).is_some()
    }

    /// Number of records.
    fn entry_count(&self) -> usize {
        self.entries().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match() {
        assert!(names_match(b"a", b"a"));
        assert!(names_match(b"chr_sonic.xno", b"chr_sonic.xno"));
        assert!(!names_match(b"chr_sonic.xno", b"chr_sonic.xn"));
        assert!(!names_match(b"abc", b"Abc"));
        assert!(!names_match(b"abc", b"abd"));
        assert!(!names_match(b"", b"a"));
    }
}
