//! Bounded record buffer with a single splice primitive.
//!
//! Both container kinds store their records packed back to back in one
//! byte buffer. Every insert, removal and resize is the same operation:
//! replace a byte range with a range of a different length and shift the
//! tail to close or open the gap. [`RecordBuffer::splice`] does exactly that
//! and nothing else, so the archive and linker engines never touch offsets
//! of trailing records themselves.
//!
//! The buffer never reallocates. Its capacity is the length of the backing
//! storage, which may be an owned `Vec<u8>`, a borrowed `&mut [u8]`, or a
//! read-only `&[u8]` for inspection.

use std::fmt;

/// A length-tracked byte buffer over fixed-size backing storage.
#[derive(Clone)]
pub struct RecordBuffer<B> {
    storage: B,
    len: usize,
}

impl<B: AsRef<[u8]>> RecordBuffer<B> {
    /// Wrap `storage`, treating its first `len` bytes as meaningful.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the storage length.
    pub fn new(storage: B, len: usize) -> Self {
        let capacity = storage.as_ref().len();
        assert!(
            len <= capacity,
            "length {} exceeds buffer capacity {}",
            len,
            capacity
        );
        Self { storage, len }
    }

    /// Bytes currently in use.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no byte is in use.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total bytes available.
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().len()
    }

    /// Bytes still free after the used prefix.
    pub fn spare(&self) -> usize {
        self.capacity() - self.len
    }

    /// The used prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.as_ref()[..self.len]
    }

    /// The backing storage.
    pub fn storage(&self) -> &B {
        &self.storage
    }

    /// Release the backing storage.
    pub fn into_inner(self) -> B {
        self.storage
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> RecordBuffer<B> {
    /// The used prefix, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.storage.as_mut()[..self.len]
    }

    /// Replace `old_len` bytes at `at` with `new_len` bytes.
    ///
    /// Bytes after the replaced range move by the length difference before
    /// anything else happens, so the returned region can be filled without
    /// clobbering them. The region keeps whatever bytes it held before.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the used prefix or if the result
    /// would not fit the capacity.
    pub fn splice(&mut self, at: usize, old_len: usize, new_len: usize) -> &mut [u8] {
        let end = at
            .checked_add(old_len)
            .filter(|&end| end <= self.len)
            .unwrap_or_else(|| {
                panic!(
                    "splice range {}+{} outside used length {}",
                    at, old_len, self.len
                )
            });

        let capacity = self.capacity();
        let new_total = self.len - old_len + new_len;
        assert!(
            new_total <= capacity,
            "record of {} bytes does not fit: {} of {} bytes in use",
            new_len,
            self.len - old_len,
            capacity
        );

        let buf = self.storage.as_mut();
        if new_len != old_len {
            buf.copy_within(end..self.len, at + new_len);
        }
        self.len = new_total;
        &mut buf[at..at + new_len]
    }

    /// Open `len` bytes at the end of the used prefix.
    pub fn append(&mut self, len: usize) -> &mut [u8] {
        self.splice(self.len, 0, len)
    }

    /// Drop `len` bytes at `at`, closing the gap.
    pub fn remove(&mut self, at: usize, len: usize) {
        self.splice(at, len, 0);
    }

    /// Set the used length directly.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the capacity.
    pub fn set_len(&mut self, len: usize) {
        assert!(
            len <= self.capacity(),
            "length {} exceeds buffer capacity {}",
            len,
            self.capacity()
        );
        self.len = len;
    }
}

impl<B: AsRef<[u8]>> fmt::Debug for RecordBuffer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
