//! ARL name linker engine.
//!
//! A linker lists the entry names of a set of AR archives so a loader can
//! tell which archive holds a name without opening them all. Records are a
//! length byte followed by the name, with no terminator; the header keeps
//! one running byte total per archive for bookkeeping.

mod header;

pub use header::{LinkerHeader, PREFIX_SIZE, header_size};

use crate::ar::Archive;
use crate::buffer::RecordBuffer;
use crate::container::{Container, Record};
use crate::detect::{Compression, ContainerKind};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use suarc_core::Endian;
use suarc_core::error::{Result, SuArcError};
use tracing::{debug, trace, warn};

/// Longest name a linker record can hold.
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// A record inside a [`Linker`].
#[derive(Debug, Clone, Copy)]
pub struct ArlEntry<'a> {
    record: &'a [u8],
    position: usize,
}

impl<'a> ArlEntry<'a> {
    /// Name decoded as UTF-8, invalid sequences replaced.
    pub fn name_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(&self.record[1..])
    }
}

impl<'a> Record<'a> for ArlEntry<'a> {
    fn parse(bytes: &'a [u8], position: usize) -> Result<Self> {
        let len = *bytes
            .get(position)
            .ok_or_else(|| SuArcError::unexpected_eof(1))? as usize;
        let end = position + 1 + len;
        if end > bytes.len() {
            return Err(SuArcError::corrupted(
                position as u64,
                format!("name of {} bytes runs past the end", len),
            ));
        }

        Ok(Self {
            record: &bytes[position..end],
            position,
        })
    }

    fn record_size(&self) -> usize {
        self.record.len()
    }

    fn name(&self) -> &'a [u8] {
        &self.record[1..]
    }

    fn position(&self) -> usize {
        self.position
    }

    fn raw(&self) -> &'a [u8] {
        self.record
    }
}

/// An ARL name linker over backing storage `B`.
#[derive(Clone)]
pub struct Linker<B = Vec<u8>> {
    buf: RecordBuffer<B>,
    compression: Compression,
    cursor: usize,
    /// Header length, 0 unless plain.
    header_size: usize,
}

impl<B: AsRef<[u8]>> Linker<B> {
    /// Wrap a buffer holding exactly one linker.
    pub fn from_buffer(buf: B) -> Self {
        let len = buf.as_ref().len();
        Self::from_buffer_with_len(buf, len)
    }

    /// Wrap a buffer whose first `len` bytes hold a linker.
    ///
    /// An archive buffer, or a linker whose size table runs past `len`,
    /// yields [`Compression::Invalid`].
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the buffer length.
    pub fn from_buffer_with_len(buf: B, len: usize) -> Self {
        let buf = RecordBuffer::new(buf, len);
        let mut compression = Compression::detect(buf.as_bytes(), ContainerKind::Linker);

        let mut header_size = 0;
        if compression.is_plain() {
            match LinkerHeader::read(buf.as_bytes()) {
                Ok(header) => header_size = header.size(),
                Err(e) => {
                    warn!("unusable linker header: {}", e);
                    compression = Compression::Invalid;
                }
            }
        }

        trace!(len, capacity = buf.capacity(), %compression, "opened linker");
        Self {
            buf,
            compression,
            cursor: header_size,
            header_size,
        }
    }

    /// Bytes in use.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the linker holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total bytes available.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Header of a plain linker.
    pub fn header(&self) -> Option<LinkerHeader> {
        if !self.compression.is_plain() {
            return None;
        }
        LinkerHeader::read(self.buf.as_bytes()).ok()
    }

    /// Number of referenced archives, 0 unless plain.
    pub fn archive_count(&self) -> usize {
        (self.header_size.saturating_sub(PREFIX_SIZE)) / 4
    }

    /// Running byte total recorded for archive `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn archive_size(&self, index: usize) -> u32 {
        self.assert_archive_index(index);
        u32::from_le_bytes(self.size_slot(index))
    }

    /// All running byte totals.
    pub fn archive_sizes(&self) -> Vec<u32> {
        (0..self.archive_count())
            .map(|i| u32::from_le_bytes(self.size_slot(i)))
            .collect()
    }

    /// Release the backing storage.
    pub fn into_inner(self) -> B {
        self.buf.into_inner()
    }

    /// Check the header and that every record lies inside the used bytes.
    pub fn validate(&self) -> Result<()> {
        if !self.compression.is_plain() {
            return Err(SuArcError::unsupported_compression(
                self.compression.to_string(),
            ));
        }

        let bytes = self.buf.as_bytes();
        LinkerHeader::read(bytes)?;
        let mut position = self.header_size;
        while position < bytes.len() {
            position += ArlEntry::parse(bytes, position)?.record_size();
        }
        Ok(())
    }

    /// Size of the plain linker once decompressed.
    pub fn decompressed_size(&self) -> Result<usize> {
        self.compression.decompressed_size(self.buf.as_bytes())
    }

    /// Decompress into `out`, returning a plain linker over it.
    ///
    /// # Panics
    ///
    /// Panics if `out` is smaller than [`decompressed_size`].
    ///
    /// [`decompressed_size`]: Linker::decompressed_size
    pub fn decompress_into<'o>(&self, out: &'o mut [u8]) -> Result<Linker<&'o mut [u8]>> {
        let size = self.decompressed_size()?;
        assert!(
            out.len() >= size,
            "output buffer of {} bytes is smaller than the decompressed size {}",
            out.len(),
            size
        );

        let written = self.compression.decompress(self.buf.as_bytes(), out)?;
        debug!(compression = %self.compression, size, written, "decompressed linker");
        Ok(Linker::from_buffer_with_len(out, written))
    }

    /// Decompress into a fresh owned buffer, releasing this one.
    pub fn into_decompressed(self) -> Result<Linker<Vec<u8>>> {
        if self.compression.is_plain() {
            let len = self.len();
            let storage = self.buf.storage().as_ref().to_vec();
            return Ok(Linker::from_buffer_with_len(storage, len));
        }

        let size = self.decompressed_size()?;
        let mut out = vec![0u8; size];
        let written = self.compression.decompress(self.buf.as_bytes(), &mut out)?;
        debug!(compression = %self.compression, size, written, "decompressed linker");
        Ok(Linker::from_buffer_with_len(out, written))
    }

    fn size_slot(&self, index: usize) -> [u8; 4] {
        let at = PREFIX_SIZE + 4 * index;
        let mut slot = [0u8; 4];
        slot.copy_from_slice(&self.buf.as_bytes()[at..at + 4]);
        slot
    }

    fn assert_archive_index(&self, index: usize) {
        assert!(
            index < self.archive_count(),
            "archive index {} out of range for {} archives",
            index,
            self.archive_count()
        );
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Linker<B> {
    /// Start an empty linker for `archive_count` archives in `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `archive_count` is 0 or `buf` cannot hold the header.
    pub fn create(buf: B, archive_count: usize) -> Self {
        assert!(archive_count > 0, "a linker must reference at least one archive");
        let header = LinkerHeader::new(archive_count);
        let capacity = buf.as_ref().len();
        assert!(
            capacity >= header.size(),
            "capacity {} is smaller than the {}-byte linker header",
            capacity,
            header.size()
        );

        let mut buf = RecordBuffer::new(buf, 0);
        header.write(buf.append(header.size()));
        Self {
            buf,
            compression: Compression::Plain,
            cursor: header.size(),
            header_size: header.size(),
        }
    }

    /// Build a linker listing every entry of `archives`, in order.
    ///
    /// Archive `i` gets size slot `i`, holding its byte length.
    ///
    /// # Panics
    ///
    /// Panics if `archives` is empty or the records do not fit `out`.
    pub fn from_archives<A: AsRef<[u8]>>(archives: &[&Archive<A>], out: B) -> Result<Self> {
        let mut linker = Self::create(out, archives.len());
        for (index, archive) in archives.iter().enumerate() {
            linker.set_archive_size(index, archive.len() as u32);
            for entry in archive.entries() {
                linker.push_record(entry.name())?;
            }
        }

        debug!(
            archives = archives.len(),
            entries = linker.entry_count(),
            len = linker.len(),
            "built linker from archives"
        );
        Ok(linker)
    }

    /// Append `name` as belonging to archive `archive_index`.
    ///
    /// The archive's running total grows by the record size. Fails with
    /// `EntryExists` if the name is already listed, or `InvalidName` if it
    /// is longer than 255 bytes.
    ///
    /// # Panics
    ///
    /// Panics if `archive_index` is out of range, `name` is empty, or the
    /// record does not fit the capacity.
    pub fn add(&mut self, name: &[u8], archive_index: usize) -> Result<()> {
        self.assert_mutable();
        self.assert_archive_index(archive_index);
        if self.find(name).is_some() {
            return Err(SuArcError::entry_exists(name));
        }

        let size = self.push_record(name)?;
        self.adjust_archive_size(archive_index, size as i64);
        Ok(())
    }

    /// Remove `name`, deducting its record from archive `archive_index`.
    pub fn remove(&mut self, name: &[u8], archive_index: usize) -> Result<()> {
        self.assert_mutable();
        self.assert_archive_index(archive_index);
        let (position, size) = match self.find(name) {
            Some(entry) => (entry.position(), entry.record_size()),
            None => return Err(SuArcError::entry_not_found(name)),
        };

        self.buf.remove(position, size);
        self.shift_cursor(position, size, 0);
        self.adjust_archive_size(archive_index, -(size as i64));

        trace!(name = %String::from_utf8_lossy(name), position, "removed linker entry");
        Ok(())
    }

    /// Rename `name` to `new_name` in place.
    ///
    /// Archive `archive_index`'s running total moves by the size
    /// difference. Fails with `EntryNotFound` if `name` is not listed, or
    /// `EntryExists` if `new_name` already is.
    pub fn update(&mut self, name: &[u8], new_name: &[u8], archive_index: usize) -> Result<()> {
        self.assert_mutable();
        self.assert_archive_index(archive_index);
        check_name(new_name)?;

        let (position, old_size) = match self.find(name) {
            Some(entry) => (entry.position(), entry.record_size()),
            None => return Err(SuArcError::entry_not_found(name)),
        };
        if name != new_name && self.find(new_name).is_some() {
            return Err(SuArcError::entry_exists(new_name));
        }

        let size = 1 + new_name.len();
        write_record(self.buf.splice(position, old_size, size), new_name);
        self.shift_cursor(position, old_size, size);
        self.adjust_archive_size(archive_index, size as i64 - old_size as i64);

        trace!(
            name = %String::from_utf8_lossy(name),
            new_name = %String::from_utf8_lossy(new_name),
            position,
            "renamed linker entry"
        );
        Ok(())
    }

    /// Append a record without duplicate check or size bookkeeping.
    pub(crate) fn push_record(&mut self, name: &[u8]) -> Result<usize> {
        check_name(name)?;
        let size = 1 + name.len();
        write_record(self.buf.append(size), name);
        Ok(size)
    }

    /// Append an already encoded record verbatim.
    pub(crate) fn push_raw(&mut self, record: &[u8]) {
        self.buf.append(record.len()).copy_from_slice(record);
    }

    /// Overwrite the running total of archive `index`.
    pub(crate) fn set_archive_size(&mut self, index: usize, size: u32) {
        self.assert_archive_index(index);
        Endian::Little.write_u32(self.buf.as_bytes_mut(), PREFIX_SIZE + 4 * index, size);
    }

    fn adjust_archive_size(&mut self, index: usize, delta: i64) {
        let current = u32::from_le_bytes(self.size_slot(index)) as i64;
        let updated = (current + delta).clamp(0, u32::MAX as i64) as u32;
        self.set_archive_size(index, updated);
    }

    fn assert_mutable(&self) {
        assert!(
            self.compression.is_plain(),
            "cannot modify a {} linker; decompress it first",
            self.compression
        );
    }

    fn shift_cursor(&mut self, position: usize, old_size: usize, new_size: usize) {
        if self.cursor > position {
            self.cursor = self.cursor - old_size + new_size;
        }
    }
}

impl Linker<Vec<u8>> {
    /// Start an empty owned linker of `capacity` bytes.
    pub fn with_capacity(capacity: usize, archive_count: usize) -> Self {
        Self::create(vec![0; capacity], archive_count)
    }

    /// Read a whole linker file; capacity equals its length.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_headroom(path, 0)
    }

    /// Read a whole linker file, reserving `extra` spare bytes.
    pub fn open_with_headroom(path: impl AsRef<Path>, extra: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut data = std::fs::read(path)?;
        let len = data.len();
        data.resize(len + extra, 0);

        debug!(path = %path.display(), len, extra, "loaded linker");
        Ok(Self::from_buffer_with_len(data, len))
    }
}

impl<B: AsRef<[u8]>> Container for Linker<B> {
    type Entry<'a>
        = ArlEntry<'a>
    where
        Self: 'a;

    fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    fn first_record_offset(&self) -> usize {
        self.header_size
    }

    fn compression(&self) -> Compression {
        self.compression
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }
}

impl<B: AsRef<[u8]>> fmt::Debug for Linker<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linker")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("compression", &self.compression)
            .field("archive_count", &self.archive_count())
            .field("cursor", &self.cursor)
            .finish()
    }
}

fn check_name(name: &[u8]) -> Result<()> {
    assert!(!name.is_empty(), "entry name must not be empty");
    if name.len() > MAX_NAME_LEN {
        return Err(SuArcError::invalid_name(
            name,
            format!("linker names are limited to {} bytes", MAX_NAME_LEN),
        ));
    }
    Ok(())
}

fn write_record(record: &mut [u8], name: &[u8]) {
    record[0] = name.len() as u8;
    record[1..].copy_from_slice(name);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Linker {
        let mut arl = Linker::with_capacity(256, 1);
        arl.add(b"Name", 0).unwrap();
        arl.add(b"some_file.xml", 0).unwrap();
        arl.add(b"old.txt", 0).unwrap();
        arl
    }

    fn names(arl: &Linker) -> Vec<String> {
        arl.entries().map(|e| e.name_str().into_owned()).collect()
    }

    #[test]
    fn test_create_header() {
        let arl = Linker::with_capacity(64, 3);
        assert_eq!(arl.len(), header_size(3));
        assert_eq!(arl.len(), 20);
        assert_eq!(&arl.as_bytes()[..4], b"ARL2");
        assert_eq!(arl.archive_count(), 3);
        assert_eq!(arl.archive_sizes(), vec![0, 0, 0]);
    }

    #[test]
    fn test_add_bumps_archive_size() {
        let arl = sample();
        assert_eq!(names(&arl), ["Name", "some_file.xml", "old.txt"]);
        assert_eq!(arl.archive_size(0), 5 + 14 + 8);
        assert_eq!(arl.len(), header_size(1) + 5 + 14 + 8);
        arl.validate().unwrap();
    }

    #[test]
    fn test_remove_and_update() {
        let mut arl = sample();
        arl.remove(b"some_file.xml", 0).unwrap();
        arl.update(b"old.txt", b"new_file.txt", 0).unwrap();

        assert_eq!(names(&arl), ["Name", "new_file.txt"]);
        assert_eq!(arl.archive_size(0), 5 + 13);
        assert!(arl.find(b"old.txt").is_none());
        assert_eq!(arl.find(b"new_file.txt").unwrap().record_size(), 13);
    }

    #[test]
    fn test_update_rejects_existing_target() {
        let mut arl = sample();
        let before = arl.as_bytes().to_vec();
        assert!(matches!(
            arl.update(b"old.txt", b"Name", 0),
            Err(SuArcError::EntryExists { .. })
        ));
        assert_eq!(arl.as_bytes(), &before[..]);
    }

    #[test]
    fn test_prefix_does_not_match() {
        let arl = sample();
        assert!(arl.find(b"Nam").is_none());
        assert!(arl.find(b"Names").is_none());
        assert!(arl.find(b"Name").is_some());
    }

    #[test]
    fn test_long_name_rejected() {
        let mut arl = Linker::with_capacity(1024, 1);
        let long = vec![b'x'; 256];
        assert!(matches!(
            arl.add(&long, 0),
            Err(SuArcError::InvalidName { .. })
        ));
        arl.add(&long[..255], 0).unwrap();
    }

    #[test]
    #[should_panic(expected = "archive index 1 out of range")]
    fn test_archive_index_out_of_range() {
        let mut arl = Linker::with_capacity(64, 1);
        let _ = arl.add(b"x", 1);
    }

    #[test]
    fn test_archive_buffer_is_invalid() {
        let ar = Archive::with_capacity(64);
        let arl = Linker::from_buffer(ar.as_bytes());
        assert_eq!(arl.compression(), Compression::Invalid);
        assert_eq!(arl.archive_count(), 0);
        assert_eq!(arl.entry_count(), 0);
    }

    #[test]
    fn test_truncated_table_is_invalid() {
        let mut bytes = b"ARL2".to_vec();
        bytes.extend_from_slice(&[9, 0, 0, 0]);
        let arl = Linker::from_buffer(bytes);
        assert_eq!(arl.compression(), Compression::Invalid);
    }

    #[test]
    fn test_from_archives() {
        let mut a = Archive::with_capacity(256);
        a.add(b"stage.set.xml", b"<set/>").unwrap();
        a.add(b"sonic.xno", &[1, 2, 3]).unwrap();
        let mut b = Archive::with_capacity(256);
        b.add(b"ring.xno", &[4]).unwrap();

        let arl = Linker::from_archives(&[&a, &b], vec![0u8; 128]).unwrap();
        assert_eq!(arl.archive_sizes(), vec![a.len() as u32, b.len() as u32]);
        assert_eq!(
            names(&Linker::from_buffer_with_len(arl.as_bytes().to_vec(), arl.len())),
            ["stage.set.xml", "sonic.xno", "ring.xno"]
        );
    }

    #[test]
    fn test_poll_cycles() {
        let mut arl = sample();
        let mut seen = 0;
        while arl.poll().is_some() {
            seen += 1;
        }
        assert_eq!(seen, 3);
        assert_eq!(arl.poll().unwrap().name(), b"Name");
    }
}
