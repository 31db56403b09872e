//! AR data archive engine.
//!
//! An AR container is a 16-byte [`ArchiveHeader`] followed by entry records
//! packed back to back. Each record carries its own size, so there is no
//! index: lookup walks the records, and every mutation splices the packed
//! buffer in place through [`RecordBuffer`].
//!
//! ## Example
//!
//! ```rust
//! use suarc_archive::{Archive, Container};
//!
//! let mut ar = Archive::with_capacity(256);
//! ar.add(b"resolution.set.xml", b"<width>640</width>").unwrap();
//! ar.add(b"message.txt", b"Labas, pasauli!").unwrap();
//! ar.update(b"message.txt", b"Hello, world!").unwrap();
//!
//! let entry = ar.find(b"message.txt").unwrap();
//! assert_eq!(entry.data(), b"Hello, world!");
//!
//! while let Some(entry) = ar.poll() {
//!     println!("{}: {} bytes", entry.name_str(), entry.data_size());
//! }
//! ```

mod header;

pub use header::{ArchiveHeader, DEFAULT_ALIGNMENT, ENTRY_HEADER_SIZE, EntryHeader, HEADER_SIZE};

use crate::buffer::RecordBuffer;
use crate::container::{Container, Record};
use crate::detect::{Compression, ContainerKind};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use suarc_core::error::{Result, SuArcError};
use tracing::{debug, trace, warn};

/// Layout options for records written by an [`Archive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Alignment value stored in the header of fresh archives.
    pub alignment: u32,
    /// Pad names so payloads start on an `alignment` boundary, measured
    /// from the container start.
    ///
    /// Padding is computed when a record is written; later removals in
    /// front of it shift it off the boundary.
    pub align_payloads: bool,
}

impl ArchiveOptions {
    /// Alignment 64 recorded in the header, payloads packed tightly.
    pub const DEFAULT: Self = Self {
        alignment: DEFAULT_ALIGNMENT,
        align_payloads: false,
    };

    /// Alignment 64 recorded in the header and applied to payloads.
    pub const ALIGNED: Self = Self {
        alignment: DEFAULT_ALIGNMENT,
        align_payloads: true,
    };

    /// Set the alignment value.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is 0.
    pub fn with_alignment(mut self, alignment: u32) -> Self {
        assert!(alignment > 0, "alignment must be at least 1");
        self.alignment = alignment;
        self
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Size of an unpadded record for a name and payload of the given lengths.
pub const fn record_size(name_len: usize, data_len: usize) -> usize {
    ENTRY_HEADER_SIZE + name_len + 1 + data_len
}

/// A record inside an [`Archive`].
#[derive(Debug, Clone, Copy)]
pub struct ArEntry<'a> {
    header: EntryHeader,
    record: &'a [u8],
    name: &'a [u8],
    position: usize,
}

impl<'a> ArEntry<'a> {
    /// Parsed fixed header.
    pub fn header(&self) -> &EntryHeader {
        &self.header
    }

    /// Total record size.
    pub fn size(&self) -> usize {
        self.header.size as usize
    }

    /// Payload size.
    pub fn data_size(&self) -> usize {
        self.header.data_size as usize
    }

    /// Offset from the record start to the payload.
    pub fn data_offset(&self) -> usize {
        self.header.data_offset as usize
    }

    /// Opaque file date.
    pub fn filedate(&self) -> u64 {
        self.header.filedate
    }

    /// Name decoded as UTF-8, invalid sequences replaced.
    pub fn name_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }

    /// Payload bytes.
    pub fn data(&self) -> &'a [u8] {
        let offset = self.data_offset();
        &self.record[offset..offset + self.data_size()]
    }
}

impl<'a> Record<'a> for ArEntry<'a> {
    fn parse(bytes: &'a [u8], position: usize) -> Result<Self> {
        let header = EntryHeader::read(bytes, position)?;
        header.check_bounds(position, bytes.len() - position)?;

        let record = &bytes[position..position + header.size as usize];
        let name_area = &record[ENTRY_HEADER_SIZE..header.data_offset as usize];
        let name_len = name_area.iter().position(|&b| b == 0).ok_or_else(|| {
            SuArcError::corrupted(position as u64, "entry name is not NUL-terminated")
        })?;

        Ok(Self {
            header,
            record,
            name: &name_area[..name_len],
            position,
        })
    }

    fn record_size(&self) -> usize {
        self.size()
    }

    fn name(&self) -> &'a [u8] {
        self.name
    }

    fn position(&self) -> usize {
        self.position
    }

    fn raw(&self) -> &'a [u8] {
        self.record
    }
}

/// An AR data archive over backing storage `B`.
///
/// `B` is `Vec<u8>` for owned archives, `&mut [u8]` for archives written
/// into a caller buffer, or `&[u8]` for read-only views. The capacity is
/// the storage length; the archive never reallocates.
#[derive(Clone)]
pub struct Archive<B = Vec<u8>> {
    buf: RecordBuffer<B>,
    compression: Compression,
    cursor: usize,
    options: ArchiveOptions,
}

impl<B: AsRef<[u8]>> Archive<B> {
    /// Wrap a buffer holding exactly one archive.
    pub fn from_buffer(buf: B) -> Self {
        let len = buf.as_ref().len();
        Self::from_buffer_with_len(buf, len)
    }

    /// Wrap a buffer whose first `len` bytes hold an archive; the rest is
    /// spare capacity for additions.
    ///
    /// The compression state is detected from the magic. A linker buffer,
    /// or one shorter than the archive header, yields
    /// [`Compression::Invalid`].
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the buffer length.
    pub fn from_buffer_with_len(buf: B, len: usize) -> Self {
        let buf = RecordBuffer::new(buf, len);
        let compression = Compression::detect(buf.as_bytes(), ContainerKind::Archive);

        let mut options = ArchiveOptions::DEFAULT;
        if compression.is_plain() {
            if let Ok(header) = ArchiveHeader::read(buf.as_bytes()) {
                options.alignment = header.alignment.max(1);
            }
        }

        trace!(len, capacity = buf.capacity(), %compression, "opened archive");
        Self {
            buf,
            compression,
            cursor: HEADER_SIZE,
            options,
        }
    }

    /// Replace the layout options used for later writes.
    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Layout options.
    pub fn options(&self) -> ArchiveOptions {
        self.options
    }

    /// Bytes in use.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the archive holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total bytes available.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Header of a plain archive.
    pub fn header(&self) -> Option<ArchiveHeader> {
        if !self.compression.is_plain() {
            return None;
        }
        ArchiveHeader::read(self.buf.as_bytes()).ok()
    }

    /// Release the backing storage.
    pub fn into_inner(self) -> B {
        self.buf.into_inner()
    }

    /// Check the header and every record.
    ///
    /// Each record must lie inside the used bytes and be exactly its
    /// header, name, terminator, padding and payload.
    pub fn validate(&self) -> Result<()> {
        if !self.compression.is_plain() {
            return Err(SuArcError::unsupported_compression(
                self.compression.to_string(),
            ));
        }

        let bytes = self.buf.as_bytes();
        let header = ArchiveHeader::read(bytes)?;
        if header.header_size as usize != HEADER_SIZE
            || header.entry_size as usize != ENTRY_HEADER_SIZE
        {
            return Err(SuArcError::invalid_header(format!(
                "unexpected header/entry sizes {}/{}",
                header.header_size, header.entry_size
            )));
        }

        let mut position = HEADER_SIZE;
        while position < bytes.len() {
            let entry = ArEntry::parse(bytes, position)?;
            if entry.data_offset() + entry.data_size() != entry.size() {
                return Err(SuArcError::corrupted(
                    position as u64,
                    format!(
                        "record size {} does not match payload {}+{}",
                        entry.size(),
                        entry.data_offset(),
                        entry.data_size()
                    ),
                ));
            }
            position += entry.size();
        }
        Ok(())
    }

    /// Size of the plain archive once decompressed.
    pub fn decompressed_size(&self) -> Result<usize> {
        self.compression.decompressed_size(self.buf.as_bytes())
    }

    /// Decompress into `out`, returning a plain archive over it.
    ///
    /// A plain archive is copied as is. This archive is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if `out` is smaller than [`decompressed_size`].
    ///
    /// [`decompressed_size`]: Archive::decompressed_size
    pub fn decompress_into<'o>(&self, out: &'o mut [u8]) -> Result<Archive<&'o mut [u8]>> {
        let size = self.decompressed_size()?;
        assert!(
            out.len() >= size,
            "output buffer of {} bytes is smaller than the decompressed size {}",
            out.len(),
            size
        );

        let written = self.compression.decompress(self.buf.as_bytes(), out)?;
        self.log_decompressed(size, written);
        Ok(Archive::from_buffer_with_len(out, written))
    }

    /// Decompress into a fresh owned buffer, releasing this one.
    pub fn into_decompressed(self) -> Result<Archive<Vec<u8>>> {
        if self.compression.is_plain() {
            let len = self.len();
            let storage = self.buf.storage().as_ref().to_vec();
            return Ok(Archive::from_buffer_with_len(storage, len).with_options(self.options));
        }

        let size = self.decompressed_size()?;
        let mut out = vec![0u8; size];
        let written = self.compression.decompress(self.buf.as_bytes(), &mut out)?;
        self.log_decompressed(size, written);
        Ok(Archive::from_buffer_with_len(out, written))
    }

    fn log_decompressed(&self, size: usize, written: usize) {
        if written < size {
            warn!(
                compression = %self.compression,
                size,
                written,
                "archive decompressed only partially"
            );
        } else {
            debug!(compression = %self.compression, size, "decompressed archive");
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Archive<B> {
    /// Start an empty archive in `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than the 16-byte header.
    pub fn create(buf: B) -> Self {
        Self::create_with_options(buf, ArchiveOptions::DEFAULT)
    }

    /// Start an empty archive in `buf` with the given layout options.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than the 16-byte header.
    pub fn create_with_options(buf: B, options: ArchiveOptions) -> Self {
        let capacity = buf.as_ref().len();
        assert!(
            capacity >= HEADER_SIZE,
            "capacity {} is smaller than the {}-byte archive header",
            capacity,
            HEADER_SIZE
        );

        let mut buf = RecordBuffer::new(buf, 0);
        ArchiveHeader::new(options.alignment).write(buf.append(HEADER_SIZE));
        Self {
            buf,
            compression: Compression::Plain,
            cursor: HEADER_SIZE,
            options,
        }
    }

    /// Append an entry with a zero file date.
    ///
    /// Fails with `EntryExists` if the name is taken, leaving the archive
    /// unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the record does not fit the capacity, if `name` is empty,
    /// or if the archive is not plain.
    pub fn add(&mut self, name: &[u8], data: &[u8]) -> Result<()> {
        self.add_with_filedate(name, data, 0)
    }

    /// Append an entry carrying `filedate`.
    pub fn add_with_filedate(&mut self, name: &[u8], data: &[u8], filedate: u64) -> Result<()> {
        self.assert_mutable();
        if name.contains(&0) {
            return Err(SuArcError::invalid_name(name, "names cannot contain NUL"));
        }
        if self.find(name).is_some() {
            return Err(SuArcError::entry_exists(name));
        }

        let position = self.buf.len();
        let (data_offset, size) = self.layout(position, name.len(), data.len());
        let record = self.buf.splice(position, 0, size);
        write_record(record, data_offset, name, data, filedate);

        trace!(name = %String::from_utf8_lossy(name), position, size, "added entry");
        Ok(())
    }

    /// Remove an entry, closing the gap it leaves.
    ///
    /// Fails with `EntryNotFound` if no entry has that name.
    pub fn remove(&mut self, name: &[u8]) -> Result<()> {
        self.assert_mutable();
        let (position, size) = match self.find(name) {
            Some(entry) => (entry.position(), entry.size()),
            None => return Err(SuArcError::entry_not_found(name)),
        };

        self.buf.remove(position, size);
        self.shift_cursor(position, size, 0);

        trace!(name = %String::from_utf8_lossy(name), position, size, "removed entry");
        Ok(())
    }

    /// Replace the payload of an entry, keeping its name and file date.
    ///
    /// Records after it move by the size difference.
    ///
    /// # Panics
    ///
    /// Panics if the resized record does not fit the capacity.
    pub fn update(&mut self, name: &[u8], data: &[u8]) -> Result<()> {
        self.assert_mutable();
        let (position, old_size, filedate) = match self.find(name) {
            Some(entry) => (entry.position(), entry.size(), entry.filedate()),
            None => return Err(SuArcError::entry_not_found(name)),
        };

        let (data_offset, size) = self.layout(position, name.len(), data.len());
        let record = self.buf.splice(position, old_size, size);
        write_record(record, data_offset, name, data, filedate);
        self.shift_cursor(position, old_size, size);

        trace!(
            name = %String::from_utf8_lossy(name),
            position,
            old_size,
            size,
            "updated entry"
        );
        Ok(())
    }

    /// Append an already encoded record verbatim.
    pub(crate) fn push_raw(&mut self, record: &[u8]) {
        self.buf.append(record.len()).copy_from_slice(record);
    }

    fn assert_mutable(&self) {
        assert!(
            self.compression.is_plain(),
            "cannot modify a {} archive; decompress it first",
            self.compression
        );
    }

    /// Payload offset and record size for a record written at `position`.
    fn layout(&self, position: usize, name_len: usize, data_len: usize) -> (usize, usize) {
        let mut data_offset = ENTRY_HEADER_SIZE + name_len + 1;
        let alignment = self.options.alignment as usize;
        if self.options.align_payloads && alignment > 1 {
            let start = position + data_offset;
            data_offset += start.next_multiple_of(alignment) - start;
        }

        let size = data_offset + data_len;
        assert!(
            size <= u32::MAX as usize,
            "record of {} bytes exceeds the 32-bit size field",
            size
        );
        (data_offset, size)
    }

    /// Keep the cursor on the same record after a splice at `position`.
    fn shift_cursor(&mut self, position: usize, old_size: usize, new_size: usize) {
        if self.cursor > position {
            self.cursor = self.cursor - old_size + new_size;
        }
    }
}

impl Archive<Vec<u8>> {
    /// Start an empty owned archive of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::create(vec![0; capacity])
    }

    /// Start an empty owned archive with the given layout options.
    pub fn with_capacity_and_options(capacity: usize, options: ArchiveOptions) -> Self {
        Self::create_with_options(vec![0; capacity], options)
    }

    /// Read a whole archive file; capacity equals its length.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_headroom(path, 0)
    }

    /// Read a whole archive file, reserving `extra` spare bytes for
    /// additions.
    pub fn open_with_headroom(path: impl AsRef<Path>, extra: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut data = std::fs::read(path)?;
        let len = data.len();
        data.resize(len + extra, 0);

        debug!(path = %path.display(), len, extra, "loaded archive");
        Ok(Self::from_buffer_with_len(data, len))
    }
}

impl<B: AsRef<[u8]>> Container for Archive<B> {
    type Entry<'a>
        = ArEntry<'a>
    where
        Self: 'a;

    fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    fn first_record_offset(&self) -> usize {
        HEADER_SIZE
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

impl<B: AsRef<[u8]>> fmt::Debug for Archive<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("compression", &self.compression)
            .field("cursor", &self.cursor)
            .field("options", &self.options)
            .finish()
    }
}

/// Fill a record region: header, name, NUL and padding, payload.
fn write_record(record: &mut [u8], data_offset: usize, name: &[u8], data: &[u8], filedate: u64) {
    let header = EntryHeader {
        size: record.len() as u32,
        data_size: data.len() as u32,
        data_offset: data_offset as u32,
        filedate,
    };
    header.write(&mut record[..ENTRY_HEADER_SIZE]);

    let name_end = ENTRY_HEADER_SIZE + name.len();
    record[ENTRY_HEADER_SIZE..name_end].copy_from_slice(name);
    record[name_end..data_offset].fill(0);
    record[data_offset..].copy_from_slice(data);
}
