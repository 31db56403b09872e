//! AR header structures.
//!
//! All fields are little-endian.
//!
//! ```text
//! archive header (16 bytes)
//!   0  unknown      u32   always 0
//!   4  header_size  u32   16
//!   8  entry_size   u32   20
//!  12  alignment    u32   64 by default
//!
//! entry record (20 bytes + name + NUL + padding + payload)
//!   0  size         u32   whole record
//!   4  data_size    u32   payload bytes
//!   8  data_offset  u32   record start to payload start
//!  12  filedate     u64   opaque
//!  20  name         NUL-terminated
//! ```

use suarc_core::Endian;
use suarc_core::error::{Result, SuArcError};

/// Size of the archive header.
pub const HEADER_SIZE: usize = 16;

/// Size of the fixed part of an entry record.
pub const ENTRY_HEADER_SIZE: usize = 20;

/// Alignment written into fresh headers.
pub const DEFAULT_ALIGNMENT: u32 = 64;

/// Archive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Unknown field, always 0 in shipped files.
    pub unknown: u32,
    /// Header size, always 16.
    pub header_size: u32,
    /// Entry header size, always 20.
    pub entry_size: u32,
    /// Payload alignment hint.
    pub alignment: u32,
}

impl ArchiveHeader {
    /// A fresh header with the given alignment.
    pub fn new(alignment: u32) -> Self {
        Self {
            unknown: 0,
            header_size: HEADER_SIZE as u32,
            entry_size: ENTRY_HEADER_SIZE as u32,
            alignment,
        }
    }

    /// Read the header at the start of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let le = Endian::Little;
        Ok(Self {
            unknown: le.read_u32(bytes, 0)?,
            header_size: le.read_u32(bytes, 4)?,
            entry_size: le.read_u32(bytes, 8)?,
            alignment: le.read_u32(bytes, 12)?,
        })
    }

    /// Write the header into the first 16 bytes of `out`.
    pub fn write(&self, out: &mut [u8]) {
        let le = Endian::Little;
        le.write_u32(out, 0, self.unknown);
        le.write_u32(out, 4, self.header_size);
        le.write_u32(out, 8, self.entry_size);
        le.write_u32(out, 12, self.alignment);
    }
}

impl Default for ArchiveHeader {
    fn default() -> Self {
        Self::new(DEFAULT_ALIGNMENT)
    }
}

/// Fixed part of an entry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    /// Total record size.
    pub size: u32,
    /// Payload size.
    pub data_size: u32,
    /// Offset from the record start to the payload.
    pub data_offset: u32,
    /// Opaque file date.
    pub filedate: u64,
}

impl EntryHeader {
    /// Read the entry header at `position`.
    pub fn read(bytes: &[u8], position: usize) -> Result<Self> {
        let le = Endian::Little;
        Ok(Self {
            size: le.read_u32(bytes, position)?,
            data_size: le.read_u32(bytes, position + 4)?,
            data_offset: le.read_u32(bytes, position + 8)?,
            filedate: le.read_u64(bytes, position + 12)?,
        })
    }

    /// Write the entry header into the first 20 bytes of `out`.
    pub fn write(&self, out: &mut [u8]) {
        let le = Endian::Little;
        le.write_u32(out, 0, self.size);
        le.write_u32(out, 4, self.data_size);
        le.write_u32(out, 8, self.data_offset);
        out[12..20].copy_from_slice(&le.u64_bytes(self.filedate));
    }

    /// Check the header against the bytes available after `position`.
    pub fn check_bounds(&self, position: usize, available: usize) -> Result<()> {
        let size = self.size as usize;
        let offset = self.data_offset as usize;

        if size <= ENTRY_HEADER_SIZE || size > available {
            return Err(SuArcError::corrupted(
                position as u64,
                format!("record size {} out of range ({} bytes left)", size, available),
            ));
        }
        if offset <= ENTRY_HEADER_SIZE || offset + self.data_size as usize > size {
            return Err(SuArcError::corrupted(
                position as u64,
                format!(
                    "payload {}+{} outside record of {} bytes",
                    offset, self.data_size, size
                ),
            ));
        }
        Ok(())
    }
}
