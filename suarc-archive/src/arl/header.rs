//! ARL header structure.
//!
//! ```text
//!   0  magic          u32   "ARL2"
//!   4  archive_count  u32   N
//!   8  archive_sizes  u32 × N
//! ```
//!
//! Fields are little-endian. Records start right after the size table.

use crate::detect::ARL_MAGIC;
use suarc_core::Endian;
use suarc_core::error::{Result, SuArcError};

/// Bytes before the size table.
pub const PREFIX_SIZE: usize = 8;

/// Header size for `archive_count` archives.
pub const fn header_size(archive_count: usize) -> usize {
    PREFIX_SIZE + 4 * archive_count
}

/// Linker header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkerHeader {
    /// Running byte total per referenced archive.
    pub archive_sizes: Vec<u32>,
}

impl LinkerHeader {
    /// A header for `archive_count` archives with zeroed sizes.
    pub fn new(archive_count: usize) -> Self {
        Self {
            archive_sizes: vec![0; archive_count],
        }
    }

    /// Number of referenced archives.
    pub fn archive_count(&self) -> usize {
        self.archive_sizes.len()
    }

    /// Encoded size of this header.
    pub fn size(&self) -> usize {
        header_size(self.archive_count())
    }

    /// Read the header at the start of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let le = Endian::Little;
        let magic = le.read_u32(bytes, 0)?;
        if magic != ARL_MAGIC {
            return Err(SuArcError::invalid_magic(ARL_MAGIC, magic));
        }

        let count = le.read_u32(bytes, 4)? as usize;
        let table_end = header_size(count);
        if table_end > bytes.len() {
            return Err(SuArcError::invalid_header(format!(
                "{} archive sizes need {} bytes, only {} present",
                count,
                table_end,
                bytes.len()
            )));
        }

        let archive_sizes = (0..count)
            .map(|i| le.read_u32(bytes, PREFIX_SIZE + 4 * i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { archive_sizes })
    }

    /// Write the header into the first [`size`](LinkerHeader::size) bytes
    /// of `out`.
    pub fn write(&self, out: &mut [u8]) {
        let le = Endian::Little;
        le.write_u32(out, 0, ARL_MAGIC);
        le.write_u32(out, 4, self.archive_count() as u32);
        for (i, &size) in self.archive_sizes.iter().enumerate() {
            le.write_u32(out, PREFIX_SIZE + 4 * i, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = LinkerHeader {
            archive_sizes: vec![0x100, 7],
        };
        let mut buf = vec![0u8; header.size()];
        header.write(&mut buf);
        assert_eq!(&buf[..4], b"ARL2");
        assert_eq!(&buf[4..8], &[2, 0, 0, 0]);
        assert_eq!(&buf[8..12], &[0, 1, 0, 0]);
        assert_eq!(LinkerHeader::read(&buf).unwrap(), header);
    }

    #[test]
    fn test_truncated_size_table() {
        let mut buf = b"ARL2".to_vec();
        buf.extend_from_slice(&[3, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            LinkerHeader::read(&buf),
            Err(SuArcError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            LinkerHeader::read(&[0u8; 12]),
            Err(SuArcError::InvalidMagic { .. })
        ));
    }
}
