//! Explicit byte-order decoding at struct-read boundaries.
//!
//! AR records and ARL headers are always little-endian. The compressed
//! wrappers (SEGS, XCompression) were written by big-endian consoles, but
//! their byte order is not assumed: [`Endian::probe`] matches the leading
//! magic against both orders and the winner decodes the rest of the header.

use crate::error::{Result, SuArcError};

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl Endian {
    /// Find the byte order in which `bytes` spell `magic`.
    ///
    /// Little-endian wins for palindromic magics.
    pub fn probe(bytes: [u8; 4], magic: u32) -> Option<Self> {
        if u32::from_le_bytes(bytes) == magic {
            Some(Self::Little)
        } else if u32::from_be_bytes(bytes) == magic {
            Some(Self::Big)
        } else {
            None
        }
    }

    /// Fetch `N` bytes at `offset`.
    fn array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
        let end = offset.saturating_add(N);
        let bytes = buf
            .get(offset..end)
            .ok_or_else(|| SuArcError::unexpected_eof(end - buf.len().clamp(offset, end)))?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a `u16` at `offset`.
    pub fn read_u16(self, buf: &[u8], offset: usize) -> Result<u16> {
        let bytes = Self::array(buf, offset)?;
        Ok(match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        })
    }

    /// Read a `u32` at `offset`.
    pub fn read_u32(self, buf: &[u8], offset: usize) -> Result<u32> {
        let bytes = Self::array(buf, offset)?;
        Ok(match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Read a `u64` at `offset`.
    pub fn read_u64(self, buf: &[u8], offset: usize) -> Result<u64> {
        let bytes = Self::array(buf, offset)?;
        Ok(match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        })
    }

    /// Encode a `u16`.
    pub fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Encode a `u32`.
    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Encode a `u64`.
    pub fn u64_bytes(self, value: u64) -> [u8; 8] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Write a `u16` at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` has fewer than `offset + 2` bytes.
    pub fn write_u16(self, buf: &mut [u8], offset: usize, value: u16) {
        buf[offset..offset + 2].copy_from_slice(&self.u16_bytes(value));
    }

    /// Write a `u32` at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` has fewer than `offset + 4` bytes.
    pub fn write_u32(self, buf: &mut [u8], offset: usize, value: u32) {
        buf[offset..offset + 4].copy_from_slice(&self.u32_bytes(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe() {
        assert_eq!(Endian::probe(*b"ARL2", 0x324C5241), Some(Endian::Little));
        assert_eq!(Endian::probe(*b"sges", 0x73676573), Some(Endian::Big));
        assert_eq!(Endian::probe(*b"segs", 0x73676573), Some(Endian::Little));
        assert_eq!(Endian::probe(*b"ABCD", 0x73676573), None);
    }

    #[test]
    fn test_reads() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        assert_eq!(Endian::Little.read_u16(&buf, 0).unwrap(), 0x3412);
        assert_eq!(Endian::Big.read_u16(&buf, 0).unwrap(), 0x1234);
        assert_eq!(Endian::Little.read_u32(&buf, 4).unwrap(), 0xF0DEBC9A);
        assert_eq!(Endian::Big.read_u32(&buf, 4).unwrap(), 0x9ABCDEF0);
        assert_eq!(Endian::Big.read_u64(&buf, 0).unwrap(), 0x123456789ABCDEF0);
    }

    #[test]
    fn test_short_read() {
        let buf = [0u8; 6];
        assert!(matches!(
            Endian::Little.read_u32(&buf, 4),
            Err(SuArcError::UnexpectedEof { expected: 2 })
        ));
        assert!(Endian::Big.read_u64(&buf, 100).is_err());
    }

    #[test]
    fn test_write_roundtrip() {
        let mut buf = [0u8; 8];
        Endian::Big.write_u32(&mut buf, 2, 0xEE12F50F);
        assert_eq!(&buf[2..6], &[0xEE, 0x12, 0xF5, 0x0F]);
        assert_eq!(Endian::Big.read_u32(&buf, 2).unwrap(), 0xEE12F50F);

        Endian::Little.write_u16(&mut buf, 6, 0x0102);
        assert_eq!(&buf[6..], &[0x02, 0x01]);
    }
}
