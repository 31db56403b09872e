//! SEGS chunked DEFLATE unwrapping.
//!
//! Layout, every field in the byte order the magic was found in:
//!
//! ```text
//! 0   u32  magic "sges"
//! 4   u16  reserved
//! 6   u16  chunk count
//! 8   u32  decompressed size
//! 12  u32  compressed size
//! 16  chunk descriptors, 8 bytes each:
//!       u16 compressed size   (0 means 0xFFFF)
//!       u16 decompressed size (0 means 0xFFFF)
//!       u32 offset + 1, from the start of the file
//! ```
//!
//! A first chunk whose stored offset is 0 starts right after the descriptor
//! table. A chunk whose two sizes match is stored; anything else is raw
//! DEFLATE.

use crate::detect::SEGS_MAGIC;
use suarc_core::Endian;
use suarc_core::error::{Result, SuArcError};
use suarc_deflate::Inflater;
use tracing::{debug, trace, warn};

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 16;

/// Size of one chunk descriptor.
pub const CHUNK_DESCRIPTOR_SIZE: usize = 8;

/// Value a zero size field stands for.
pub const MAX_CHUNK_SIZE: usize = 0xFFFF;

/// Parsed SEGS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegsHeader {
    /// Byte order the magic matched in.
    pub endian: Endian,
    /// Reserved word.
    pub dummy: u16,
    /// Number of chunk descriptors.
    pub chunks: u16,
    /// Size of the plain container.
    pub full_size: u32,
    /// Size of the compressed file.
    pub full_zsize: u32,
}

impl SegsHeader {
    /// Read the header at the start of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let magic = bytes
            .first_chunk::<4>()
            .copied()
            .ok_or_else(|| SuArcError::unexpected_eof(HEADER_SIZE - bytes.len()))?;
        let endian = Endian::probe(magic, SEGS_MAGIC)
            .ok_or_else(|| SuArcError::invalid_magic(SEGS_MAGIC, u32::from_be_bytes(magic)))?;

        Ok(Self {
            endian,
            dummy: endian.read_u16(bytes, 4)?,
            chunks: endian.read_u16(bytes, 6)?,
            full_size: endian.read_u32(bytes, 8)?,
            full_zsize: endian.read_u32(bytes, 12)?,
        })
    }

    /// Offset right after the descriptor table.
    pub fn table_end(&self) -> usize {
        HEADER_SIZE + CHUNK_DESCRIPTOR_SIZE * self.chunks as usize
    }

    /// `full_size`, checked against what the chunk table can describe.
    ///
    /// The table must lie inside the `input_len` bytes of the file, and its
    /// chunks, each expanding to at most [`MAX_CHUNK_SIZE`], must be able to
    /// cover the declared size.
    pub fn checked_size(&self, input_len: usize) -> Result<usize> {
        if self.table_end() > input_len {
            return Err(SuArcError::corrupted(
                HEADER_SIZE as u64,
                format!("{} chunk descriptors run past the end", self.chunks),
            ));
        }
        let full_size = self.full_size as usize;
        let limit = self.chunks as usize * MAX_CHUNK_SIZE;
        if full_size > limit {
            return Err(SuArcError::invalid_header(format!(
                "SEGS size {} exceeds {} for {} chunks",
                full_size, limit, self.chunks
            )));
        }
        Ok(full_size)
    }

    /// Read descriptor `index` from `bytes`.
    ///
    /// The stored offset is corrected here; the first-chunk quirk is left
    /// to the caller.
    pub fn chunk(&self, bytes: &[u8], index: usize) -> Result<SegsChunk> {
        let at = HEADER_SIZE + CHUNK_DESCRIPTOR_SIZE * index;
        let size_field = |raw: u16| if raw == 0 { MAX_CHUNK_SIZE } else { raw as usize };

        Ok(SegsChunk {
            zsize: size_field(self.endian.read_u16(bytes, at)?),
            size: size_field(self.endian.read_u16(bytes, at + 2)?),
            offset: self.endian.read_u32(bytes, at + 4)?.saturating_sub(1) as usize,
        })
    }
}

/// One chunk descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegsChunk {
    /// Bytes of chunk payload.
    pub zsize: usize,
    /// Bytes the chunk expands to.
    pub size: usize,
    /// Payload offset from the start of the file.
    pub offset: usize,
}

impl SegsChunk {
    /// Whether the payload is stored without compression.
    pub fn is_stored(&self) -> bool {
        self.zsize == self.size
    }
}

/// Unwrap a SEGS file into `out`, returning the bytes written.
///
/// A chunk that inflates short is logged and skipped past; the count
/// returned then falls below the header's size.
///
/// # Panics
///
/// Panics if `out` is smaller than the declared decompressed size.
pub fn decompress(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let header = SegsHeader::read(input)?;
    let full_size = header.full_size as usize;
    assert!(
        out.len() >= full_size,
        "output buffer of {} bytes is smaller than the decompressed size {}",
        out.len(),
        full_size
    );

    let table_end = header.table_end();
    if table_end > input.len() {
        return Err(SuArcError::corrupted(
            HEADER_SIZE as u64,
            format!("{} chunk descriptors run past the end", header.chunks),
        ));
    }

    let mut inflater = Inflater::new();
    let mut written = 0usize;
    for index in 0..header.chunks as usize {
        let mut chunk = header.chunk(input, index)?;
        if index == 0 && chunk.offset == 0 {
            chunk.offset = table_end;
        }

        let payload = input
            .get(chunk.offset..chunk.offset + chunk.zsize)
            .ok_or_else(|| {
                SuArcError::corrupted(
                    chunk.offset as u64,
                    format!("chunk {} of {} bytes runs past the end", index, chunk.zsize),
                )
            })?;
        let room = full_size.saturating_sub(written);

        if chunk.is_stored() {
            if chunk.size > room {
                return Err(SuArcError::corrupted(
                    chunk.offset as u64,
                    format!("stored chunk {} overflows the declared size", index),
                ));
            }
            out[written..written + chunk.size].copy_from_slice(payload);
            written += chunk.size;
        } else {
            let limit = chunk.size.min(room);
            let result = inflater.decompress(payload, &mut out[written..written + limit]);
            if result.written < chunk.size {
                warn!(
                    chunk = index,
                    expected = chunk.size,
                    written = result.written,
                    status = ?result.status,
                    "SEGS chunk inflated short"
                );
            }
            written += result.written;
        }

        trace!(chunk = index, offset = chunk.offset, zsize = chunk.zsize, size = chunk.size, "SEGS chunk");
    }

    debug!(chunks = header.chunks, full_size, written, "unwrapped SEGS");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a SEGS file from `(zsize, size, payload)` chunks laid out
    /// after the table. `shift_first` stores the first offset as 0.
    fn build(endian: Endian, chunks: &[(u16, u16, &[u8])], shift_first: bool) -> Vec<u8> {
        let full: u32 = chunks.iter().map(|c| c.1 as u32).sum();
        let table_end = HEADER_SIZE + CHUNK_DESCRIPTOR_SIZE * chunks.len();

        let mut out = endian.u32_bytes(SEGS_MAGIC).to_vec();
        out.extend_from_slice(&endian.u16_bytes(0));
        out.extend_from_slice(&endian.u16_bytes(chunks.len() as u16));
        out.extend_from_slice(&endian.u32_bytes(full));
        out.extend_from_slice(&endian.u32_bytes(0));

        let mut offset = table_end;
        for (i, (zsize, size, payload)) in chunks.iter().enumerate() {
            let stored = if i == 0 && shift_first { 0 } else { offset as u32 + 1 };
            out.extend_from_slice(&endian.u16_bytes(*zsize));
            out.extend_from_slice(&endian.u16_bytes(*size));
            out.extend_from_slice(&endian.u32_bytes(stored));
            offset += payload.len();
        }
        for (_, _, payload) in chunks {
            out.extend_from_slice(payload);
        }
        out
    }

    #[test]
    fn test_header_either_order() {
        for endian in [Endian::Big, Endian::Little] {
            let file = build(endian, &[(3, 3, b"abc")], false);
            let header = SegsHeader::read(&file).unwrap();
            assert_eq!(header.endian, endian);
            assert_eq!(header.chunks, 1);
            assert_eq!(header.full_size, 3);
        }
        assert_eq!(&build(Endian::Big, &[], false)[..4], b"sges");
    }

    #[test]
    fn test_stored_chunks() {
        let file = build(Endian::Big, &[(3, 3, b"abc"), (2, 2, b"de")], false);
        let mut out = [0u8; 5];
        assert_eq!(decompress(&file, &mut out).unwrap(), 5);
        assert_eq!(&out, b"abcde");
    }

    #[test]
    fn test_first_offset_zero_quirk() {
        let file = build(Endian::Big, &[(3, 3, b"abc"), (2, 2, b"de")], true);
        let mut out = [0u8; 5];
        assert_eq!(decompress(&file, &mut out).unwrap(), 5);
        assert_eq!(&out, b"abcde");
    }

    #[test]
    fn test_deflate_chunk() {
        // "hello" as a fixed-Huffman block.
        let hello: &[u8] = &[0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00];
        let file = build(Endian::Little, &[(7, 5, hello), (1, 1, b"!")], false);
        let mut out = [0u8; 6];
        assert_eq!(decompress(&file, &mut out).unwrap(), 6);
        assert_eq!(&out, b"hello!");
    }

    #[test]
    fn test_zero_size_fields() {
        let file = build(Endian::Big, &[(0, 0, &[])], false);
        let header = SegsHeader::read(&file).unwrap();
        let chunk = header.chunk(&file, 0).unwrap();
        assert_eq!(chunk.zsize, MAX_CHUNK_SIZE);
        assert_eq!(chunk.size, MAX_CHUNK_SIZE);
    }

    #[test]
    fn test_chunk_past_end_is_corrupted() {
        let mut file = build(Endian::Big, &[(3, 3, b"abc")], false);
        file.truncate(file.len() - 1);
        let mut out = [0u8; 3];
        assert!(matches!(
            decompress(&file, &mut out),
            Err(SuArcError::CorruptedData { .. })
        ));
    }

    #[test]
    fn test_checked_size() {
        let file = build(Endian::Big, &[(3, 3, b"abc")], false);
        let header = SegsHeader::read(&file).unwrap();
        assert_eq!(header.checked_size(file.len()).unwrap(), 3);
        assert!(matches!(
            header.checked_size(HEADER_SIZE),
            Err(SuArcError::CorruptedData { .. })
        ));

        let mut forged = file.clone();
        Endian::Big.write_u32(&mut forged, 8, u32::MAX);
        let header = SegsHeader::read(&forged).unwrap();
        assert!(matches!(
            header.checked_size(forged.len()),
            Err(SuArcError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            SegsHeader::read(b"ARL2\0\0\0\0\0\0\0\0\0\0\0\0"),
            Err(SuArcError::InvalidMagic { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "smaller than the decompressed size")]
    fn test_small_output_panics() {
        let file = build(Endian::Big, &[(3, 3, b"abc")], false);
        let mut out = [0u8; 2];
        let _ = decompress(&file, &mut out);
    }
}
