//! XCompression block unwrapping (partial).
//!
//! Header, in the byte order the magic was found in:
//!
//! ```text
//! 0   u32  magic 0x0FF512EE
//! 4   u16  version
//! 6   u16  reserved
//! 8   u32  context flags
//! 12  u32  flags
//! 16  u32  window size
//! 20  u32  partition size
//! 24  u64  uncompressed size
//! 32  u64  compressed size
//! 40  u32  uncompressed block size
//! 44  u32  compressed block size max
//! ```
//!
//! Blocks follow, each framed by three `u32`s (compressed size,
//! continuation flag, uncompressed size) and then the payload.
//!
//! Only blocks expanding to exactly the uniform block size are copied, as
//! stored data. Every other block would need an LZX decoder, which this
//! module does not have: such blocks are skipped with a warning and the
//! output comes out short.

use crate::detect::XCOMPRESSION_MAGIC;
use suarc_core::Endian;
use suarc_core::error::{Result, SuArcError};
use tracing::{debug, trace, warn};

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 48;

/// Size of a block frame.
pub const BLOCK_FRAME_SIZE: usize = 12;

/// Largest uniform block size accepted: the biggest LZX window, 2 MiB.
pub const MAX_BLOCK_SIZE: u32 = 1 << 21;

/// Parsed XCompression header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XCompressionHeader {
    /// Byte order the magic matched in.
    pub endian: Endian,
    /// Format version.
    pub version: u16,
    /// Reserved word.
    pub reserved: u16,
    /// Codec context flags.
    pub context_flags: u32,
    /// Stream flags.
    pub flags: u32,
    /// LZX window size.
    pub window_size: u32,
    /// Compression partition size.
    pub partition_size: u32,
    /// Size of the plain container.
    pub uncompressed_size: u64,
    /// Size of the compressed stream.
    pub compressed_size: u64,
    /// Uniform block size.
    pub uncompressed_block_size: u32,
    /// Largest compressed block.
    pub compressed_block_size_max: u32,
}

impl XCompressionHeader {
    /// Read the header at the start of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(SuArcError::unexpected_eof(HEADER_SIZE - bytes.len()));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        let endian = Endian::probe(magic, XCOMPRESSION_MAGIC).ok_or_else(|| {
            SuArcError::invalid_magic(XCOMPRESSION_MAGIC, u32::from_be_bytes(magic))
        })?;

        Ok(Self {
            endian,
            version: endian.read_u16(bytes, 4)?,
            reserved: endian.read_u16(bytes, 6)?,
            context_flags: endian.read_u32(bytes, 8)?,
            flags: endian.read_u32(bytes, 12)?,
            window_size: endian.read_u32(bytes, 16)?,
            partition_size: endian.read_u32(bytes, 20)?,
            uncompressed_size: endian.read_u64(bytes, 24)?,
            compressed_size: endian.read_u64(bytes, 32)?,
            uncompressed_block_size: endian.read_u32(bytes, 40)?,
            compressed_block_size_max: endian.read_u32(bytes, 44)?,
        })
    }

    /// `uncompressed_size`, checked against what `input_len` bytes of
    /// blocks can expand to.
    ///
    /// Every block costs at least one frame and yields at most one uniform
    /// block, which may not exceed [`MAX_BLOCK_SIZE`].
    pub fn checked_size(&self, input_len: usize) -> Result<usize> {
        if self.uncompressed_block_size > MAX_BLOCK_SIZE {
            return Err(SuArcError::invalid_header(format!(
                "XCompression block size {} exceeds {}",
                self.uncompressed_block_size, MAX_BLOCK_SIZE
            )));
        }
        let blocks = input_len.saturating_sub(HEADER_SIZE) / BLOCK_FRAME_SIZE;
        let limit = blocks as u64 * u64::from(self.uncompressed_block_size);
        if self.uncompressed_size > limit {
            return Err(SuArcError::invalid_header(format!(
                "XCompression size {} exceeds {} for a {} byte stream",
                self.uncompressed_size, limit, input_len
            )));
        }
        usize::try_from(self.uncompressed_size).map_err(|_| {
            SuArcError::invalid_header(format!(
                "Uncompressed size {} does not fit in memory",
                self.uncompressed_size
            ))
        })
    }
}

/// Frame in front of each block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockFrame {
    compressed_size: u32,
    continuation: u32,
    uncompressed_size: u32,
}

impl BlockFrame {
    fn read(bytes: &[u8], at: usize, endian: Endian) -> Result<Self> {
        Ok(Self {
            compressed_size: endian.read_u32(bytes, at)?,
            continuation: endian.read_u32(bytes, at + 4)?,
            uncompressed_size: endian.read_u32(bytes, at + 8)?,
        })
    }
}

/// Unwrap an XCompression stream into `out`, returning the bytes written.
///
/// Best effort: see the module docs for which blocks are understood.
///
/// # Panics
///
/// Panics if `out` is smaller than the declared uncompressed size.
pub fn decompress(input: &[u8], out: &mut [u8]) -> Result<usize> {
    let header = XCompressionHeader::read(input)?;
    let total = usize::try_from(header.uncompressed_size).map_err(|_| {
        SuArcError::invalid_header(format!(
            "Uncompressed size {} does not fit in memory",
            header.uncompressed_size
        ))
    })?;
    assert!(
        out.len() >= total,
        "output buffer of {} bytes is smaller than the decompressed size {}",
        out.len(),
        total
    );

    let mut position = HEADER_SIZE;
    let mut written = 0usize;
    let mut skipped = 0usize;
    loop {
        let frame = BlockFrame::read(input, position, header.endian)?;
        let start = position + BLOCK_FRAME_SIZE;
        let payload = input
            .get(start..start + frame.compressed_size as usize)
            .ok_or_else(|| {
                SuArcError::corrupted(
                    position as u64,
                    format!("block of {} bytes runs past the end", frame.compressed_size),
                )
            })?;

        if frame.uncompressed_size == header.uncompressed_block_size {
            let n = payload.len().min(total - written);
            out[written..written + n].copy_from_slice(&payload[..n]);
            written += n;
            trace!(position, size = n, "copied XCompression block");
        } else {
            warn!(
                position,
                uncompressed_size = frame.uncompressed_size,
                block_size = header.uncompressed_block_size,
                "skipping XCompression block: LZX blocks are not supported"
            );
            skipped += 1;
        }

        position = start + payload.len();
        if frame.continuation == 0 {
            break;
        }
    }

    debug!(total, written, skipped, "unwrapped XCompression (partial)");
    Ok(written)
}
