//! Bit-level input over an in-memory byte slice.
//!
//! `BitReader` reads DEFLATE-ordered bit streams: bits are packed starting
//! from the least significant bit of each byte. Every container handled by
//! suarc is memory-resident, so the reader borrows a slice rather than
//! wrapping an `io::Read`.
//!
//! # Example
//!
//! ```
//! use suarc_core::bitstream::BitReader;
//!
//! let data = [0b1010_1101u8, 0xFF];
//! let mut reader = BitReader::new(&data);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(5).unwrap(), 0b10101);
//! assert_eq!(reader.read_bits(8).unwrap(), 0xFF);
//! assert!(reader.read_bits(1).is_err());
//! ```

use crate::error::{Result, SuArcError};

/// A bit-level reader over a borrowed byte slice.
///
/// The reader keeps up to 64 bits of look-ahead in a register. Peeks past
/// the end of the input yield zero bits; consuming them is an error, so a
/// truncated stream is always detected at the point it is actually read.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// Input bytes.
    data: &'a [u8],
    /// Next byte of `data` to be loaded into the bit buffer.
    pos: usize,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u32,
    /// Total bits consumed (for error reporting).
    total_bits_read: u64,
}

impl<'a> BitReader<'a> {
    /// Create a new `BitReader` over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Number of whole input bytes consumed so far, counting a partially
    /// consumed byte as consumed.
    pub fn bytes_consumed(&self) -> usize {
        self.total_bits_read.div_ceil(8) as usize
    }

    /// Number of bits that can still be consumed.
    pub fn bits_remaining(&self) -> u64 {
        self.bits_in_buffer as u64 + (self.data.len() - self.pos) as u64 * 8
    }

    /// Top up the bit buffer to at least 56 bits when input allows.
    #[inline]
    fn refill(&mut self) {
        if self.bits_in_buffer > 56 {
            return;
        }

        let available = self.data.len() - self.pos;
        if available >= 8 {
            // Whole-word load, keeping only the bytes that fit.
            let mut word = [0u8; 8];
            word.copy_from_slice(&self.data[self.pos..self.pos + 8]);
            let bytes = (63 - self.bits_in_buffer) / 8;
            let fresh = u64::from_le_bytes(word) & ((1u64 << (bytes * 8)) - 1);
            self.buffer |= fresh << self.bits_in_buffer;
            self.pos += bytes as usize;
            self.bits_in_buffer += bytes * 8;
        } else {
            while self.bits_in_buffer <= 56 && self.pos < self.data.len() {
                self.buffer |= (self.data[self.pos] as u64) << self.bits_in_buffer;
                self.pos += 1;
                self.bits_in_buffer += 8;
            }
        }
    }

    /// Peek at up to 32 bits without consuming them.
    ///
    /// Bits beyond the end of the input read as zero.
    #[inline]
    pub fn peek_bits(&mut self, count: u8) -> u32 {
        debug_assert!(count <= 32, "Cannot peek more than 32 bits at once");

        if count == 0 {
            return 0;
        }

        self.refill();
        let mask = (1u64 << count) - 1;
        (self.buffer & mask) as u32
    }

    /// Consume `count` bits previously inspected with [`peek_bits`].
    ///
    /// [`peek_bits`]: BitReader::peek_bits
    #[inline]
    pub fn skip_bits(&mut self, count: u8) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        if self.bits_in_buffer < count as u32 {
            self.refill();
            if self.bits_in_buffer < count as u32 {
                return Err(SuArcError::unexpected_eof(
                    (count as u32 - self.bits_in_buffer).div_ceil(8) as usize,
                ));
            }
        }

        self.buffer >>= count;
        self.bits_in_buffer -= count as u32;
        self.total_bits_read += count as u64;
        Ok(())
    }

    /// Read up to 32 bits from the stream.
    ///
    /// The first bit read ends up in the LSB of the result.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        let value = self.peek_bits(count);
        self.skip_bits(count)?;
        Ok(value)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Align to the next byte boundary by discarding partial bits.
    pub fn align_to_byte(&mut self) {
        let remainder = self.bits_in_buffer % 8;
        if remainder > 0 {
            self.buffer >>= remainder;
            self.bits_in_buffer -= remainder;
            self.total_bits_read += remainder as u64;
        }
    }

    /// Take `len` raw bytes at the current (byte-aligned) position.
    ///
    /// Any partial byte is discarded first. Returns `UnexpectedEof` without
    /// consuming anything if fewer than `len` bytes remain.
    pub fn take_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.align_to_byte();

        // Hand buffered whole bytes back to the slice.
        let start = self.pos - (self.bits_in_buffer / 8) as usize;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| SuArcError::unexpected_eof(len - (self.data.len() - start).min(len)))?;

        self.pos = end;
        self.buffer = 0;
        self.bits_in_buffer = 0;
        self.total_bits_read += len as u64 * 8;
        Ok(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitreader_basic() {
        // 0b10110101 = 0xB5
        let data = [0xB5];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(1).unwrap(), 1); // LSB first
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert!(reader.read_bit().is_err());
    }

    #[test]
    fn test_bitreader_multi_byte() {
        let data = [0xFF, 0x00];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(4).unwrap(), 0xF);
        assert_eq!(reader.read_bits(8).unwrap(), 0x0F); // Crosses byte boundary
        assert_eq!(reader.read_bits(4).unwrap(), 0x0);
    }

    #[test]
    fn test_word_refill_matches_bytewise() {
        let data: Vec<u8> = (0..40u8).map(|i| i.wrapping_mul(37)).collect();
        let mut reader = BitReader::new(&data);
        let bit_at = |i: u64| ((data[(i / 8) as usize] >> (i % 8)) & 1) as u32;

        // Odd widths force refills at every possible buffer level.
        let mut total = 0u64;
        for width in [3u8, 7, 13, 1, 17, 5, 11, 2, 19, 9].iter().cycle().take(30) {
            if total + *width as u64 > data.len() as u64 * 8 {
                break;
            }
            let mut manual = 0u32;
            for bit in 0..*width as u64 {
                manual |= bit_at(total + bit) << bit;
            }
            assert_eq!(reader.read_bits(*width).unwrap(), manual);
            total += *width as u64;
        }
    }

    #[test]
    fn test_peek_past_end_is_zero() {
        let data = [0x01];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.peek_bits(16), 0x0001);
        assert!(reader.skip_bits(9).is_err());
        assert_eq!(reader.read_bits(8).unwrap(), 0x01);
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn test_align_and_take_bytes() {
        let data = [0xFF, 0x12, 0x34, 0x56, 0x78];
        let mut reader = BitReader::new(&data);

        reader.read_bits(3).unwrap();
        assert_eq!(reader.take_bytes(2).unwrap(), &[0x12, 0x34]);
        assert_eq!(reader.read_bits(8).unwrap(), 0x56);
        assert!(reader.take_bytes(2).is_err());
        assert_eq!(reader.take_bytes(1).unwrap(), &[0x78]);
        assert_eq!(reader.bytes_consumed(), 5);
    }

    #[test]
    fn test_bytes_consumed_counts_partial_byte() {
        let data = [0xAA, 0xBB];
        let mut reader = BitReader::new(&data);

        reader.read_bits(1).unwrap();
        assert_eq!(reader.bytes_consumed(), 1);
        reader.read_bits(8).unwrap();
        assert_eq!(reader.bytes_consumed(), 2);
    }
}
