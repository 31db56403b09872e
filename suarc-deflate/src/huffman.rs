//! Canonical Huffman decode tables for DEFLATE.
//!
//! DEFLATE codes are canonical (RFC 1951 Section 3.2.2): codes of the same
//! length are consecutive integers in symbol order, so a table can be built
//! from code lengths alone.
//!
//! # Table layout
//!
//! Each table has a primary level indexed by the next `table_bits` input
//! bits. Codes no longer than `table_bits` are replicated across every
//! primary slot that shares their (bit-reversed) prefix. Longer codes are
//! chained into a secondary sub-table hanging off the primary slot of their
//! first `table_bits` bits; that slot carries [`SUBTABLE_FLAG`] instead of a
//! symbol.
//!
//! ```text
//! entry: [31..16] symbol or sub-table start | [15] SUBTABLE_FLAG | [7..0] bits
//! ```
//!
//! For a direct entry `bits` is the code length to consume; for a link
//! entry it is the width of the sub-table index.

use suarc_core::BitReader;
use suarc_core::error::{Result, SuArcError};

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// Size of the literal/length alphabet including the two reserved codes.
pub const LITLEN_ALPHABET_SIZE: usize = 288;

/// Size of the distance alphabet including the two reserved codes.
pub const DISTANCE_ALPHABET_SIZE: usize = 32;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// Primary table width for literal/length codes.
pub const LITLEN_TABLE_BITS: u8 = 10;

/// Primary table width for distance codes.
pub const DISTANCE_TABLE_BITS: u8 = 8;

/// Primary table width for the dynamic-header code length alphabet.
pub const CODELEN_TABLE_BITS: u8 = 7;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// Marker bit of a primary entry that links to a sub-table.
pub const SUBTABLE_FLAG: u32 = 0x8000;

const BITS_MASK: u32 = 0xFF;

/// A two-level canonical Huffman decode table.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Primary entries followed by every sub-table.
    entries: Vec<u32>,
    /// Width of the primary level.
    table_bits: u8,
    /// Longest code in the table, 0 when no symbol is coded.
    max_code_length: u8,
}

impl HuffmanTable {
    /// Create an empty table with the given primary width.
    ///
    /// Decoding from an empty table always fails.
    pub fn new(table_bits: u8) -> Self {
        assert!(
            (1..=MAX_CODE_LENGTH as u8).contains(&table_bits),
            "table width must be 1..=15 bits, got {}",
            table_bits
        );
        Self {
            entries: vec![0; 1 << table_bits],
            table_bits,
            max_code_length: 0,
        }
    }

    /// Build a table from code lengths.
    ///
    /// `code_lengths[i]` is the bit length for symbol `i`; 0 means unused.
    pub fn from_code_lengths(code_lengths: &[u8], table_bits: u8) -> Result<Self> {
        let mut table = Self::new(table_bits);
        table.build(code_lengths)?;
        Ok(table)
    }

    /// Primary table width.
    pub fn table_bits(&self) -> u8 {
        self.table_bits
    }

    /// Longest code length, 0 for an empty table.
    pub fn max_code_length(&self) -> u8 {
        self.max_code_length
    }

    /// Total entries including sub-tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table codes no symbol at all.
    pub fn is_empty(&self) -> bool {
        self.max_code_length == 0
    }

    /// Rebuild this table in place from code lengths.
    ///
    /// Over-subscribed length sets are rejected. Incomplete sets are
    /// accepted; the unassigned codes decode as errors.
    pub fn build(&mut self, code_lengths: &[u8]) -> Result<()> {
        let primary_size = 1usize << self.table_bits;
        self.entries.clear();
        self.entries.resize(primary_size, 0);
        self.max_code_length = 0;

        // Count codes of each length
        let mut bl_count = [0u32; MAX_CODE_LENGTH + 1];
        for &len in code_lengths {
            if len as usize > MAX_CODE_LENGTH {
                return Err(SuArcError::invalid_header(format!(
                    "Code length {} exceeds maximum {}",
                    len, MAX_CODE_LENGTH
                )));
            }
            bl_count[len as usize] += 1;
            self.max_code_length = self.max_code_length.max(len);
        }
        bl_count[0] = 0;

        if self.max_code_length == 0 {
            return Ok(());
        }

        // Reject more codes than the code space holds
        let mut left = 1i64;
        for &count in &bl_count[1..] {
            left = (left << 1) - count as i64;
            if left < 0 {
                return Err(SuArcError::invalid_header("Over-subscribed Huffman code"));
            }
        }

        // First code for each length (RFC 1951 algorithm)
        let mut next_code = [0u32; MAX_CODE_LENGTH + 1];
        let mut code = 0u32;
        for bits in 1..=MAX_CODE_LENGTH {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        let table_bits = self.table_bits as usize;
        let primary_mask = primary_size as u32 - 1;

        // Size each sub-table by the longest code sharing its prefix
        if self.max_code_length as usize > table_bits {
            let mut sub_bits = vec![0u8; primary_size];
            let mut codes = next_code;
            for &len in code_lengths {
                let len = len as usize;
                if len == 0 {
                    continue;
                }
                let reversed = reverse_bits(codes[len], len);
                codes[len] += 1;
                if len > table_bits {
                    let prefix = (reversed & primary_mask) as usize;
                    sub_bits[prefix] = sub_bits[prefix].max((len - table_bits) as u8);
                }
            }

            for (prefix, &bits) in sub_bits.iter().enumerate() {
                if bits > 0 {
                    let start = self.entries.len();
                    self.entries.resize(start + (1 << bits), 0);
                    self.entries[prefix] = ((start as u32) << 16) | SUBTABLE_FLAG | bits as u32;
                }
            }
        }

        // Fill entries
        let mut codes = next_code;
        for (symbol, &len) in code_lengths.iter().enumerate() {
            let len = len as usize;
            if len == 0 {
                continue;
            }
            let reversed = reverse_bits(codes[len], len);
            codes[len] += 1;

            if len <= table_bits {
                let entry = ((symbol as u32) << 16) | len as u32;
                let mut index = reversed as usize;
                while index < primary_size {
                    self.entries[index] = entry;
                    index += 1 << len;
                }
            } else {
                let link = self.entries[(reversed & primary_mask) as usize];
                let start = (link >> 16) as usize;
                let sub_size = 1usize << (link & BITS_MASK);
                let rest_len = len - table_bits;
                let entry = ((symbol as u32) << 16) | rest_len as u32;
                let mut index = (reversed >> table_bits) as usize;
                while index < sub_size {
                    self.entries[start + index] = entry;
                    index += 1 << rest_len;
                }
            }
        }

        Ok(())
    }

    /// Decode a symbol from the bit stream.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let bits = reader.peek_bits(self.table_bits);
        let mut entry = self.entries[bits as usize];

        if entry & SUBTABLE_FLAG != 0 {
            let start = (entry >> 16) as usize;
            let sub_bits = (entry & BITS_MASK) as u8;
            reader.skip_bits(self.table_bits)?;
            let index = reader.peek_bits(sub_bits) as usize;
            entry = self.entries[start + index];
        }

        let len = (entry & BITS_MASK) as u8;
        if len == 0 {
            return Err(SuArcError::invalid_huffman(reader.bit_position()));
        }
        reader.skip_bits(len)?;
        Ok((entry >> 16) as u16)
    }
}

/// Reverse the low `length` bits of `code`.
///
/// Canonical codes are defined MSB-first but arrive LSB-first.
fn reverse_bits(code: u32, length: usize) -> u32 {
    code.reverse_bits() >> (32 - length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huffman_table_simple() {
        // Simple code: A=0, B=10, C=11
        // In LSB-first: A=0, B=01 (reversed from 10), C=11
        let lengths = [1u8, 2, 2];
        let table = HuffmanTable::from_code_lengths(&lengths, 7).unwrap();

        // A B C A -> 0 01 11 0 packed LSB-first = 0b00011010
        let data = [0b00011010u8];
        let mut reader = BitReader::new(&data);

        assert_eq!(table.decode(&mut reader).unwrap(), 0); // A
        assert_eq!(table.decode(&mut reader).unwrap(), 1); // B
        assert_eq!(table.decode(&mut reader).unwrap(), 2); // C
        assert_eq!(table.decode(&mut reader).unwrap(), 0); // A
    }

    #[test]
    fn test_long_codes_use_subtables() {
        // 1 code of length 1, then one each of 2..=12, closing with two 12s.
        let mut lengths = vec![1u8];
        lengths.extend(2..=12u8);
        lengths.push(12);
        let table = HuffmanTable::from_code_lengths(&lengths, 4).unwrap();
        assert!(table.len() > 16);
        assert_eq!(table.max_code_length(), 12);

        // Symbol 12 is the all-ones 12-bit code.
        let data = [0xFF, 0x0F];
        let mut reader = BitReader::new(&data);
        assert_eq!(table.decode(&mut reader).unwrap(), 12);
        assert_eq!(reader.bit_position(), 12);

        // Symbol 11 is eleven ones then a zero.
        let data = [0xFF, 0x07];
        let mut reader = BitReader::new(&data);
        assert_eq!(table.decode(&mut reader).unwrap(), 11);
    }

    #[test]
    fn test_empty_table() {
        let table = HuffmanTable::from_code_lengths(&[0, 0, 0, 0], 7).unwrap();
        assert!(table.is_empty());

        let data = [0xFF];
        let mut reader = BitReader::new(&data);
        assert!(matches!(
            table.decode(&mut reader),
            Err(SuArcError::InvalidHuffmanCode { .. })
        ));
    }

    #[test]
    fn test_single_symbol_is_incomplete() {
        let table = HuffmanTable::from_code_lengths(&[1, 0, 0, 0], 7).unwrap();

        let data = [0b10u8];
        let mut reader = BitReader::new(&data);
        assert_eq!(table.decode(&mut reader).unwrap(), 0);
        assert!(table.decode(&mut reader).is_err());
    }

    #[test]
    fn test_oversubscribed() {
        assert!(HuffmanTable::from_code_lengths(&[1, 1, 1], 7).is_err());
    }

    #[test]
    fn test_rebuild_reuses_table() {
        let mut table = HuffmanTable::new(LITLEN_TABLE_BITS);
        table.build(&[2, 2, 2, 2]).unwrap();
        table.build(&[1, 1]).unwrap();

        let data = [0b01u8];
        let mut reader = BitReader::new(&data);
        assert_eq!(table.decode(&mut reader).unwrap(), 1);
        assert_eq!(table.decode(&mut reader).unwrap(), 0);
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b101, 3), 0b101);
        assert_eq!(reverse_bits(0b1100, 4), 0b0011);
        assert_eq!(reverse_bits(0b10101010, 8), 0b01010101);
    }
}
