//! Fixed Huffman code tables and length/distance bases for DEFLATE (RFC 1951).

use crate::huffman::{DISTANCE_TABLE_BITS, HuffmanTable, LITLEN_TABLE_BITS};
use std::sync::OnceLock;

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);
    lengths
}

/// Fixed distance code lengths (RFC 1951 Section 3.2.6).
///
/// All 30 distance codes use 5 bits; codes 30 and 31 stay unassigned.
pub fn fixed_distance_lengths() -> [u8; 30] {
    [5u8; 30]
}

/// Get the fixed literal/length decode table.
///
/// This table is cached after first construction.
pub fn fixed_litlen_table() -> &'static HuffmanTable {
    static TABLE: OnceLock<HuffmanTable> = OnceLock::new();

    TABLE.get_or_init(|| {
        HuffmanTable::from_code_lengths(&fixed_litlen_lengths(), LITLEN_TABLE_BITS)
            .expect("Fixed litlen table construction should never fail")
    })
}

/// Get the fixed distance decode table.
///
/// This table is cached after first construction.
pub fn fixed_distance_table() -> &'static HuffmanTable {
    static TABLE: OnceLock<HuffmanTable> = OnceLock::new();

    TABLE.get_or_init(|| {
        HuffmanTable::from_code_lengths(&fixed_distance_lengths(), DISTANCE_TABLE_BITS)
            .expect("Fixed distance table construction should never fail")
    })
}

/// Length code base values (RFC 1951 Section 3.2.5).
///
/// For length codes 257-285, this gives the base length value.
/// Extra bits are added to get the final length.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264: 0 extra bits
    11, 13, 15, 17, // 265-268: 1 extra bit
    19, 23, 27, 31, // 269-272: 2 extra bits
    35, 43, 51, 59, // 273-276: 3 extra bits
    67, 83, 99, 115, // 277-280: 4 extra bits
    131, 163, 195, 227, // 281-284: 5 extra bits
    258, // 285: 0 extra bits (special case)
];

/// Number of extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Distance code base values (RFC 1951 Section 3.2.5).
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, // 0-3: 0 extra bits
    5, 7, // 4-5: 1 extra bit
    9, 13, // 6-7: 2 extra bits
    17, 25, // 8-9: 3 extra bits
    33, 49, // 10-11: 4 extra bits
    65, 97, // 12-13: 5 extra bits
    129, 193, // 14-15: 6 extra bits
    257, 385, // 16-17: 7 extra bits
    513, 769, // 18-19: 8 extra bits
    1025, 1537, // 20-21: 9 extra bits
    2049, 3073, // 22-23: 10 extra bits
    4097, 6145, // 24-25: 11 extra bits
    8193, 12289, // 26-27: 12 extra bits
    16385, 24577, // 28-29: 13 extra bits
];

/// Number of extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, // 0-3
    1, 1, // 4-5
    2, 2, // 6-7
    3, 3, // 8-9
    4, 4, // 10-11
    5, 5, // 12-13
    6, 6, // 14-15
    7, 7, // 16-17
    8, 8, // 18-19
    9, 9, // 20-21
    10, 10, // 22-23
    11, 11, // 24-25
    12, 12, // 26-27
    13, 13, // 28-29
];

/// Order of code length codes in dynamic block header.
///
/// Code length codes are transmitted in this order (RFC 1951 Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Decode a length from a length code and extra bits.
pub fn decode_length(code: u16, extra: u32) -> usize {
    debug_assert!((257..=285).contains(&code), "Invalid length code: {}", code);
    LENGTH_BASE[(code - 257) as usize] as usize + extra as usize
}

/// Decode a distance from a distance code and extra bits.
pub fn decode_distance(code: u16, extra: u32) -> usize {
    debug_assert!(code < 30, "Invalid distance code: {}", code);
    DISTANCE_BASE[code as usize] as usize + extra as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use suarc_core::BitReader;

    #[test]
    fn test_fixed_litlen_lengths() {
        let lengths = fixed_litlen_lengths();

        assert_eq!(lengths[0], 8);
        assert_eq!(lengths[143], 8);
        assert_eq!(lengths[144], 9);
        assert_eq!(lengths[255], 9);
        assert_eq!(lengths[256], 7); // End of block
        assert_eq!(lengths[279], 7);
        assert_eq!(lengths[280], 8);
        assert_eq!(lengths[287], 8);
    }

    #[test]
    fn test_fixed_tables_fit_primary_level() {
        // 9-bit literals fit the 10-bit primary level; no sub-tables needed.
        assert_eq!(fixed_litlen_table().len(), 1 << LITLEN_TABLE_BITS);
        assert_eq!(fixed_distance_table().len(), 1 << DISTANCE_TABLE_BITS);
    }

    #[test]
    fn test_fixed_end_of_block() {
        // End of block is the 7-bit all-zero code.
        let data = [0x00];
        let mut reader = BitReader::new(&data);
        assert_eq!(fixed_litlen_table().decode(&mut reader).unwrap(), 256);
        assert_eq!(reader.bit_position(), 7);
    }

    #[test]
    fn test_decode_bounds() {
        assert_eq!(decode_length(257, 0), 3);
        assert_eq!(decode_length(284, 31), 258);
        assert_eq!(decode_length(285, 0), 258);
        assert_eq!(decode_distance(0, 0), 1);
        assert_eq!(decode_distance(29, 8191), 32768);
    }
}
