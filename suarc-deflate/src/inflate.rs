//! DEFLATE decompression (inflate).
//!
//! This module implements the DEFLATE decompression algorithm as specified
//! in RFC 1951. It supports all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! Decoding writes straight into a caller-supplied output slice and never
//! grows it. Malformed input, a truncated stream, or a full output slice
//! all stop decoding early; the bytes produced up to that point are
//! reported instead of an error.

use crate::huffman::{
    CODELEN_ALPHABET_SIZE, CODELEN_TABLE_BITS, DISTANCE_ALPHABET_SIZE, DISTANCE_TABLE_BITS,
    END_OF_BLOCK, HuffmanTable, LITLEN_ALPHABET_SIZE, LITLEN_TABLE_BITS,
};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS, decode_distance, decode_length,
    fixed_distance_table, fixed_litlen_table,
};
use suarc_core::BitReader;
use suarc_core::error::{Result, SuArcError};
use tracing::{debug, trace};

/// Maximum back-reference distance in DEFLATE (32KB).
pub const MAX_DISTANCE: usize = 32768;

/// Why decoding stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateStatus {
    /// The final block ended normally.
    Done,
    /// The output slice filled up before the stream ended.
    OutputFull,
    /// The input ended in the middle of a block.
    InputExhausted,
    /// The stream is malformed (bad block type, LEN/NLEN mismatch, invalid
    /// code or distance).
    Corrupted,
}

/// Outcome of one [`Inflater::decompress`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inflated {
    /// Input bytes consumed, counting a partially read byte.
    pub consumed: usize,
    /// Output bytes produced.
    pub written: usize,
    /// Why decoding stopped.
    pub status: InflateStatus,
}

impl Inflated {
    /// Whether the stream decoded completely.
    pub fn is_done(&self) -> bool {
        self.status == InflateStatus::Done
    }
}

/// Decoder states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Reading BFINAL and BTYPE.
    Header,
    /// Copying a stored block.
    Stored,
    /// Installing the fixed code tables.
    Fixed,
    /// Reading the code tables of a dynamic block.
    Dynamic,
    /// Decoding literals and matches until end of block.
    Bulk,
    /// Final block finished.
    Done,
}

/// Bounded output window over the caller's slice.
///
/// Match copies read from bytes already written to the same slice.
struct OutputWindow<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> OutputWindow<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn room(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn push(&mut self, byte: u8) -> Result<()> {
        if self.pos == self.buf.len() {
            return Err(SuArcError::buffer_too_small(self.pos + 1, self.buf.len()));
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    /// Copy raw bytes, keeping as many as fit.
    fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        let room = self.room();
        let n = bytes.len().min(room);
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        if n < bytes.len() {
            return Err(SuArcError::buffer_too_small(bytes.len(), room));
        }
        Ok(())
    }

    /// Copy `length` bytes starting `distance` bytes back.
    ///
    /// A match longer than the remaining room is truncated to it and
    /// reported as `BufferTooSmall`. The wide paths may scribble past the
    /// end of the match (never past the slice); those bytes are rewritten
    /// by whatever comes next.
    fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.pos {
            return Err(SuArcError::invalid_distance(distance, self.pos));
        }

        let room = self.room();
        let copy = length.min(room);
        let src = self.pos - distance;
        let dst = self.pos;

        if distance == 1 {
            // Run of a single byte
            let byte = self.buf[src];
            self.buf[dst..dst + copy].fill(byte);
        } else if distance >= 16 && copy.next_multiple_of(16) <= room {
            for i in (0..copy).step_by(16) {
                self.buf.copy_within(src + i..src + i + 16, dst + i);
            }
        } else if distance >= 8 && copy.next_multiple_of(8) <= room {
            for i in (0..copy).step_by(8) {
                self.buf.copy_within(src + i..src + i + 8, dst + i);
            }
        } else {
            for i in 0..copy {
                self.buf[dst + i] = self.buf[src + i];
            }
        }

        self.pos += copy;
        if copy < length {
            return Err(SuArcError::buffer_too_small(length, room));
        }
        Ok(())
    }
}

/// DEFLATE decompressor.
///
/// Holds the decode tables so repeated calls (one per SEGS chunk, for
/// instance) reuse their allocations. Each [`decompress`] call decodes one
/// complete stream from the start.
///
/// [`decompress`]: Inflater::decompress
#[derive(Debug, Clone)]
pub struct Inflater {
    /// Literal/length table of the current block.
    litlen: HuffmanTable,
    /// Distance table of the current block.
    distance: HuffmanTable,
    /// Code length table of the current dynamic header.
    code_length: HuffmanTable,
    /// Scratch for dynamic code lengths.
    lengths: [u8; LITLEN_ALPHABET_SIZE + DISTANCE_ALPHABET_SIZE],
}

impl Inflater {
    /// Create a new DEFLATE decompressor.
    pub fn new() -> Self {
        Self {
            litlen: HuffmanTable::new(LITLEN_TABLE_BITS),
            distance: HuffmanTable::new(DISTANCE_TABLE_BITS),
            code_length: HuffmanTable::new(CODELEN_TABLE_BITS),
            lengths: [0; LITLEN_ALPHABET_SIZE + DISTANCE_ALPHABET_SIZE],
        }
    }

    /// Decode a raw DEFLATE stream from `input` into `output`.
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Inflated {
        let mut reader = BitReader::new(input);
        let mut window = OutputWindow::new(output);

        let status = match self.run(&mut reader, &mut window) {
            Ok(()) => InflateStatus::Done,
            Err(SuArcError::UnexpectedEof { .. }) => InflateStatus::InputExhausted,
            Err(SuArcError::BufferTooSmall { .. }) => InflateStatus::OutputFull,
            Err(e) => {
                debug!(
                    bit_position = reader.bit_position(),
                    written = window.pos,
                    "inflate stopped on corrupt data: {}",
                    e
                );
                InflateStatus::Corrupted
            }
        };

        let inflated = Inflated {
            consumed: reader.bytes_consumed(),
            written: window.pos,
            status,
        };
        trace!(?inflated, "inflate finished");
        inflated
    }

    fn run(&mut self, reader: &mut BitReader<'_>, window: &mut OutputWindow<'_>) -> Result<()> {
        let mut state = State::Header;
        let mut final_block = false;

        loop {
            state = match state {
                State::Header => {
                    if final_block {
                        State::Done
                    } else {
                        final_block = reader.read_bit()?;
                        match reader.read_bits(2)? {
                            0 => State::Stored,
                            1 => State::Fixed,
                            2 => State::Dynamic,
                            _ => return Err(SuArcError::invalid_header("Reserved block type 3")),
                        }
                    }
                }
                State::Stored => {
                    Self::copy_stored(reader, window)?;
                    State::Header
                }
                State::Fixed => {
                    self.litlen.clone_from(fixed_litlen_table());
                    self.distance.clone_from(fixed_distance_table());
                    State::Bulk
                }
                State::Dynamic => {
                    self.read_dynamic_tables(reader)?;
                    State::Bulk
                }
                State::Bulk => {
                    self.decode_block(reader, window)?;
                    State::Header
                }
                State::Done => return Ok(()),
            };
        }
    }

    /// Copy a stored (uncompressed) block.
    fn copy_stored(reader: &mut BitReader<'_>, window: &mut OutputWindow<'_>) -> Result<()> {
        reader.align_to_byte();

        let len = reader.read_bits(16)? as u16;
        let nlen = reader.read_bits(16)? as u16;
        if len != !nlen {
            return Err(SuArcError::corrupted(
                reader.bytes_consumed() as u64,
                format!("LEN/NLEN mismatch: {} vs {}", len, !nlen),
            ));
        }

        let bytes = reader.take_bytes(len as usize)?;
        window.extend(bytes)
    }

    /// Read the code tables of a dynamic block.
    fn read_dynamic_tables(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        let hlit = reader.read_bits(5)? as usize + 257;
        let hdist = reader.read_bits(5)? as usize + 1;
        let hclen = reader.read_bits(4)? as usize + 4;

        if hlit > 286 || hdist > 30 {
            return Err(SuArcError::corrupted(
                reader.bytes_consumed() as u64,
                format!("Too many codes: {} literal/length, {} distance", hlit, hdist),
            ));
        }

        let mut code_length_lengths = [0u8; CODELEN_ALPHABET_SIZE];
        for &symbol in &CODE_LENGTH_ORDER[..hclen] {
            code_length_lengths[symbol] = reader.read_bits(3)? as u8;
        }
        self.code_length.build(&code_length_lengths)?;

        let total = hlit + hdist;
        let lengths = &mut self.lengths[..total];
        lengths.fill(0);

        let mut i = 0;
        while i < total {
            let symbol = self.code_length.decode(reader)?;
            let (value, repeat) = match symbol {
                0..=15 => {
                    lengths[i] = symbol as u8;
                    i += 1;
                    continue;
                }
                16 => {
                    if i == 0 {
                        return Err(SuArcError::corrupted(
                            reader.bytes_consumed() as u64,
                            "Code 16 at start of lengths",
                        ));
                    }
                    (lengths[i - 1], reader.read_bits(2)? as usize + 3)
                }
                17 => (0, reader.read_bits(3)? as usize + 3),
                18 => (0, reader.read_bits(7)? as usize + 11),
                _ => return Err(SuArcError::invalid_huffman(reader.bit_position())),
            };

            if i + repeat > total {
                return Err(SuArcError::corrupted(
                    reader.bytes_consumed() as u64,
                    "Code length overflow",
                ));
            }
            lengths[i..i + repeat].fill(value);
            i += repeat;
        }

        if lengths[END_OF_BLOCK as usize] == 0 {
            return Err(SuArcError::corrupted(
                reader.bytes_consumed() as u64,
                "Missing end-of-block code",
            ));
        }

        self.litlen.build(&lengths[..hlit])?;
        self.distance.build(&lengths[hlit..])?;
        Ok(())
    }

    /// Decode literals and matches until end of block.
    fn decode_block(
        &mut self,
        reader: &mut BitReader<'_>,
        window: &mut OutputWindow<'_>,
    ) -> Result<()> {
        loop {
            let symbol = self.litlen.decode(reader)?;

            match symbol {
                0..=255 => window.push(symbol as u8)?,
                END_OF_BLOCK => return Ok(()),
                257..=285 => {
                    let length_idx = (symbol - 257) as usize;
                    let extra = reader.read_bits(LENGTH_EXTRA_BITS[length_idx])?;
                    let length = decode_length(symbol, extra);

                    let dist_code = self.distance.decode(reader)?;
                    if dist_code >= 30 {
                        return Err(SuArcError::corrupted(
                            reader.bytes_consumed() as u64,
                            format!("Invalid distance code: {}", dist_code),
                        ));
                    }
                    let extra = reader.read_bits(DISTANCE_EXTRA_BITS[dist_code as usize])?;
                    let distance = decode_distance(dist_code, extra);

                    window.copy_match(distance, length)?;
                }
                _ => {
                    return Err(SuArcError::corrupted(
                        reader.bytes_consumed() as u64,
                        format!("Invalid literal/length code: {}", symbol),
                    ));
                }
            }
        }
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a raw DEFLATE stream into `output`, returning the bytes written.
///
/// The count is short of the true size when the stream is truncated or
/// corrupt, or when `output` is too small.
pub fn inflate_into(input: &[u8], output: &mut [u8]) -> usize {
    Inflater::new().decompress(input, output).written
}

/// Decode a raw DEFLATE stream into a new vector of at most `max_output`
/// bytes.
pub fn inflate(input: &[u8], max_output: usize) -> Vec<u8> {
    let mut output = vec![0u8; max_output];
    let written = inflate_into(input, &mut output);
    output.truncate(written);
    output
}
