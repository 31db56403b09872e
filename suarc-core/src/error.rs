//! Error types for suarc operations.
//!
//! Only recoverable conditions are represented here: I/O failures, malformed
//! headers, and the logical failures of the container engines (duplicate or
//! missing entry names). Precondition violations such as an undersized
//! buffer are programmer errors and panic at the call site instead.

use std::io;
use thiserror::Error;

/// The main error type for suarc operations.
#[derive(Debug, Error)]
pub enum SuArcError {
    /// I/O error from loading or writing a container file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number at the start of a buffer.
    #[error("Invalid magic number: expected {expected:#010x}, found {found:#010x}")]
    InvalidMagic {
        /// Expected magic value.
        expected: u32,
        /// Actual magic value found.
        found: u32,
    },

    /// Container compression scheme not understood by this operation.
    #[error("Unsupported compression: {scheme}")]
    UnsupportedCompression {
        /// Name of the compression scheme.
        scheme: String,
    },

    /// Invalid Huffman code encountered during decompression.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Corrupted data in a container or compressed stream.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Invalid header format.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of data: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// Output buffer too small for the operation.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// Back-reference reaching before the start of the output.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes produced so far.
        history_size: usize,
    },

    /// An entry with this name already exists in the container.
    #[error("Entry already exists: {name}")]
    EntryExists {
        /// Name of the duplicate entry.
        name: String,
    },

    /// Entry not found in the container.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name of the missing entry.
        name: String,
    },

    /// Entry name that cannot be stored in the container.
    #[error("Invalid entry name {name:?}: {message}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        message: String,
    },
}

/// Result type alias for suarc operations.
pub type Result<T> = std::result::Result<T, SuArcError>;

/// Render raw name bytes for error messages.
fn display_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

impl SuArcError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: u32, found: u32) -> Self {
        Self::InvalidMagic { expected, found }
    }

    /// Create an unsupported compression error.
    pub fn unsupported_compression(scheme: impl Into<String>) -> Self {
        Self::UnsupportedCompression {
            scheme: scheme.into(),
        }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create an entry exists error from raw name bytes.
    pub fn entry_exists(name: &[u8]) -> Self {
        Self::EntryExists {
            name: display_name(name),
        }
    }

    /// Create an entry not found error from raw name bytes.
    pub fn entry_not_found(name: &[u8]) -> Self {
        Self::EntryNotFound {
            name: display_name(name),
        }
    }

    /// Create an invalid name error from raw name bytes.
    pub fn invalid_name(name: &[u8], message: impl Into<String>) -> Self {
        Self::InvalidName {
            name: display_name(name),
            message: message.into(),
        }
    }
}
