//! # suarc Deflate
//!
//! Pure Rust DEFLATE decoder (RFC 1951) for the chunks inside SEGS-wrapped
//! archives.
//!
//! ## Features
//!
//! - **Decompression only**: every DEFLATE block type
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - Two-level canonical Huffman tables (10/8/7-bit primary widths)
//! - Bounded output: decoding never grows or overruns the caller's slice
//!
//! ## Example
//!
//! ```rust
//! use suarc_deflate::{InflateStatus, Inflater, inflate};
//!
//! // Raw fixed-Huffman stream for "hello"
//! let compressed = [0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00];
//! assert_eq!(inflate(&compressed, 64), b"hello");
//!
//! // Too little room: the prefix that fits is kept
//! let mut out = [0u8; 2];
//! let result = Inflater::new().decompress(&compressed, &mut out);
//! assert_eq!(result.status, InflateStatus::OutputFull);
//! assert_eq!(&out, b"he");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod inflate;
pub mod tables;

// Re-exports
pub use huffman::HuffmanTable;
pub use inflate::{InflateStatus, Inflated, Inflater, inflate, inflate_into};
