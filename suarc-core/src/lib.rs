//! # suarc Core
//!
//! Core components shared by the suarc crates.
//!
//! - [`bitstream`]: LSB-first bit reader over an in-memory slice
//! - [`endian`]: explicit little/big-endian field decoding
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! suarc is layered the same way an archive stack usually is:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     suarc list / unpack / pack / merge / decompress     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     AR / ARL record engines, merge, SEGS, XCompression  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Raw DEFLATE (canonical Huffman + LZ77)              │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     BitReader, Endian, SuArcError                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use suarc_core::{BitReader, Endian};
//!
//! let header = [b's', b'g', b'e', b's', 0x00, 0x00, 0x00, 0x02];
//! let order = Endian::probe([header[0], header[1], header[2], header[3]], 0x73676573);
//! assert_eq!(order, Some(Endian::Big));
//! assert_eq!(Endian::Big.read_u16(&header, 6).unwrap(), 2);
//!
//! let mut reader = BitReader::new(&header[4..]);
//! assert_eq!(reader.read_bits(16).unwrap(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod endian;
pub mod error;

// Re-exports for convenience
pub use bitstream::BitReader;
pub use endian::Endian;
pub use error::{Result, SuArcError};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::BitReader;
    pub use crate::endian::Endian;
    pub use crate::error::{Result, SuArcError};
}
