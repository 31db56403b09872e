//! Container compression detection.
//!
//! The first four bytes of a container buffer tell plain records apart from
//! the two compressed wrappers. Magic numbers are matched in both byte
//! orders with [`Endian::probe`], so detection does not depend on the host.

use crate::{segs, xcompress};
use suarc_core::Endian;
use suarc_core::error::{Result, SuArcError};

/// Linker magic, `"ARL2"` read little-endian.
pub const ARL_MAGIC: u32 = 0x324C_5241;

/// XCompression magic as stored by the console (bytes `0F F5 12 EE`).
///
/// A little-endian host reading the same bytes sees `0xEE12F50F`.
pub const XCOMPRESSION_MAGIC: u32 = 0x0FF5_12EE;

/// SEGS magic, the bytes `"sges"` read big-endian.
pub const SEGS_MAGIC: u32 = 0x7367_6573;

/// The two container kinds sharing the record engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// AR data archive.
    Archive,
    /// ARL name linker.
    Linker,
}

impl ContainerKind {
    /// Guess the kind of a plain buffer from its magic.
    ///
    /// Anything without the linker magic is taken for an archive.
    pub fn sniff(bytes: &[u8]) -> Self {
        match magic(bytes) {
            Some(m) if Endian::probe(m, ARL_MAGIC) == Some(Endian::Little) => Self::Linker,
            _ => Self::Archive,
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Archive => "ar",
            Self::Linker => "arl",
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Archive => write!(f, "AR"),
            Self::Linker => write!(f, "ARL"),
        }
    }
}

/// Compression state of a container buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain records; the container can be read and mutated.
    Plain,
    /// SEGS chunked DEFLATE wrapper.
    Segs,
    /// XCompression block wrapper (partially supported).
    XCompression,
    /// The buffer is not a container of the expected kind.
    Invalid,
}

impl Compression {
    /// Classify a buffer expected to hold a container of `kind`.
    ///
    /// A linker buffer handed to the archive engine (and vice versa) is
    /// `Invalid`, as is a buffer too short for the kind's fixed header.
    pub fn detect(bytes: &[u8], kind: ContainerKind) -> Self {
        let Some(m) = magic(bytes) else {
            return Self::Invalid;
        };

        if Endian::probe(m, SEGS_MAGIC).is_some() {
            return Self::Segs;
        }
        if Endian::probe(m, XCOMPRESSION_MAGIC).is_some() {
            return Self::XCompression;
        }

        let is_linker = Endian::probe(m, ARL_MAGIC) == Some(Endian::Little);
        match kind {
            ContainerKind::Archive if is_linker => Self::Invalid,
            ContainerKind::Archive if bytes.len() < crate::ar::HEADER_SIZE => Self::Invalid,
            ContainerKind::Archive => Self::Plain,
            ContainerKind::Linker if is_linker => Self::Plain,
            ContainerKind::Linker => Self::Invalid,
        }
    }

    /// Whether records can be read directly.
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain)
    }

    /// Whether the buffer must be decompressed first.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Segs | Self::XCompression)
    }

    /// Size of the plain container held in `bytes`.
    ///
    /// For `Plain` this is `bytes.len()`; for the wrappers it is the size
    /// declared in their header, rejected when it is larger than the rest
    /// of the file could expand to.
    pub fn decompressed_size(&self, bytes: &[u8]) -> Result<usize> {
        match self {
            Self::Plain => Ok(bytes.len()),
            Self::Segs => segs::SegsHeader::read(bytes)?.checked_size(bytes.len()),
            Self::XCompression => {
                xcompress::XCompressionHeader::read(bytes)?.checked_size(bytes.len())
            }
            Self::Invalid => Err(SuArcError::unsupported_compression("invalid container")),
        }
    }

    /// Unwrap `bytes` into `out`, returning the plain length.
    ///
    /// # Panics
    ///
    /// Panics if `out` is smaller than [`decompressed_size`].
    ///
    /// [`decompressed_size`]: Compression::decompressed_size
    pub fn decompress(&self, bytes: &[u8], out: &mut [u8]) -> Result<usize> {
        match self {
            Self::Plain => {
                assert!(
                    out.len() >= bytes.len(),
                    "output buffer of {} bytes is smaller than the container size {}",
                    out.len(),
                    bytes.len()
                );
                out[..bytes.len()].copy_from_slice(bytes);
                Ok(bytes.len())
            }
            Self::Segs => segs::decompress(bytes, out),
            Self::XCompression => xcompress::decompress(bytes, out),
            Self::Invalid => Err(SuArcError::unsupported_compression("invalid container")),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "none"),
            Self::Segs => write!(f, "SEGS"),
            Self::XCompression => write!(f, "XCompression"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

fn magic(bytes: &[u8]) -> Option<[u8; 4]> {
    bytes.first_chunk::<4>().copied()
}
