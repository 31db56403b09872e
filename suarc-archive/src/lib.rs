//! # suarc Archive
//!
//! In-buffer engines for the AR data archive and ARL name linker
//! containers, plus the SEGS and XCompression wrappers around them.
//!
//! - [`Archive`]: AR records (header, NUL-terminated name, payload)
//! - [`Linker`]: ARL records (length-prefixed names) with per-archive size
//!   bookkeeping
//! - [`merge`]: first-occurrence-wins merging of N containers
//! - [`detect`]: magic-based compression detection
//! - [`segs`], [`xcompress`]: unwrapping into plain containers
//!
//! Containers never reallocate. Every mutation shifts the packed records
//! inside the capacity handed over at construction; running out of room is
//! a caller bug and panics.
//!
//! ## Example
//!
//! ```rust
//! use suarc_archive::prelude::*;
//!
//! let mut ar = Archive::with_capacity(1024);
//! ar.add(b"area03.set.xml", b"<SetObject/>").unwrap();
//! ar.add(b"readme.txt", b"hi").unwrap();
//!
//! let arl = Linker::from_archives(&[&ar], vec![0u8; 64]).unwrap();
//! assert!(arl.contains(b"readme.txt"));
//!
//! let reopened = Archive::from_buffer(ar.as_bytes());
//! assert_eq!(reopened.compression(), Compression::Plain);
//! assert_eq!(reopened.entry_count(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod ar;
pub mod arl;
pub mod buffer;
pub mod container;
pub mod detect;
pub mod merge;
pub mod nameset;
pub mod segs;
pub mod xcompress;

// Re-exports
pub use ar::{ArEntry, Archive, ArchiveHeader, ArchiveOptions, EntryHeader};
pub use arl::{ArlEntry, Linker, LinkerHeader};
pub use buffer::RecordBuffer;
pub use container::{Container, Record, Records};
pub use detect::{Compression, ContainerKind};
pub use merge::{MergeOptions, merge_archives, merge_archives_with, merge_linkers, merge_linkers_with};
pub use nameset::NameSet;
pub use segs::SegsHeader;
pub use xcompress::XCompressionHeader;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::ar::{ArEntry, Archive, ArchiveOptions};
    pub use crate::arl::{ArlEntry, Linker};
    pub use crate::container::{Container, Record};
    pub use crate::detect::{Compression, ContainerKind};
    pub use crate::merge::{MergeOptions, merge_archives, merge_linkers};
    pub use suarc_core::error::{Result, SuArcError};
}
