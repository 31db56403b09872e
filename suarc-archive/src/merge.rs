//! Merging several containers into one.
//!
//! Records are copied byte for byte in input order: container 0 first, then
//! 1, and so on. A name is written only the first time it is met. Names of
//! the last container are looked up but never registered, because nothing
//! is scanned after it; two records sharing a name inside the last
//! container therefore both survive.
//!
//! ## Example
//!
//! ```rust
//! use suarc_archive::{Archive, Container, merge_archives};
//!
//! let mut a = Archive::with_capacity(128);
//! a.add(b"x", b"1").unwrap();
//! let mut b = Archive::with_capacity(128);
//! b.add(b"x", b"2").unwrap();
//! b.add(b"y", b"3").unwrap();
//!
//! let merged = merge_archives(&[&a, &b], vec![0u8; 256]);
//! assert_eq!(merged.find(b"x").unwrap().data(), b"1");
//! assert_eq!(merged.find(b"y").unwrap().data(), b"3");
//! ```

use crate::ar::{Archive, ArchiveOptions};
use crate::arl::{Linker, LinkerHeader};
use crate::container::{Container, Record};
use crate::nameset::{DEFAULT_CAPACITY, NameSet};
use tracing::{debug, trace};

/// Merge tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Slots in the dedup set, rounded up to a power of two.
    ///
    /// Must exceed the number of distinct names outside the last
    /// container; a full set panics.
    pub name_capacity: usize,
}

impl MergeOptions {
    /// 1024 dedup slots.
    pub const DEFAULT: Self = Self {
        name_capacity: DEFAULT_CAPACITY,
    };

    /// Set the dedup slot count.
    pub fn with_name_capacity(mut self, name_capacity: usize) -> Self {
        self.name_capacity = name_capacity;
        self
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Visit the records of `containers` that survive deduplication.
fn for_each_unique<'a, C, F>(containers: &[&'a C], options: MergeOptions, mut visit: F)
where
    C: Container,
    F: FnMut(C::Entry<'a>),
{
    let mut seen = NameSet::with_capacity(options.name_capacity);
    let last = containers.len().saturating_sub(1);

    for (index, &container) in containers.iter().enumerate() {
        assert!(
            container.compression().is_plain(),
            "cannot merge container {}: it is {}, decompress it first",
            index,
            container.compression()
        );

        for entry in container.entries() {
            let name = entry.name();
            if seen.contains(name) {
                trace!(container = index, name = %String::from_utf8_lossy(name), "skipping duplicate");
                continue;
            }
            if index != last {
                seen.insert(name);
            }
            visit(entry);
        }
    }
}

/// Merge archives into `out` with default options.
///
/// # Panics
///
/// Panics if an input is not plain or the result does not fit `out`.
pub fn merge_archives<B, O>(archives: &[&Archive<B>], out: O) -> Archive<O>
where
    B: AsRef<[u8]>,
    O: AsRef<[u8]> + AsMut<[u8]>,
{
    merge_archives_with(archives, out, MergeOptions::DEFAULT)
}

/// Merge archives into `out`.
///
/// The output header takes the first input's alignment.
pub fn merge_archives_with<B, O>(archives: &[&Archive<B>], out: O, options: MergeOptions) -> Archive<O>
where
    B: AsRef<[u8]>,
    O: AsRef<[u8]> + AsMut<[u8]>,
{
    let layout = archives
        .first()
        .map(|ar| ArchiveOptions::DEFAULT.with_alignment(ar.options().alignment))
        .unwrap_or_default();

    let mut merged = Archive::create_with_options(out, layout);
    let mut copied = 0usize;
    for_each_unique(archives, options, |entry| {
        merged.push_raw(entry.raw());
        copied += 1;
    });

    debug!(
        inputs = archives.len(),
        entries = copied,
        len = merged.len(),
        "merged archives"
    );
    merged
}

/// Merge linkers into `out` with default options.
///
/// # Panics
///
/// Panics if `linkers` is empty, an input is not plain, or the result does
/// not fit `out`.
pub fn merge_linkers<B, O>(linkers: &[&Linker<B>], out: O) -> Linker<O>
where
    B: AsRef<[u8]>,
    O: AsRef<[u8]> + AsMut<[u8]>,
{
    merge_linkers_with(linkers, out, MergeOptions::DEFAULT)
}

/// Merge linkers into `out`.
///
/// The output references as many archives as the widest input, and each
/// size slot is the sum of the inputs' slots.
pub fn merge_linkers_with<B, O>(linkers: &[&Linker<B>], out: O, options: MergeOptions) -> Linker<O>
where
    B: AsRef<[u8]>,
    O: AsRef<[u8]> + AsMut<[u8]>,
{
    let archive_count = linkers.iter().map(|l| l.archive_count()).max().unwrap_or(0);
    let mut header = LinkerHeader::new(archive_count);
    for linker in linkers {
        for (total, size) in header.archive_sizes.iter_mut().zip(linker.archive_sizes()) {
            *total = total.wrapping_add(size);
        }
    }

    let mut merged = Linker::create(out, archive_count);
    for (index, &size) in header.archive_sizes.iter().enumerate() {
        merged.set_archive_size(index, size);
    }

    let mut copied = 0usize;
    for_each_unique(linkers, options, |entry| {
        merged.push_raw(entry.raw());
        copied += 1;
    });

    debug!(
        inputs = linkers.len(),
        entries = copied,
        len = merged.len(),
        "merged linkers"
    );
    merged
}
