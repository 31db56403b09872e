//! Link command implementation.

use crate::utils::load_archive;
use std::path::{Path, PathBuf};
use suarc_archive::arl::header_size;
use suarc_archive::{Archive, Container, Linker, Record};

pub fn cmd_link(output: &Path, archives: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = archives
        .iter()
        .map(|path| load_archive(path))
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&Archive> = loaded.iter().collect();

    let names: usize = loaded
        .iter()
        .flat_map(|ar| ar.entries().map(|e| 1 + e.name().len()))
        .sum();
    let linker = Linker::from_archives(&refs, vec![0u8; header_size(refs.len()) + names])?;

    std::fs::write(output, linker.as_bytes())?;
    println!(
        "Linked {} names from {} archives into {}",
        linker.entry_count(),
        refs.len(),
        output.display()
    );
    Ok(())
}
