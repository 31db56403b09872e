//! Pack command implementation.

use std::path::{Path, PathBuf};
use suarc_archive::ar::{HEADER_SIZE, record_size};
use suarc_archive::{Archive, ArchiveOptions, Container};
use tracing::debug;

pub fn cmd_pack(
    archive: &Path,
    files: &[PathBuf],
    align: bool,
    alignment: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if alignment == 0 {
        return Err("alignment must be at least 1".into());
    }

    let mut inputs = Vec::with_capacity(files.len());
    for path in files {
        if !path.is_file() {
            return Err(format!("{} is not a regular file", path.display()).into());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("{} has no usable file name", path.display()))?
            .to_string();
        inputs.push((name, std::fs::read(path)?));
    }

    // Worst case: every record padded by a full alignment.
    let padding = if align { alignment as usize } else { 0 };
    let capacity = HEADER_SIZE
        + inputs
            .iter()
            .map(|(name, data)| record_size(name.len(), data.len()) + padding)
            .sum::<usize>();

    let options = ArchiveOptions {
        alignment,
        align_payloads: align,
    };
    let mut ar = Archive::with_capacity_and_options(capacity, options);
    for (name, data) in &inputs {
        ar.add(name.as_bytes(), data)?;
        debug!(name = %name, size = data.len(), "packed");
    }

    std::fs::write(archive, ar.as_bytes())?;
    println!(
        "Packed {} files into {} ({} bytes)",
        inputs.len(),
        archive.display(),
        ar.len()
    );
    Ok(())
}
