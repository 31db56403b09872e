//! Merge command implementation.

use crate::utils::load_archive;
use std::path::{Path, PathBuf};
use suarc_archive::ar::HEADER_SIZE;
use suarc_archive::arl::header_size;
use suarc_archive::merge_archives_with;
use suarc_archive::{Archive, Container, Linker, MergeOptions, Record};

pub fn cmd_merge(output: &Path, inputs: &[PathBuf], arl: bool) -> Result<(), Box<dyn std::error::Error>> {
    let archives = inputs
        .iter()
        .map(|path| load_archive(path))
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&Archive> = archives.iter().collect();

    let names: usize = archives.iter().map(|ar| ar.entry_count()).sum();
    let options = MergeOptions::DEFAULT.with_name_capacity(2 * names.max(1));
    let capacity = archives.iter().map(|ar| ar.len()).sum::<usize>().max(HEADER_SIZE);

    let merged = merge_archives_with(&refs, vec![0u8; capacity], options);
    std::fs::write(output, merged.as_bytes())?;
    println!(
        "Merged {} archives into {} ({} entries, {} bytes)",
        archives.len(),
        output.display(),
        merged.entry_count(),
        merged.len()
    );

    if arl {
        let capacity = header_size(1)
            + merged
                .entries()
                .map(|e| 1 + e.name().len())
                .sum::<usize>();
        let linker = Linker::from_archives(&[&merged], vec![0u8; capacity])?;
        let path = linker_path(output);
        std::fs::write(&path, linker.as_bytes())?;
        println!("Wrote linker {}", path.display());
    }
    Ok(())
}

/// `Stage.ar.00` becomes `Stage.arl`; anything else gets `.arl` appended.
fn linker_path(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.find(".ar") {
        Some(at) if at > 0 => &name[..at],
        _ => name.as_str(),
    };
    archive.with_file_name(format!("{}.arl", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linker_path() {
        assert_eq!(linker_path(Path::new("out/Stage.ar.00")), Path::new("out/Stage.arl"));
        assert_eq!(linker_path(Path::new("Mod.ar")), Path::new("Mod.arl"));
        assert_eq!(linker_path(Path::new("merged")), Path::new("merged.arl"));
    }
}
