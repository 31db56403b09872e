//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use suarc_archive::{ArEntry, ArlEntry, Archive, Compression, Container, ContainerKind, Linker, Record};
use tracing::debug;

/// A container loaded from disk, unwrapped to plain records.
pub enum Loaded {
    /// AR data archive.
    Archive(Archive),
    /// ARL name linker.
    Linker(Linker),
}

/// Read a container file, unwrapping SEGS/XCompression if needed.
///
/// Returns the plain container and the wrapper it was stored in.
pub fn load(path: &Path) -> Result<(Loaded, Compression), Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let wrapper = match Compression::detect(&data, ContainerKind::Archive) {
        Compression::Segs => Compression::Segs,
        Compression::XCompression => Compression::XCompression,
        _ => Compression::Plain,
    };

    let plain = if wrapper.is_compressed() {
        let size = wrapper.decompressed_size(&data)?;
        let mut out = vec![0u8; size];
        let written = wrapper.decompress(&data, &mut out)?;
        out.truncate(written);
        debug!(path = %path.display(), %wrapper, size, written, "unwrapped");
        out
    } else {
        data
    };

    let loaded = match ContainerKind::sniff(&plain) {
        ContainerKind::Archive => {
            let ar = Archive::from_buffer(plain);
            ensure_plain(path, ar.compression())?;
            Loaded::Archive(ar)
        }
        ContainerKind::Linker => {
            let arl = Linker::from_buffer(plain);
            ensure_plain(path, arl.compression())?;
            Loaded::Linker(arl)
        }
    };
    Ok((loaded, wrapper))
}

/// Load a file that must be an archive.
pub fn load_archive(path: &Path) -> Result<Archive, Box<dyn std::error::Error>> {
    match load(path)?.0 {
        Loaded::Archive(ar) => Ok(ar),
        Loaded::Linker(_) => Err(format!(
            "{} is a linker; linkers list names but hold no data",
            path.display()
        )
        .into()),
    }
}

fn ensure_plain(path: &Path, compression: Compression) -> Result<(), Box<dyn std::error::Error>> {
    if compression.is_plain() {
        Ok(())
    } else {
        Err(format!("{} is not an AR or ARL container", path.display()).into())
    }
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Check if a name matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| Pattern::new(pattern).is_ok_and(|p| p.matches(name));

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Map an entry name to a relative output path.
///
/// Both `/` and `\` separate components. Returns `None` for names that are
/// absolute or climb out of the output directory.
pub fn safe_output_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

/// One listed entry.
#[derive(Debug, Serialize)]
pub struct EntryInfo {
    /// Entry name.
    pub name: String,
    /// Byte offset of the record in the plain container.
    pub offset: usize,
    /// Payload size; absent for linker entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    /// Opaque file date; absent for linker entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filedate: Option<u64>,
}

impl EntryInfo {
    /// Describe an archive entry.
    pub fn from_archive(entry: &ArEntry<'_>) -> Self {
        Self {
            name: entry.name_str().into_owned(),
            offset: entry.position(),
            size: Some(entry.data_size()),
            filedate: Some(entry.filedate()),
        }
    }

    /// Describe a linker entry.
    pub fn from_linker(entry: &ArlEntry<'_>) -> Self {
        Self {
            name: entry.name_str().into_owned(),
            offset: entry.position(),
            size: None,
            filedate: None,
        }
    }
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[EntryInfo], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!("{:>10} {:>10} {:>18}  Name", "Size", "Offset", "Date");
    println!("{}", "-".repeat(60));
    let mut total = 0usize;
    for entry in entries {
        let size = entry.size.map_or_else(|| "-".to_string(), |s| s.to_string());
        let date = entry
            .filedate
            .map_or_else(|| "-".to_string(), |d| format!("{:#018x}", d));
        println!("{:>10} {:>10} {:>18}  {}", size, entry.offset, date, entry.name);
        total += entry.size.unwrap_or(0);
    }
    println!("{}", "-".repeat(60));
    println!("{:>10} {:>10} {:>18}  {} entries", total, "", "", entries.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_filters() {
        let none: Vec<String> = Vec::new();
        let xml = vec!["*.xml".to_string()];
        assert!(matches_filters("stage.set.xml", &none, &none));
        assert!(matches_filters("stage.set.xml", &xml, &none));
        assert!(!matches_filters("sonic.xno", &xml, &none));
        assert!(!matches_filters("stage.set.xml", &none, &xml));
    }

    #[test]
    fn test_safe_output_path() {
        assert_eq!(safe_output_path("a.txt"), Some(PathBuf::from("a.txt")));
        assert_eq!(
            safe_output_path("set\\area03.xml"),
            Some(Path::new("set").join("area03.xml"))
        );
        assert_eq!(safe_output_path("./b.bin"), Some(PathBuf::from("b.bin")));
        assert_eq!(safe_output_path("../evil"), None);
        assert_eq!(safe_output_path("a/../../evil"), None);
        assert_eq!(safe_output_path("/etc/passwd"), None);
        assert_eq!(safe_output_path("."), None);
    }

    #[test]
    fn test_load_detects_kind() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut ar = Archive::with_capacity(128);
        ar.add(b"a", b"1")?;
        let ar_path = dir.path().join("x.ar");
        std::fs::write(&ar_path, ar.as_bytes())?;

        let arl = Linker::from_archives(&[&ar], vec![0u8; 32])?;
        let arl_path = dir.path().join("x.arl");
        std::fs::write(&arl_path, arl.as_bytes())?;

        assert!(matches!(load(&ar_path)?, (Loaded::Archive(_), Compression::Plain)));
        assert!(matches!(load(&arl_path)?, (Loaded::Linker(_), Compression::Plain)));
        assert!(load_archive(&arl_path).is_err());
        Ok(())
    }

    #[test]
    fn test_load_rejects_oversized_segs() -> Result<(), Box<dyn std::error::Error>> {
        use suarc_archive::detect::SEGS_MAGIC;
        use suarc_core::Endian;

        // One chunk descriptor claiming a 4 GiB container.
        let e = Endian::Big;
        let mut file = e.u32_bytes(SEGS_MAGIC).to_vec();
        file.extend_from_slice(&e.u16_bytes(0));
        file.extend_from_slice(&e.u16_bytes(1));
        file.extend_from_slice(&e.u32_bytes(u32::MAX));
        file.extend_from_slice(&e.u32_bytes(32));
        file.extend_from_slice(&e.u16_bytes(8));
        file.extend_from_slice(&e.u16_bytes(8));
        file.extend_from_slice(&e.u32_bytes(0));
        file.extend_from_slice(b"ARCHIVE!");

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("forged.ar");
        std::fs::write(&path, &file)?;

        let err = load(&path).err().ok_or("forged SEGS file loaded")?;
        assert!(err.to_string().contains("exceeds"), "{}", err);
        Ok(())
    }
}
