//! Decompress command implementation.

use std::path::{Path, PathBuf};
use suarc_archive::{Compression, ContainerKind};

pub fn cmd_decompress(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let compression = Compression::detect(&data, ContainerKind::Archive);
    if !compression.is_compressed() {
        println!("{} is not SEGS or XCompression wrapped; nothing to do", input.display());
        return Ok(());
    }

    let size = compression.decompressed_size(&data)?;
    let mut out = vec![0u8; size];
    let written = compression.decompress(&data, &mut out)?;
    out.truncate(written);

    let output = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let mut name = input.as_os_str().to_owned();
        name.push(".plain");
        PathBuf::from(name)
    });
    std::fs::write(&output, &out)?;

    println!(
        "Unwrapped {} ({}) into {} ({} bytes)",
        input.display(),
        compression,
        output.display(),
        written
    );
    if written < size {
        println!("Warning: only {} of {} bytes recovered", written, size);
    }
    Ok(())
}
