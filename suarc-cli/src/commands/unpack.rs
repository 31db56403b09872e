//! Unpack command implementation.

use crate::utils::{create_progress_bar, load_archive, matches_filters, safe_output_path};
use std::path::Path;
use suarc_archive::{ArEntry, Container};
use tracing::warn;

pub fn cmd_unpack(
    archive: &Path,
    output: &Path,
    include: &[String],
    exclude: &[String],
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ar = load_archive(archive)?;
    let selected: Vec<ArEntry<'_>> = ar
        .entries()
        .filter(|e| matches_filters(&e.name_str(), include, exclude))
        .collect();

    std::fs::create_dir_all(output)?;
    let pb = create_progress_bar(selected.len() as u64, progress);
    let mut written = 0usize;
    let mut refused = 0usize;

    for entry in &selected {
        let name = entry.name_str();
        pb.set_message(name.to_string());

        let Some(relative) = safe_output_path(&name) else {
            warn!(name = %name, "refusing entry name that escapes the output directory");
            refused += 1;
            pb.inc(1);
            continue;
        };

        let path = output.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, entry.data())?;
        written += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "Unpacked {} of {} entries to {}",
        written,
        selected.len(),
        output.display()
    );
    if refused > 0 {
        println!("Refused {} entries with unsafe names", refused);
    }
    Ok(())
}
