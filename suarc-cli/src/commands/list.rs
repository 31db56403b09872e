//! List command implementation.

use crate::utils::{EntryInfo, Loaded, load, matches_filters, print_entries};
use serde::Serialize;
use std::path::Path;
use suarc_archive::{Compression, Container, ContainerKind};

#[derive(Serialize)]
struct Listing<'a> {
    file: String,
    kind: &'a str,
    compression: String,
    entries: &'a [EntryInfo],
}

pub fn cmd_list(
    file: &Path,
    verbose: bool,
    json: bool,
    include: &[String],
    exclude: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let (loaded, wrapper) = load(file)?;

    let (kind, entries): (ContainerKind, Vec<EntryInfo>) = match &loaded {
        Loaded::Archive(ar) => (
            ContainerKind::Archive,
            ar.entries().map(|e| EntryInfo::from_archive(&e)).collect(),
        ),
        Loaded::Linker(arl) => (
            ContainerKind::Linker,
            arl.entries().map(|e| EntryInfo::from_linker(&e)).collect(),
        ),
    };
    let entries: Vec<EntryInfo> = entries
        .into_iter()
        .filter(|e| matches_filters(&e.name, include, exclude))
        .collect();

    if json {
        let kind = kind.to_string();
        let listing = Listing {
            file: file.display().to_string(),
            kind: &kind,
            compression: wrapper.to_string(),
            entries: &entries,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{}: {} ({})", file.display(), kind, wrapper_label(wrapper));
    println!();
    print_entries(&entries, verbose);
    Ok(())
}

fn wrapper_label(wrapper: Compression) -> String {
    if wrapper.is_compressed() {
        format!("{} compressed", wrapper)
    } else {
        "uncompressed".to_string()
    }
}
