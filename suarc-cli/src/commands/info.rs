//! Info command implementation.

use crate::utils::{Loaded, load};
use std::path::Path;
use suarc_archive::{Container, ContainerKind};

pub fn cmd_info(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(file)?;
    let (loaded, wrapper) = load(file)?;

    println!("Container Information");
    println!("=====================");
    println!("File: {}", file.display());
    println!("Size: {} bytes", metadata.len());
    println!("Compression: {}", wrapper);

    match loaded {
        Loaded::Archive(ar) => {
            println!("Kind: {}", ContainerKind::Archive);
            println!("Plain size: {} bytes", ar.len());
            if let Some(header) = ar.header() {
                println!();
                println!("Header:");
                println!("  Unknown: {:#010x}", header.unknown);
                println!("  Header size: {}", header.header_size);
                println!("  Entry header size: {}", header.entry_size);
                println!("  Alignment: {}", header.alignment);
            }

            let total: usize = ar.entries().map(|e| e.data_size()).sum();
            println!();
            println!("Contents:");
            println!("  Entries: {}", ar.entry_count());
            println!("  Payload bytes: {}", total);
            if let Err(e) = ar.validate() {
                println!("  Validation: FAILED ({})", e);
            } else {
                println!("  Validation: OK");
            }
        }
        Loaded::Linker(arl) => {
            println!("Kind: {}", ContainerKind::Linker);
            println!("Plain size: {} bytes", arl.len());
            println!();
            println!("Archives: {}", arl.archive_count());
            for (index, size) in arl.archive_sizes().into_iter().enumerate() {
                println!("  [{}] {} bytes", index, size);
            }
            println!();
            println!("Contents:");
            println!("  Names: {}", arl.entry_count());
            if let Err(e) = arl.validate() {
                println!("  Validation: FAILED ({})", e);
            } else {
                println!("  Validation: OK");
            }
        }
    }

    Ok(())
}
