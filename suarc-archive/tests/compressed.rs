use flate2::Compression as Level;
use flate2::write::DeflateEncoder;
use std::io::Write;
use suarc_archive::detect::{SEGS_MAGIC, XCOMPRESSION_MAGIC};
use suarc_archive::prelude::*;
use suarc_core::Endian;

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Level::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Wrap `plain` into big-endian SEGS, splitting it into `chunk_size`
/// pieces. Even-numbered chunks are deflated, odd ones stored.
fn segs(plain: &[u8], chunk_size: usize, first_offset_zero: bool) -> Vec<u8> {
    let chunks: Vec<(Vec<u8>, usize)> = plain
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, piece)| {
            let packed = deflate(piece);
            // Equal sizes would read back as a stored chunk.
            if i % 2 == 0 && packed.len() != piece.len() {
                (packed, piece.len())
            } else {
                (piece.to_vec(), piece.len())
            }
        })
        .collect();

    let e = Endian::Big;
    let table_end = 16 + 8 * chunks.len();
    let mut out = e.u32_bytes(SEGS_MAGIC).to_vec();
    out.extend_from_slice(&e.u16_bytes(0));
    out.extend_from_slice(&e.u16_bytes(chunks.len() as u16));
    out.extend_from_slice(&e.u32_bytes(plain.len() as u32));
    let zsize: usize = table_end + chunks.iter().map(|c| c.0.len()).sum::<usize>();
    out.extend_from_slice(&e.u32_bytes(zsize as u32));

    let mut offset = table_end;
    for (i, (payload, size)) in chunks.iter().enumerate() {
        let stored = if i == 0 && first_offset_zero { 0 } else { offset as u32 + 1 };
        out.extend_from_slice(&e.u16_bytes(payload.len() as u16));
        out.extend_from_slice(&e.u16_bytes(*size as u16));
        out.extend_from_slice(&e.u32_bytes(stored));
        offset += payload.len();
    }
    for (payload, _) in &chunks {
        out.extend_from_slice(payload);
    }
    out
}

fn sample_archive() -> Archive {
    let mut ar = Archive::with_capacity(16 * 1024);
    let script = "SetObject Ring 0.0 10.0 0.0\n".repeat(100);
    ar.add(b"stage.set.xml", script.as_bytes()).unwrap();
    ar.add(b"random.bin", &(0..=255u8).cycle().take(3000).collect::<Vec<_>>())
        .unwrap();
    ar.add(b"readme.txt", b"windmill isle").unwrap();
    ar
}

#[test]
fn test_segs_archive_round_trip() {
    let plain = sample_archive();
    for first_offset_zero in [false, true] {
        let file = segs(plain.as_bytes(), 1000, first_offset_zero);
        let packed = Archive::from_buffer(&file[..]);
        assert_eq!(packed.compression(), Compression::Segs);
        assert_eq!(packed.entry_count(), 0);
        assert_eq!(packed.decompressed_size().unwrap(), plain.len());

        let mut out = vec![0u8; plain.len()];
        let unpacked = packed.decompress_into(&mut out).unwrap();
        assert_eq!(unpacked.compression(), Compression::Plain);
        assert_eq!(unpacked.as_bytes(), plain.as_bytes());
        assert_eq!(unpacked.find(b"readme.txt").unwrap().data(), b"windmill isle");
    }
}

#[test]
fn test_segs_into_decompressed_is_mutable() {
    let plain = sample_archive();
    let file = segs(plain.as_bytes(), 4096, false);

    let mut ar = Archive::from_buffer(file).into_decompressed().unwrap();
    assert_eq!(ar.len(), plain.len());
    ar.remove(b"random.bin").unwrap();
    assert_eq!(ar.entry_count(), 2);
}

#[test]
fn test_segs_linker() {
    let mut arl = Linker::with_capacity(256, 2);
    arl.add(b"stage.set.xml", 0).unwrap();
    arl.add(b"sonic.xno", 1).unwrap();
    let file = segs(arl.as_bytes(), 16, false);

    let packed = Linker::from_buffer(file);
    assert_eq!(packed.compression(), Compression::Segs);
    let unpacked = packed.into_decompressed().unwrap();
    assert_eq!(unpacked.archive_count(), 2);
    assert!(unpacked.contains(b"sonic.xno"));
}

#[test]
fn test_xcompression_uniform_blocks() {
    let plain = sample_archive();
    let bytes = plain.as_bytes();
    let block = 512;

    let e = Endian::Big;
    let mut file = e.u32_bytes(XCOMPRESSION_MAGIC).to_vec();
    file.extend_from_slice(&[0u8; 20]);
    file.extend_from_slice(&e.u64_bytes(bytes.len() as u64));
    file.extend_from_slice(&e.u64_bytes(0));
    file.extend_from_slice(&e.u32_bytes(block as u32));
    file.extend_from_slice(&e.u32_bytes(block as u32));

    let pieces: Vec<&[u8]> = bytes.chunks(block).collect();
    for (i, piece) in pieces.iter().enumerate() {
        let more = i + 1 < pieces.len();
        file.extend_from_slice(&e.u32_bytes(piece.len() as u32));
        file.extend_from_slice(&e.u32_bytes(more as u32));
        // Every block claims the uniform size, the last one included.
        file.extend_from_slice(&e.u32_bytes(block as u32));
        file.extend_from_slice(piece);
    }

    let packed = Archive::from_buffer(&file[..]);
    assert_eq!(packed.compression(), Compression::XCompression);
    let unpacked = packed.into_decompressed().unwrap();
    assert_eq!(unpacked.as_bytes(), bytes);
}

#[test]
fn test_oversized_declared_size_is_rejected() {
    let plain = sample_archive();
    let mut file = segs(plain.as_bytes(), 1000, false);
    Endian::Big.write_u32(&mut file, 8, u32::MAX);

    let packed = Archive::from_buffer(file);
    assert!(matches!(
        packed.decompressed_size(),
        Err(SuArcError::InvalidHeader { .. })
    ));
    assert!(packed.into_decompressed().is_err());
}

#[test]
fn test_plain_into_decompressed_copies() {
    let plain = sample_archive();
    let len = plain.len();
    let copy = plain.clone().into_decompressed().unwrap();
    assert_eq!(copy.len(), len);
    assert_eq!(copy.capacity(), plain.capacity());
    assert_eq!(copy.as_bytes(), plain.as_bytes());
}

#[test]
#[should_panic(expected = "smaller than the decompressed size")]
fn test_decompress_into_small_buffer_panics() {
    let plain = sample_archive();
    let file = segs(plain.as_bytes(), 1000, false);
    let mut out = vec![0u8; plain.len() - 1];
    let _ = Archive::from_buffer(&file[..]).decompress_into(&mut out);
}
