//! Inflate throughput benchmarks for suarc-deflate
//!
//! Streams are produced by zlib (via flate2) at several levels so the
//! stored, fixed and dynamic block paths are all measured.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::hint::black_box;
use std::io::Write;
use suarc_deflate::Inflater;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    /// Uniform data - long single-byte runs
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0xAA; size]
    }

    /// Random data - mostly literals
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    /// Text-like data - realistic asset names and scripts
    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"Sonic_Stage_01.ar.00 chr_sonic_model.xno chr_sonic_anim.xnm \
                     stg_windmill_isle_day.set obj_ring.xno obj_spring.xno ";
        text.iter().copied().cycle().take(size).collect()
    }
}

fn deflate(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).expect("in-memory write");
    encoder.finish().expect("in-memory finish")
}

fn bench_inflate(c: &mut Criterion) {
    let patterns: [(&str, PatternGenerator); 3] = [
        ("uniform", test_data::uniform),
        ("random", test_data::random),
        ("text", test_data::text_like),
    ];

    let mut group = c.benchmark_group("inflate");
    for (name, generate) in patterns {
        for size in [16 * 1024, 256 * 1024] {
            let data = generate(size);
            group.throughput(Throughput::Bytes(size as u64));

            for level in [0, 1, 6, 9] {
                let compressed = deflate(&data, level);
                let mut out = vec![0u8; size];
                let mut inflater = Inflater::new();
                group.bench_with_input(
                    BenchmarkId::new(format!("{}_l{}", name, level), size),
                    &compressed,
                    |b, compressed| {
                        b.iter(|| inflater.decompress(black_box(compressed), &mut out));
                    },
                );
            }
        }
    }
    group.finish();
}

criterion_group!(benches, bench_inflate);
criterion_main!(benches);
