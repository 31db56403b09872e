//! Container benchmarks for suarc-archive
//!
//! Measures record iteration, name lookup and merging over archives of
//! realistic entry counts.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use suarc_archive::prelude::*;

/// Type alias for payload generator functions
type PayloadGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    /// Small scripts of a few dozen bytes
    pub fn small(index: usize) -> Vec<u8> {
        format!("<SetObject id=\"{}\"/>", index).into_bytes()
    }

    /// Model-sized payloads of a few kilobytes
    pub fn large(index: usize) -> Vec<u8> {
        vec![(index % 251) as u8; 4096]
    }
}

fn name(index: usize) -> String {
    format!("obj_{:020}.xno", index)
}

fn build(entries: usize, payload: PayloadGenerator) -> Archive {
    let total: usize = (0..entries)
        .map(|i| suarc_archive::ar::record_size(name(i).len(), payload(i).len()))
        .sum();
    let mut ar = Archive::with_capacity(suarc_archive::ar::HEADER_SIZE + total);
    for i in 0..entries {
        ar.add(name(i).as_bytes(), &payload(i))
            .expect("capacity computed above");
    }
    ar
}

fn bench_iterate(c: &mut Criterion) {
    let payloads: [(&str, PayloadGenerator); 2] =
        [("small", test_data::small), ("large", test_data::large)];

    let mut group = c.benchmark_group("entries");
    for (name, payload) in payloads {
        for count in [100, 1000] {
            let ar = build(count, payload);
            group.throughput(Throughput::Bytes(ar.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(name, count),
                &ar,
                |b, ar| b.iter(|| black_box(ar.entries().map(|e| e.data_size()).sum::<usize>())),
            );
        }
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");
    for count in [100, 1000] {
        let ar = build(count, test_data::small);
        let last = name(count - 1);
        group.bench_with_input(BenchmarkId::new("last", count), &ar, |b, ar| {
            b.iter(|| black_box(ar.find(last.as_bytes()).is_some()))
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for count in [100, 500] {
        let a = build(count, test_data::small);
        let b = build(count, test_data::small);
        let capacity = a.len() + b.len();
        let options = MergeOptions::DEFAULT.with_name_capacity(4 * count);

        group.bench_with_input(BenchmarkId::new("overlapping", count), &count, |bench, _| {
            bench.iter(|| {
                let merged = suarc_archive::merge_archives_with(&[&a, &b], vec![0u8; capacity], options);
                black_box(merged.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_iterate, bench_find, bench_merge);
criterion_main!(benches);
