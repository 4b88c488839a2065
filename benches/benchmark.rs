//! Performance benchmarks for FastHicTools
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fast_hictools::core::{Bin, GenomicInterval, MemoryContactSource, Pixel};
use fast_hictools::stats::{build_windows_2d, compute_expected, pileup_raw, sliding_diamond, ArmSet};
use ndarray::Array2;

const BIN: u64 = 10_000;
const N_BINS: u64 = 2_000;

/// Synthetic chr1 map with a power-law distance decay up to 200 bins
fn synthetic_map() -> MemoryContactSource {
    let bins = (0..N_BINS)
        .map(|i| Bin {
            chrom: "chr1".to_string(),
            start: i * BIN,
            end: (i + 1) * BIN,
            weight: if i % 97 == 0 { f64::NAN } else { 1.0 },
        })
        .collect();
    let pixels = (0..N_BINS)
        .flat_map(|i| {
            (i..(i + 200).min(N_BINS)).map(move |j| Pixel {
                bin1: i,
                bin2: j,
                count: 1000.0 / (1.0 + (j - i) as f64),
            })
        })
        .collect();
    MemoryContactSource::new(BIN, bins, pixels).unwrap()
}

fn whole_chrom() -> ArmSet {
    ArmSet::new(vec![GenomicInterval::new("chr1", 0, N_BINS * BIN)])
}

/// Benchmark expected over one arm
fn bench_expected(c: &mut Criterion) {
    let source = synthetic_map();
    let arms = whole_chrom();

    c.bench_function("expected_single_arm", |b| {
        b.iter(|| {
            let expected = compute_expected(black_box(&source), &arms, 2, 1).unwrap();
            black_box(expected)
        })
    });
}

/// Benchmark pileups by number of windows and threads
fn bench_pileup(c: &mut Criterion) {
    let source = synthetic_map();
    let arms = whole_chrom();
    let anchors: Vec<(&str, u64)> = (0..1000).map(|i| ("chr1", 500_000 + i * 15_000)).collect();

    let mut group = c.benchmark_group("pileup_raw");
    for threads in [1usize, 4] {
        for size in [100usize, 1000] {
            let windows =
                build_windows_2d(100_000, BIN, &anchors[..size], &anchors[..size], &arms).unwrap();
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("threads_{}", threads), size),
                &windows,
                |b, windows| {
                    b.iter(|| {
                        let pile = pileup_raw(&source, black_box(windows), threads).unwrap();
                        black_box(pile.collapse())
                    })
                },
            );
        }
    }
    group.finish();
}

/// Benchmark the sliding diamond on a collapsed-pile sized matrix
fn bench_diamond(c: &mut Criterion) {
    let m = Array2::from_shape_fn((201, 201), |(i, j)| 1.0 / (1.0 + i.abs_diff(j) as f64));

    c.bench_function("sliding_diamond_201", |b| {
        b.iter(|| black_box(sliding_diamond(black_box(m.view()), 6).unwrap()))
    });
}

criterion_group!(benches, bench_expected, bench_pileup, bench_diamond);
criterion_main!(benches);
