//! Benchmarks for the index → classify → extract pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vegtrace_algorithms::imagery::{classify, compute_index, ClassThresholds, IndexParams};
use vegtrace_algorithms::vector::extract_polygons;
use vegtrace_core::{GeoTransform, MaskedRaster, Raster};

fn create_band(size: usize, base: u16, stride: usize) -> MaskedRaster<u16> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    for row in 0..size {
        for col in 0..size {
            let v = base + ((row * 7 + col * stride) % 4000) as u16;
            r.set(row, col, v).unwrap();
        }
    }
    MaskedRaster::from_nodata(r)
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/index");
    for size in [256, 512, 1024] {
        let red = create_band(size, 500, 13);
        let nir = create_band(size, 2000, 31);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| compute_index(black_box(&red), black_box(&nir), IndexParams::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/classify");
    for size in [256, 512, 1024] {
        let index = compute_index(
            &create_band(size, 500, 13),
            &create_band(size, 2000, 31),
            IndexParams::default(),
        )
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| classify(black_box(&index), ClassThresholds::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/extract");
    group.sample_size(20);
    for size in [128, 256, 512] {
        let index = compute_index(
            &create_band(size, 500, 13),
            &create_band(size, 2000, 31),
            IndexParams::default(),
        )
        .unwrap();
        let labels = classify(&index, ClassThresholds::default()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| extract_polygons(black_box(&labels), 1).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index, bench_classify, bench_extract);
criterion_main!(benches);
