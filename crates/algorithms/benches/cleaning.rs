//! Benchmarks for mask cleaning and region reductions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glacis_algorithms::morphology::{despeckle, edge_band, CleaningParams};
use glacis_algorithms::statistics::{ReductionStrategy, RegionReducer};
use glacis_core::geometry::Footprint;
use glacis_core::raster::BinaryMask;
use glacis_core::GeoTransform;
use glacis_parallel::ProcessingMode;

fn grid(size: usize) -> GeoTransform {
    GeoTransform::new(0.0, size as f64 * 30.0, 30.0, -30.0)
}

/// Speckled mask: large blobs with scattered single pixels
fn create_test_mask(size: usize) -> BinaryMask {
    let mut m = BinaryMask::new(size, size).with_transform(grid(size));
    for row in 0..size {
        for col in 0..size {
            let blob = (row / 64 + col / 64) % 2 == 0;
            let speck = (row * 7 + col * 13) % 97 == 0;
            if blob || speck {
                m.set(row, col, 1).unwrap();
            }
        }
    }
    m
}

fn bench_despeckle(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleaning/despeckle");
    let params = CleaningParams::default();
    for size in [256, 512, 1024] {
        let mask = create_test_mask(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| despeckle(black_box(&mask), &params).unwrap())
        });
    }
    group.finish();
}

fn bench_edge_band(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleaning/edge_band");
    for size in [256, 512, 1024] {
        let mask = create_test_mask(size);
        let footprint = Footprint::full(grid(size), size, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| edge_band(black_box(&mask), &footprint, 2).unwrap())
        });
    }
    group.finish();
}

fn bench_area(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce/area_km2");
    let size = 1024;
    let mask = create_test_mask(size);
    let footprint = Footprint::full(grid(size), size, size);
    let strategies = [
        ("exact", ReductionStrategy::Exact),
        ("tiled", ReductionStrategy::tiled()),
    ];
    for (name, strategy) in strategies {
        let reducer = RegionReducer::new(&footprint, strategy, ProcessingMode::Parallel).unwrap();
        group.bench_function(name, |b| b.iter(|| reducer.area_km2(black_box(&mask), 30.0).unwrap()));
    }
    group.finish();
}

criterion_group!(benches, bench_despeckle, bench_edge_band, bench_area);
criterion_main!(benches);
