//! Benchmarks for chromap operations.
//!
//! Run with: `cargo bench`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chromap_core::{luminance_plane, ColorImage, Rect};
use chromap_ops::gradient::{image_density, relative_gradient};
use chromap_ops::{exposure_map, remap_images, remap_images_tiled, ExposureMapParams, RemapParams};

/// Smooth test image with some texture so no gradient is degenerate.
fn test_image(size: u32, phase: f32) -> ColorImage {
    let mut img = ColorImage::new(Rect::from_size(size, size));
    for (x, y) in Rect::from_size(size, size).iter_coords() {
        let u = x as f32 / size as f32;
        let v = y as f32 / size as f32;
        let t = ((x * 7 + y * 13) % 17) as f32 / 170.0;
        img.set_pixel(x, y, [0.2 + 0.6 * u + t, 0.3 + 0.4 * v, 0.5 + 0.3 * (u - v) * phase, 1.0]);
    }
    img
}

/// Benchmark the whole-image remap.
fn bench_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("remap");
    let params = RemapParams::default();

    for size in [64u32, 256, 1024] {
        let source = test_image(size, 0.0);
        let aux = test_image(size, 1.0);
        group.throughput(Throughput::Elements(size as u64 * size as u64));

        group.bench_with_input(BenchmarkId::new("whole", size), &size, |b, _| {
            b.iter(|| remap_images(black_box(&source), Some(&aux), &params))
        });

        for tile in [64u32, 256] {
            if tile > size {
                continue;
            }
            group.bench_with_input(BenchmarkId::new(format!("tiled_{tile}"), size), &size, |b, _| {
                b.iter(|| remap_images_tiled(black_box(&source), Some(&aux), &params, tile))
            });
        }
    }

    group.finish();
}

/// Benchmark the gradient and density filters.
fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    for size in [256u32, 1024] {
        let luma = luminance_plane(&test_image(size, 1.0));
        group.throughput(Throughput::Elements(size as u64 * size as u64));

        group.bench_with_input(BenchmarkId::new("relative_gradient", size), &luma, |b, l| {
            b.iter(|| relative_gradient(black_box(l), l.bounds()))
        });

        group.bench_with_input(BenchmarkId::new("image_density", size), &luma, |b, l| {
            b.iter(|| image_density(black_box(l), l.bounds()))
        });
    }

    group.finish();
}

/// Benchmark the exposure-map graph.
fn bench_exposure_map(c: &mut Criterion) {
    let new = test_image(256, 0.5);
    let old = test_image(256, 1.0);
    let params = ExposureMapParams::default();

    c.bench_function("exposure_map_256", |b| {
        b.iter(|| exposure_map(black_box(&new), &old, &params))
    });
}

criterion_group!(benches, bench_remap, bench_filters, bench_exposure_map);
criterion_main!(benches);
