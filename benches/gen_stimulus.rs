//! Benchmarks for stimulus array generation.
//!
//! Run:
//! - cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use mnemoscope::task::stimulus::{
    gen_color_array, gen_frequency_array, gen_orientation_array, gen_shape_field, ShapeFieldParams,
};

const SET_SIZES: [usize; 4] = [2, 4, 6, 8];
const COUNTS: [usize; 4] = [4, 6, 8, 10];
const FEATURE_BUDGET: u32 = 999;

fn bench_feature_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("gen_feature_arrays");
    group.sample_size(50);

    for &n in &SET_SIZES {
        let id = BenchmarkId::new("orientation", format!("n{n}"));
        group.bench_function(id, |b| {
            let mut rng = SmallRng::seed_from_u64(1);
            b.iter(|| black_box(gen_orientation_array(&mut rng, n, FEATURE_BUDGET)));
        });

        let id = BenchmarkId::new("color", format!("n{n}"));
        group.bench_function(id, |b| {
            let mut rng = SmallRng::seed_from_u64(2);
            b.iter(|| black_box(gen_color_array(&mut rng, n, FEATURE_BUDGET)));
        });
    }

    for &n in &[2usize, 4, 6] {
        let id = BenchmarkId::new("frequency", format!("n{n}"));
        group.bench_function(id, |b| {
            let mut rng = SmallRng::seed_from_u64(3);
            b.iter(|| black_box(gen_frequency_array(&mut rng, n, FEATURE_BUDGET)));
        });
    }

    group.finish();
}

fn bench_shape_fields(c: &mut Criterion) {
    let mut group = c.benchmark_group("gen_shape_fields");
    group.sample_size(50);

    for &count in &COUNTS {
        for &sep in &[18.0f32, 32.0, 48.0] {
            let params = ShapeFieldParams {
                count,
                min_separation_px: sep,
                similarity: 0.5,
                field_radius_px: 220.0,
                attempt_budget: 5000,
            };
            let id = BenchmarkId::new("case", format!("c{count}_s{sep:.0}"));
            group.bench_with_input(id, &params, |b, params| {
                let mut rng = SmallRng::seed_from_u64(4);
                b.iter(|| black_box(gen_shape_field(&mut rng, params)));
            });
        }
    }

    group.finish();
}

criterion_group!(gen_stimulus, bench_feature_arrays, bench_shape_fields);
criterion_main!(gen_stimulus);
