//! # Transform Benchmarks
//!
//! Measures the tensor transforms on the shapes a simulation uses.
//! Every transform is pure: &Tensor → Tensor.
//!
//! Run: `cargo bench --bench transform_bench`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tensorviz_core::prelude::*;

fn tensor(depth: usize, rows: usize, cols: usize) -> Tensor {
    let shape = Shape::new(depth, rows, cols).expect("valid shape");
    create_tensor_with_rng(shape, &mut StdRng::seed_from_u64(42))
}

/// Benchmark elementwise transforms
fn bench_elementwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("elementwise");

    for size in [10usize, 32, 64] {
        let input = tensor(size, size, 3);
        group.throughput(Throughput::Elements(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("sine", size), &input, |b, t| {
            b.iter(|| black_box(sine(t)))
        });
        group.bench_with_input(BenchmarkId::new("tanh", size), &input, |b, t| {
            b.iter(|| black_box(tanh(t)))
        });
        group.bench_with_input(BenchmarkId::new("exp_decay", size), &input, |b, t| {
            b.iter(|| black_box(exp_decay(t, 500)))
        });
    }

    group.finish();
}

/// Benchmark matrix power by repeated squaring
fn bench_matrix_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_power");

    let input = tensor(3, 32, 32);
    for p in [2u32, 8, 31] {
        group.bench_with_input(BenchmarkId::new("planes_32x32", p), &p, |b, &p| {
            b.iter(|| black_box(matrix_power_tensor(&input, p)))
        });
    }

    let m = input.plane(0).expect("plane 0");
    group.bench_function("multiply_32x32", |b| {
        b.iter(|| black_box(multiply(&m, &m)))
    });

    group.finish();
}

/// Benchmark convolution
fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolution");

    let laplacian = Kernel::laplacian();
    for size in [10usize, 32, 64] {
        let input = tensor(size, size, 3);
        group.throughput(Throughput::Elements(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("laplacian", size), &input, |b, t| {
            b.iter(|| black_box(convolve(t, &laplacian, 1, 0)))
        });
    }

    let input = tensor(64, 64, 3);
    group.bench_function("laplacian_stride2_pad1_64", |b| {
        b.iter(|| black_box(convolve(&input, &laplacian, 2, 1)))
    });

    group.finish();
}

/// Benchmark the random tensor factory
fn bench_factory(c: &mut Criterion) {
    let shape = Shape::new(10, 10, 3).expect("valid shape");
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("create_tensor_10x10x3", |b| {
        b.iter(|| black_box(create_tensor_with_rng(shape, &mut rng)))
    });
}

criterion_group!(
    benches,
    bench_elementwise,
    bench_matrix_power,
    bench_convolution,
    bench_factory,
);

criterion_main!(benches);
