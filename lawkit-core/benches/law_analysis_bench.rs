//! Benchmarks for single-law analysis and integration throughput.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lawkit_core::core::LawkitOptions;
use lawkit_core::generate::{GenerationConfig, Generator};
use lawkit_core::input::NumericDataset;
use lawkit_core::integration::Integrator;
use lawkit_core::laws::{analyze_law, Law};
use std::hint::black_box;
use std::time::Duration;
use tokio::runtime::Runtime;

fn generated(law: Law, count: usize) -> Vec<f64> {
    let config = GenerationConfig::new(law, count).with_seed(7);
    Generator::default()
        .generate(&config)
        .unwrap()
        .sample_data
}

fn bench_single_law(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("single_law");
    group.measurement_time(Duration::from_secs(8));

    for size in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size as u64));
        for law in [Law::Benford, Law::Pareto, Law::Normal, Law::Poisson] {
            let dataset = NumericDataset::new("bench", generated(law, size));
            let options = LawkitOptions::default();
            group.bench_with_input(
                BenchmarkId::new(law.as_str(), size),
                &dataset,
                |b, dataset| {
                    b.iter(|| {
                        rt.block_on(analyze_law(law, black_box(dataset), black_box(&options)))
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_parallel_chunks(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("parallel_chunks");

    let dataset = NumericDataset::new("bench", generated(Law::Benford, 200_000));
    for chunk_size in [1_000, 10_000, 100_000] {
        for parallel in [false, true] {
            let options = LawkitOptions::default()
                .with_chunk_size(chunk_size)
                .unwrap()
                .with_parallel_processing(parallel);
            let name = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(
                BenchmarkId::new(name, chunk_size),
                &dataset,
                |b, dataset| {
                    b.iter(|| {
                        rt.block_on(analyze_law(
                            Law::Benford,
                            black_box(dataset),
                            black_box(&options),
                        ))
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_integration(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("integration");

    let datasets: Vec<NumericDataset> = Law::ALL
        .iter()
        .map(|law| NumericDataset::new(law.as_str(), generated(*law, 5_000)))
        .collect();

    for parallel in [false, true] {
        let integrator = Integrator::new(LawkitOptions::default().with_parallel_processing(parallel));
        group.bench_function(BenchmarkId::new("all_laws", parallel), |b| {
            b.iter(|| rt.block_on(integrator.integrate(black_box(datasets.clone()))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_law,
    bench_parallel_chunks,
    bench_integration
);
criterion_main!(benches);
