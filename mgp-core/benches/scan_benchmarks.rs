use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mgp_core::{search, CollectingReporter, ScanConfig};
use std::{fs::File, io::Write, num::NonZeroUsize};
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, file_count: usize, lines_per_file: usize) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("test_{}.txt", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            writeln!(
                file,
                "Line {} TODO: fix bug {} FIXME: optimize line {} NOTE: important task {}",
                j, j, j, j
            )?;
        }
    }
    Ok(())
}

fn base_config(dir: &TempDir, workers: usize) -> ScanConfig {
    let mut config = ScanConfig::new("TODO", dir.path());
    config.worker_count = NonZeroUsize::new(workers).unwrap();
    config
}

fn bench_patterns(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_test_files(&dir, 20, 200).unwrap();

    let patterns = [
        "TODO",
        r"TODO:.*\d+",
        r"FIXME:.*bug.*line \d+",
        r"never present \d{6}",
    ];

    let mut group = c.benchmark_group("Pattern");
    for (i, pattern) in patterns.iter().enumerate() {
        let mut config = base_config(&dir, 4);
        config.pattern = pattern.to_string();

        group.bench_function(format!("pattern_{}", i), |b| {
            b.iter(|| {
                let reporter = CollectingReporter::new();
                black_box(search(&config, &reporter).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_worker_scaling(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_test_files(&dir, 500, 50).unwrap();

    let mut group = c.benchmark_group("Worker Scaling");
    for workers in [1, 4, 16, 100] {
        let config = base_config(&dir, workers);
        group.bench_with_input(BenchmarkId::from_parameter(workers), &config, |b, config| {
            b.iter(|| {
                let reporter = CollectingReporter::new();
                black_box(search(config, &reporter).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_context_mode(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_test_files(&dir, 50, 200).unwrap();

    let mut group = c.benchmark_group("Context Mode");
    for match_context in [false, true] {
        let mut config = base_config(&dir, 8);
        config.match_context = match_context;

        group.bench_with_input(
            BenchmarkId::from_parameter(match_context),
            &config,
            |b, config| {
                b.iter(|| {
                    let reporter = CollectingReporter::new();
                    black_box(search(config, &reporter).unwrap())
                });
            },
        );
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_patterns, bench_worker_scaling, bench_context_mode
}
criterion_main!(benches);
