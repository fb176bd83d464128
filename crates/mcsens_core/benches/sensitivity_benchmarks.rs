//! Criterion benchmarks for mcsens_core sensitivity analysis
//!
//! Run with: cargo bench -p mcsens_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mcsens_core::metrics::aggregate_metrics;
use mcsens_core::{BoxError, SensitivityConfig, Table, sensitivity_analysis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

const INPUTS: [&str; 3] = ["a", "b", "c"];
const OUTPUTS: [&str; 3] = ["sum", "sin", "cos"];

fn create_dataset(rows: usize) -> Table {
    let mut rng = StdRng::seed_from_u64(7);
    Table::from_columns(INPUTS.iter().map(|name| {
        let values: Vec<f64> = (0..rows).map(|_| StandardNormal.sample(&mut rng)).collect();
        (*name, values)
    }))
    .unwrap()
}

fn model(t: &Table) -> Result<Table, BoxError> {
    let column = |name: &str| t.column(name).ok_or_else(|| format!("missing '{name}'"));
    let (a, b, c) = (column("a")?, column("b")?, column("c")?);
    let rows = 0..t.n_rows();

    let mut out = t.clone();
    out.push_column("sum", rows.clone().map(|i| a[i] + b[i] + c[i]).collect())?;
    out.push_column("sin", rows.clone().map(|i| a[i].sin() * b[i]).collect())?;
    out.push_column("cos", rows.map(|i| c[i].cos() + a[i]).collect())?;
    Ok(out)
}

fn run(dataset: &Table, config: &SensitivityConfig) {
    let mut rng = StdRng::seed_from_u64(42);
    let results = sensitivity_analysis(dataset, &INPUTS, &OUTPUTS, &mut model, config, &mut rng)
        .unwrap();
    black_box(results);
}

fn bench_looped_vs_joint(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy");
    let dataset = create_dataset(100);

    for use_joint_run in [false, true] {
        let config = SensitivityConfig {
            n: 50,
            use_joint_run,
            ..Default::default()
        };
        let name = if use_joint_run { "joint" } else { "looped" };
        group.bench_function(name, |b| {
            b.iter(|| run(black_box(&dataset), black_box(&config)))
        });
    }

    group.finish();
}

fn bench_perturbation_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("perturbations");
    let dataset = create_dataset(100);

    for n in [10, 50, 200].iter() {
        let config = SensitivityConfig {
            n: *n,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("joint", n), n, |b, _| {
            b.iter(|| run(black_box(&dataset), black_box(&config)))
        });
    }

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let dataset = create_dataset(100);
    let config = SensitivityConfig {
        n: 50,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(42);
    let results =
        sensitivity_analysis(&dataset, &INPUTS, &OUTPUTS, &mut model, &config, &mut rng).unwrap();
    let inputs: Vec<String> = INPUTS.iter().map(|s| s.to_string()).collect();
    let outputs: Vec<String> = OUTPUTS.iter().map(|s| s.to_string()).collect();

    c.bench_function("aggregate_metrics_3x3", |b| {
        b.iter(|| {
            aggregate_metrics(
                black_box(&results.perturbations),
                black_box(&inputs),
                black_box(&outputs),
                black_box(config.min_variance),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_looped_vs_joint,
    bench_perturbation_count,
    bench_aggregation,
);
criterion_main!(benches);
