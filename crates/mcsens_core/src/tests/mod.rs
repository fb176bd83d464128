//! Integration tests for the sensitivity analysis pipeline
//!
//! Tests are organized by topic:
//! - `strategies` - Looped vs joint execution: call counts and equivalence
//! - `scenarios` - Known forward processes with predictable metrics
//! - `degenerate` - Constant, missing, and non-finite data
//! - `validation` - Input contract violations and forward process failures


use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::BoxError;
use crate::model::{MetricKind, MetricsTable, Table};

/// Column lookup that reports a missing column as a forward process error
pub(crate) fn col<'a>(table: &'a Table, name: &str) -> Result<&'a [f64], BoxError> {
    table
        .column(name)
        .ok_or_else(|| format!("missing column '{name}'").into())
}

/// Copy of `inputs` with extra output columns appended
pub(crate) fn with_outputs(
    inputs: &Table,
    outputs: Vec<(&str, Vec<f64>)>,
) -> Result<Table, BoxError> {
    let mut result = inputs.clone();
    for (name, values) in outputs {
        result.set_column(name, values)?;
    }
    Ok(result)
}

/// `x = [1..5]`, `y = 2x`
pub(crate) fn simple_dataset() -> Table {
    Table::from_columns([
        ("x", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        ("y", vec![2.0, 4.0, 6.0, 8.0, 10.0]),
    ])
    .unwrap()
}

/// `z = 2x + y`, `w = x²`
pub(crate) fn xyzw_process(t: &Table) -> Result<Table, BoxError> {
    let x = col(t, "x")?;
    let y = col(t, "y")?;
    let z = x.iter().zip(y).map(|(a, b)| 2.0 * a + b).collect();
    let w = x.iter().map(|a| a * a).collect();
    with_outputs(t, vec![("z", z), ("w", w)])
}

/// Standard-normal columns drawn from a fixed seed
pub(crate) fn random_dataset(names: &[&str], rows: usize, seed: u64) -> Table {
    let mut rng = StdRng::seed_from_u64(seed);
    Table::from_columns(names.iter().map(|name| {
        let values: Vec<f64> = (0..rows).map(|_| StandardNormal.sample(&mut rng)).collect();
        (*name, values)
    }))
    .unwrap()
}

/// Forward process wrapper that counts its invocations
pub(crate) struct CountingModel {
    pub calls: usize,
    model: fn(&Table) -> Result<Table, BoxError>,
}

impl CountingModel {
    pub(crate) fn new(model: fn(&Table) -> Result<Table, BoxError>) -> Self {
        Self { calls: 0, model }
    }
}

impl crate::process::ForwardProcess for CountingModel {
    fn run(&mut self, inputs: &Table) -> Result<Table, BoxError> {
        self.calls += 1;
        (self.model)(inputs)
    }
}

/// Assert two metrics tables agree key by key within a relative tolerance (NaN == NaN).
pub(crate) fn assert_metrics_close(a: &MetricsTable, b: &MetricsTable, rel_tol: f64) {
    assert_eq!(a.len(), b.len(), "metrics tables differ in length");
    for record in a.iter() {
        let other = b
            .get(&record.input_variable, &record.output_variable, record.metric)
            .unwrap_or_else(|| {
                panic!(
                    "missing {} for {} -> {}",
                    record.metric, record.input_variable, record.output_variable
                )
            });
        let value = record.value;
        if value.is_nan() || other.is_nan() {
            assert!(
                value.is_nan() && other.is_nan(),
                "{} for {} -> {}: {value} vs {other}",
                record.metric,
                record.input_variable,
                record.output_variable
            );
            continue;
        }
        let scale = value.abs().max(other.abs()).max(1e-12);
        assert!(
            (value - other).abs() / scale <= rel_tol,
            "{} for {} -> {}: {value} vs {other}",
            record.metric,
            record.input_variable,
            record.output_variable
        );
    }
}

/// Metric value that must exist in the table
pub(crate) fn metric(table: &MetricsTable, input: &str, output: &str, kind: MetricKind) -> f64 {
    table
        .get(input, output, kind)
        .unwrap_or_else(|| panic!("no {kind} for {input} -> {output}"))
}
