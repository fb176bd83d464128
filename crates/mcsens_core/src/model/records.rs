//! Records produced by a sensitivity analysis run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::Degeneracy;

/// One perturbation trial for one (input variable, output variable, row) triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerturbationRecord {
    /// Row index in the input dataset
    pub row_id: usize,
    /// Trial index within the input variable's perturbation set
    pub trial: usize,
    pub input_variable: String,
    pub output_variable: String,
    pub input_unperturbed: f64,
    pub input_perturbed: f64,
    pub output_unperturbed: f64,
    pub output_perturbed: f64,
    /// Normalized input change
    pub input_perturbation_std: f64,
    /// Normalized output change
    pub output_perturbation_std: f64,
}

impl PerturbationRecord {
    /// True when all four raw (un-normalized) values are present
    #[must_use]
    pub fn has_complete_values(&self) -> bool {
        self.input_unperturbed.is_finite()
            && self.input_perturbed.is_finite()
            && self.output_unperturbed.is_finite()
            && self.output_perturbed.is_finite()
    }
}

/// All perturbation records of a run, in (input, trial, row, output) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerturbationTable {
    pub records: Vec<PerturbationRecord>,
}

impl PerturbationTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerturbationRecord> {
        self.records.iter()
    }

    /// Records belonging to one (input, output) pair
    pub fn for_pair<'a>(
        &'a self,
        input_variable: &'a str,
        output_variable: &'a str,
    ) -> impl Iterator<Item = &'a PerturbationRecord> {
        self.records.iter().filter(move |r| {
            r.input_variable == input_variable && r.output_variable == output_variable
        })
    }
}

/// Sensitivity statistics computed per (input, output) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Correlation,
    R2,
    MeanNormalizedChange,
}

impl MetricKind {
    /// Every metric kind, in table order
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Correlation,
        MetricKind::R2,
        MetricKind::MeanNormalizedChange,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::R2 => "r2",
            Self::MeanNormalizedChange => "mean_normalized_change",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One aggregate statistic for one (input, output) pair. `value` may be NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub input_variable: String,
    pub output_variable: String,
    pub metric: MetricKind,
    pub value: f64,
}

/// Metrics for every declared pair and metric kind; uncomputable values are NaN, never omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsTable {
    pub records: Vec<MetricRecord>,
}

impl MetricsTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter()
    }

    /// Look up a single metric value
    #[must_use]
    pub fn get(&self, input_variable: &str, output_variable: &str, metric: MetricKind) -> Option<f64> {
        self.records
            .iter()
            .find(|r| {
                r.metric == metric
                    && r.input_variable == input_variable
                    && r.output_variable == output_variable
            })
            .map(|r| r.value)
    }

    /// Pivot one metric kind into a grid: one row per output variable,
    /// one column per input variable, both in first-seen order.
    #[must_use]
    pub fn pivot(&self, metric: MetricKind) -> MetricPivot {
        let mut inputs: Vec<String> = Vec::new();
        let mut outputs: Vec<String> = Vec::new();
        for r in self.records.iter().filter(|r| r.metric == metric) {
            if !inputs.contains(&r.input_variable) {
                inputs.push(r.input_variable.clone());
            }
            if !outputs.contains(&r.output_variable) {
                outputs.push(r.output_variable.clone());
            }
        }

        let values = outputs
            .iter()
            .map(|output| {
                inputs
                    .iter()
                    .map(|input| self.get(input, output, metric).unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();

        MetricPivot {
            metric,
            inputs,
            outputs,
            values,
        }
    }
}

/// A single metric laid out as an output x input grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPivot {
    pub metric: MetricKind,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// `values[output][input]`
    pub values: Vec<Vec<f64>>,
}

/// A metric that resolved to NaN, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricWarning {
    pub input_variable: String,
    pub output_variable: String,
    pub metric: MetricKind,
    pub cause: Degeneracy,
}

impl fmt::Display for MetricWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for {} -> {}: {}",
            self.metric, self.input_variable, self.output_variable, self.cause
        )
    }
}

/// Everything returned by a sensitivity analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SensitivityResults {
    pub perturbations: PerturbationTable,
    pub metrics: MetricsTable,
    pub warnings: Vec<MetricWarning>,
    /// Number of forward process invocations, including the baseline run
    pub forward_process_calls: usize,
}

impl SensitivityResults {
    /// Split into the `(perturbation_table, metrics_table)` pair
    #[must_use]
    pub fn into_tables(self) -> (PerturbationTable, MetricsTable) {
        (self.perturbations, self.metrics)
    }

    /// Warnings raised for one (input, output) pair
    pub fn warnings_for<'a>(
        &'a self,
        input_variable: &'a str,
        output_variable: &'a str,
    ) -> impl Iterator<Item = &'a MetricWarning> {
        self.warnings.iter().filter(move |w| {
            w.input_variable == input_variable && w.output_variable == output_variable
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(input: &str, output: &str, metric: MetricKind, value: f64) -> MetricRecord {
        MetricRecord {
            input_variable: input.into(),
            output_variable: output.into(),
            metric,
            value,
        }
    }

    #[test]
    fn test_pivot_layout() {
        let table = MetricsTable {
            records: vec![
                record("a", "u", MetricKind::Correlation, 0.1),
                record("a", "u", MetricKind::R2, 0.01),
                record("a", "v", MetricKind::Correlation, 0.2),
                record("b", "u", MetricKind::Correlation, 0.3),
                record("b", "v", MetricKind::Correlation, f64::NAN),
            ],
        };

        let pivot = table.pivot(MetricKind::Correlation);
        assert_eq!(pivot.inputs, vec!["a", "b"]);
        assert_eq!(pivot.outputs, vec!["u", "v"]);
        assert_eq!(pivot.values[0], vec![0.1, 0.3]);
        assert_eq!(pivot.values[1][0], 0.2);
        assert!(pivot.values[1][1].is_nan());
    }

    #[test]
    fn test_metric_kind_names() {
        let names: Vec<_> = MetricKind::ALL.iter().map(MetricKind::name).collect();
        assert_eq!(names, vec!["correlation", "r2", "mean_normalized_change"]);
        assert_eq!(
            serde_json::to_string(&MetricKind::MeanNormalizedChange).unwrap(),
            "\"mean_normalized_change\""
        );
    }
}
