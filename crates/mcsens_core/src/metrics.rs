//! Metrics aggregation over perturbation records.
//!
//! Produces one value per (input variable, output variable, metric kind),
//! always in declared order. A degenerate pair yields NaN plus a warning and
//! never stops the remaining pairs from being computed.

use rustc_hash::FxHashMap;

use crate::model::{MetricKind, MetricRecord, MetricWarning, MetricsTable, PerturbationTable};
use crate::stats::{self, Degeneracy};

/// Normalized changes of one (input, output) pair across all trials
#[derive(Debug, Default)]
struct PairSamples {
    input_change: Vec<f64>,
    output_change: Vec<f64>,
}

impl PairSamples {
    fn compute(&self, metric: MetricKind, min_variance: f64) -> Result<f64, Degeneracy> {
        match metric {
            MetricKind::Correlation => {
                stats::pearson(&self.input_change, &self.output_change, min_variance)
            }
            MetricKind::R2 => {
                stats::linregress(&self.input_change, &self.output_change, min_variance)
                    .map(|fit| fit.r_squared())
            }
            MetricKind::MeanNormalizedChange => {
                let magnitudes: Vec<f64> = self.output_change.iter().map(|v| v.abs()).collect();
                let value = stats::nan_mean(&magnitudes);
                if value.is_nan() {
                    Err(Degeneracy::InsufficientData { count: 0 })
                } else if value.is_infinite() {
                    Err(Degeneracy::ComputationFailed {
                        reason: "infinite output change".to_string(),
                    })
                } else {
                    Ok(value)
                }
            }
        }
    }
}

/// Compute every metric for every declared pair.
///
/// The table has exactly `inputs × outputs × MetricKind::ALL.len()` rows.
#[must_use]
pub fn aggregate_metrics(
    perturbations: &PerturbationTable,
    input_variables: &[String],
    output_variables: &[String],
    min_variance: f64,
) -> (MetricsTable, Vec<MetricWarning>) {
    let mut samples: FxHashMap<(&str, &str), PairSamples> = FxHashMap::default();
    for record in perturbations.iter() {
        let pair = samples
            .entry((
                record.input_variable.as_str(),
                record.output_variable.as_str(),
            ))
            .or_default();
        pair.input_change.push(record.input_perturbation_std);
        pair.output_change.push(record.output_perturbation_std);
    }

    let empty = PairSamples::default();
    let mut records =
        Vec::with_capacity(input_variables.len() * output_variables.len() * MetricKind::ALL.len());
    let mut warnings = Vec::new();

    for input in input_variables {
        for output in output_variables {
            let pair = samples
                .get(&(input.as_str(), output.as_str()))
                .unwrap_or(&empty);

            for metric in MetricKind::ALL {
                let value = match pair.compute(metric, min_variance) {
                    Ok(value) => value,
                    Err(cause) => {
                        tracing::warn!(
                            input_variable = input.as_str(),
                            output_variable = output.as_str(),
                            metric = metric.name(),
                            cause = %cause,
                            "Metric not computable, using NaN"
                        );
                        warnings.push(MetricWarning {
                            input_variable: input.clone(),
                            output_variable: output.clone(),
                            metric,
                            cause,
                        });
                        f64::NAN
                    }
                };
                records.push(MetricRecord {
                    input_variable: input.clone(),
                    output_variable: output.clone(),
                    metric,
                    value,
                });
            }
        }
    }

    (MetricsTable { records }, warnings)
}
