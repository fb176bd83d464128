//! Perturbation generator.
//!
//! Produces `n` perturbed copies of the dataset for one input variable. Only
//! the target column changes between copies; every other column stays at its
//! baseline value.

use rand::Rng;
use rand::distr::Distribution;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensitivityError};
use crate::model::Table;
use crate::stats::{nan_mean, nan_std};

/// Distribution perturbation magnitudes are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PerturbationDistribution {
    /// `N(mean, scale)`
    #[default]
    Normal,
    /// `U[mean - scale, mean + scale]`
    Uniform,
}

impl PerturbationDistribution {
    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Uniform => "Uniform",
        }
    }
}

/// Reference magnitude the perturbation scale is derived from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PerturbationScale {
    /// Standard deviation of the baseline column
    #[default]
    StdDev,
    /// `max - min` of the baseline column
    Range,
    /// A fixed absolute scale
    Fixed(f64),
}

/// How perturbation magnitudes are drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationConfig {
    pub distribution: PerturbationDistribution,
    pub scale: PerturbationScale,
    /// Multiplier applied to the reference scale
    pub fraction: f64,
    /// Center of the perturbation distribution
    pub mean: f64,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            distribution: PerturbationDistribution::Normal,
            scale: PerturbationScale::StdDev,
            fraction: 1.0,
            mean: 0.0,
        }
    }
}

impl PerturbationConfig {
    /// Uniform perturbations spanning `fraction` of the column's range on either side
    #[must_use]
    pub fn uniform_range(fraction: f64) -> Self {
        Self {
            distribution: PerturbationDistribution::Uniform,
            scale: PerturbationScale::Range,
            fraction,
            mean: 0.0,
        }
    }

    /// Reference magnitude for a baseline column, before `fraction` is applied.
    ///
    /// Constant or all-missing columns fall back to `|mean|`, then to `1.0`, so
    /// perturbations stay non-zero.
    #[must_use]
    pub fn reference_scale(&self, column: &[f64]) -> f64 {
        let reference = match self.scale {
            PerturbationScale::StdDev => nan_std(column),
            PerturbationScale::Range => {
                let (min, max) = column
                    .iter()
                    .filter(|v| v.is_finite())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                max - min
            }
            PerturbationScale::Fixed(value) => return value,
        };

        if reference.is_finite() && reference > 0.0 {
            return reference;
        }

        let center = nan_mean(column).abs();
        if center.is_finite() && center > 0.0 {
            tracing::debug!(
                reference,
                fallback = center,
                "Degenerate column scale, using |mean|"
            );
            center
        } else {
            tracing::debug!(reference, "Degenerate column scale, using 1.0");
            1.0
        }
    }

    fn invalid(&self, variable: &str, scale: f64, reason: &'static str) -> SensitivityError {
        SensitivityError::InvalidPerturbation {
            variable: variable.to_string(),
            distribution: self.distribution.label(),
            scale,
            reason,
        }
    }

    /// Draw `count` perturbation offsets with the given absolute scale
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        variable: &str,
        scale: f64,
        count: usize,
    ) -> Result<Vec<f64>> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(self.invalid(variable, scale, "scale must be positive and finite"));
        }
        if !self.mean.is_finite() {
            return Err(self.invalid(variable, scale, "mean must be finite"));
        }

        match self.distribution {
            PerturbationDistribution::Normal => {
                let dist = rand_distr::Normal::new(self.mean, scale)
                    .map_err(|_| self.invalid(variable, scale, "std_dev must be finite"))?;
                Ok((0..count).map(|_| dist.sample(rng)).collect())
            }
            PerturbationDistribution::Uniform => {
                let dist =
                    rand_distr::Uniform::new_inclusive(self.mean - scale, self.mean + scale)
                        .map_err(|_| self.invalid(variable, scale, "range must be finite"))?;
                Ok((0..count).map(|_| dist.sample(rng)).collect())
            }
        }
    }
}

/// The perturbed target-column values for every trial of one input variable
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbationSet {
    pub variable: String,
    /// Absolute scale the offsets were drawn with
    pub scale: f64,
    /// `trials[t][row]` is the perturbed value of `variable` in trial `t`
    pub trials: Vec<Vec<f64>>,
}

impl PerturbationSet {
    #[must_use]
    pub fn n_trials(&self) -> usize {
        self.trials.len()
    }

    /// Full copy of the dataset for one trial; only the target column differs from `baseline`.
    pub fn trial_table(&self, baseline: &Table, trial: usize) -> Result<Table> {
        let values = self
            .trials
            .get(trial)
            .ok_or_else(|| SensitivityError::InvalidConfig(format!("no trial {trial}")))?;
        Ok(baseline.with_column_replaced(&self.variable, values.clone())?)
    }

    /// All perturbed copies of the dataset, in trial order
    pub fn copies<'a>(&'a self, baseline: &'a Table) -> impl Iterator<Item = Result<Table>> + 'a {
        (0..self.n_trials()).map(move |t| self.trial_table(baseline, t))
    }
}

/// Generate `n` perturbed versions of `variable`'s column.
///
/// Offsets are drawn trial by trial, row by row, so a fixed seed gives the
/// same perturbations regardless of how they are later executed.
pub fn generate<R: Rng + ?Sized>(
    baseline: &Table,
    variable: &str,
    n: usize,
    config: &PerturbationConfig,
    rng: &mut R,
) -> Result<PerturbationSet> {
    if n == 0 {
        return Err(SensitivityError::InvalidPerturbationCount(n));
    }
    let column = baseline
        .column(variable)
        .ok_or_else(|| SensitivityError::MissingInputVariable(variable.to_string()))?;
    if !(config.fraction.is_finite() && config.fraction > 0.0) {
        return Err(config.invalid(variable, config.fraction, "fraction must be positive"));
    }

    let scale = config.reference_scale(column) * config.fraction;
    let mut trials = Vec::with_capacity(n);
    for _ in 0..n {
        let offsets = config.sample(rng, variable, scale, column.len())?;
        trials.push(column.iter().zip(offsets).map(|(v, d)| v + d).collect());
    }

    tracing::debug!(variable, n, scale, "Generated perturbations");

    Ok(PerturbationSet {
        variable: variable.to_string(),
        scale,
        trials,
    })
}
