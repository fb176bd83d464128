//! Variance-guarded correlation and linear regression.
//!
//! Every statistic here follows the same guard-then-compute policy:
//!
//! 1. Drop positions where either sequence is NaN or infinite.
//! 2. Fewer than two finite pairs -> [`Degeneracy::InsufficientData`].
//! 3. Either side with variance below `min_variance` -> [`Degeneracy::InsufficientVariance`].
//! 4. Any non-finite intermediate -> [`Degeneracy::ComputationFailed`].
//!
//! None of these functions panic. Callers turn a [`Degeneracy`] into a NaN metric
//! plus a warning.

use std::fmt;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Default minimum variance below which a sequence is treated as constant
pub const DEFAULT_MIN_VARIANCE: f64 = 1e-10;

/// Which sequence of a pair lacked variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Input,
    Output,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => f.write_str("input"),
            Side::Output => f.write_str("output"),
        }
    }
}

/// Why a statistic could not be computed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degeneracy {
    /// Fewer than two finite (x, y) pairs
    InsufficientData { count: usize },
    /// One side is (numerically) constant
    InsufficientVariance { side: Side, variance: f64 },
    /// Numerical failure past the variance guard
    ComputationFailed { reason: String },
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degeneracy::InsufficientData { count } => {
                write!(f, "insufficient data points ({count} finite, need 2)")
            }
            Degeneracy::InsufficientVariance { side, variance } => {
                write!(f, "insufficient variance in {side} change ({variance:.2e})")
            }
            Degeneracy::ComputationFailed { reason } => {
                write!(f, "computation failed: {reason}")
            }
        }
    }
}

/// Result of a simple least-squares fit of `y` on `x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient
    pub rvalue: f64,
    /// Two-sided p-value for a non-zero slope (NaN with only two points)
    pub pvalue: f64,
    /// Standard error of the slope (NaN with only two points)
    pub stderr: f64,
}

impl LinearFit {
    #[must_use]
    pub fn r_squared(&self) -> f64 {
        self.rvalue * self.rvalue
    }
}

/// Keep only positions where both `x` and `y` are finite.
#[must_use]
pub fn finite_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip()
}

/// Arithmetic mean; NaN for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean ignoring NaN; NaN if every value is NaN. Infinities propagate.
#[must_use]
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Population variance (denominator `n`); NaN for an empty slice
#[must_use]
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation of the finite values; NaN if there are none
#[must_use]
pub fn nan_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    variance(&finite).sqrt()
}

/// Centered sums shared by correlation and regression
struct Moments {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    ss_x: f64,
    ss_y: f64,
    ss_xy: f64,
}

/// Apply the finite filter and the data/variance guards
fn guarded_moments(x: &[f64], y: &[f64], min_variance: f64) -> Result<Moments, Degeneracy> {
    let (x, y) = finite_pairs(x, y);
    let n = x.len();
    if n < 2 {
        return Err(Degeneracy::InsufficientData { count: n });
    }

    let var_x = variance(&x);
    if !(var_x >= min_variance) {
        return Err(Degeneracy::InsufficientVariance {
            side: Side::Input,
            variance: var_x,
        });
    }
    let var_y = variance(&y);
    if !(var_y >= min_variance) {
        return Err(Degeneracy::InsufficientVariance {
            side: Side::Output,
            variance: var_y,
        });
    }

    let mean_x = mean(&x);
    let mean_y = mean(&y);
    let mut ss_x = 0.0;
    let mut ss_y = 0.0;
    let mut ss_xy = 0.0;
    for (a, b) in x.iter().zip(&y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        ss_x += dx * dx;
        ss_y += dy * dy;
        ss_xy += dx * dy;
    }

    if !(ss_x.is_finite() && ss_y.is_finite() && ss_xy.is_finite()) {
        return Err(Degeneracy::ComputationFailed {
            reason: "non-finite sum of squares".to_string(),
        });
    }

    Ok(Moments {
        n,
        mean_x,
        mean_y,
        ss_x,
        ss_y,
        ss_xy,
    })
}

impl Moments {
    fn rvalue(&self) -> Result<f64, Degeneracy> {
        let r = self.ss_xy / (self.ss_x * self.ss_y).sqrt();
        if r.is_finite() {
            // Rounding can push |r| slightly past 1
            Ok(r.clamp(-1.0, 1.0))
        } else {
            Err(Degeneracy::ComputationFailed {
                reason: format!("non-finite correlation coefficient ({r})"),
            })
        }
    }
}

/// Pearson correlation of `x` and `y` under the guard policy.
pub fn pearson(x: &[f64], y: &[f64], min_variance: f64) -> Result<f64, Degeneracy> {
    guarded_moments(x, y, min_variance)?.rvalue()
}

/// Least-squares regression of `y` on `x` under the guard policy.
pub fn linregress(x: &[f64], y: &[f64], min_variance: f64) -> Result<LinearFit, Degeneracy> {
    let m = guarded_moments(x, y, min_variance)?;
    let rvalue = m.rvalue()?;
    let slope = m.ss_xy / m.ss_x;
    let intercept = m.mean_y - slope * m.mean_x;

    let (pvalue, stderr) = if m.n > 2 {
        let df = (m.n - 2) as f64;
        let one_minus_r2 = ((1.0 - rvalue) * (1.0 + rvalue)).max(0.0);
        let stderr = (one_minus_r2 * m.ss_y / m.ss_x / df).sqrt();
        let pvalue = if one_minus_r2 == 0.0 {
            0.0
        } else {
            let t = rvalue * (df / one_minus_r2).sqrt();
            let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| Degeneracy::ComputationFailed {
                reason: format!("student t distribution: {e}"),
            })?;
            2.0 * (1.0 - dist.cdf(t.abs()))
        };
        (pvalue, stderr)
    } else {
        (f64::NAN, f64::NAN)
    };

    if !(slope.is_finite() && intercept.is_finite()) {
        return Err(Degeneracy::ComputationFailed {
            reason: format!("non-finite regression coefficients (slope={slope})"),
        });
    }

    Ok(LinearFit {
        slope,
        intercept,
        rvalue,
        pvalue,
        stderr,
    })
}
