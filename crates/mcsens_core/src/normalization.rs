//! Normalization of perturbation deltas.
//!
//! A normalization maps the perturbed and unperturbed values of one column
//! (one trial, all rows) to normalized deltas that are comparable across
//! variables of different scale.

use serde::{Deserialize, Serialize};

use crate::stats::nan_std;

/// Denominators smaller than this in magnitude yield NaN instead of +/-Inf
pub const NEAR_ZERO: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Normalization {
    /// `|perturbed - unperturbed| / |unperturbed|`
    #[default]
    DivideAbsoluteByUnperturbed,
    /// `(perturbed - unperturbed) / unperturbed`
    DivideByUnperturbed,
    /// `(perturbed - unperturbed) / std(unperturbed column)`
    DivideByStd,
    /// Raw delta `perturbed - unperturbed`
    Identity,
    /// Element-wise `f(perturbed, unperturbed)`
    #[serde(skip)]
    Custom(fn(f64, f64) -> f64),
}

impl PartialEq for Normalization {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => std::ptr::fn_addr_eq(*a, *b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < NEAR_ZERO {
        f64::NAN
    } else {
        numerator / denominator
    }
}

impl Normalization {
    /// Normalize one element
    fn apply_one(&self, perturbed: f64, unperturbed: f64, column_std: f64) -> f64 {
        let delta = perturbed - unperturbed;
        match self {
            Self::DivideAbsoluteByUnperturbed => guarded_ratio(delta.abs(), unperturbed.abs()),
            Self::DivideByUnperturbed => guarded_ratio(delta, unperturbed),
            Self::DivideByStd => guarded_ratio(delta, column_std),
            Self::Identity => delta,
            Self::Custom(f) => f(perturbed, unperturbed),
        }
    }

    /// Normalize a column of deltas. Both slices must have the same length.
    #[must_use]
    pub fn apply(&self, perturbed: &[f64], unperturbed: &[f64]) -> Vec<f64> {
        debug_assert_eq!(perturbed.len(), unperturbed.len());
        let column_std = match self {
            Self::DivideByStd => nan_std(unperturbed),
            _ => f64::NAN,
        };
        perturbed
            .iter()
            .zip(unperturbed)
            .map(|(&p, &u)| self.apply_one(p, u, column_std))
            .collect()
    }
}
