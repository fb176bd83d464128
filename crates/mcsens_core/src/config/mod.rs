//! Sensitivity analysis configuration
//!
//! The main configuration type is `SensitivityConfig`. Every field has a
//! default, so partial configurations deserialize cleanly.
//!
//! # Builder DSL
//!
//! For a more ergonomic way to run an analysis, use the builder:
//!
//! ```ignore
//! use mcsens_core::SensitivityBuilder;
//!
//! let results = SensitivityBuilder::new()
//!     .inputs(["temperature", "pressure"])
//!     .outputs(["efficiency"])
//!     .n(100)
//!     .seed(42)
//!     .run(&dataset, &mut model)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SensitivityError};
use crate::execution::ExecutionMode;
use crate::normalization::Normalization;
use crate::perturbation::{PerturbationConfig, PerturbationScale};
use crate::stats::DEFAULT_MIN_VARIANCE;

pub mod builder;

pub use builder::SensitivityBuilder;

/// Default number of perturbations per input variable
pub const DEFAULT_PERTURBATIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Perturbations per input variable
    pub n: usize,
    /// Batch all perturbations into a single forward process call
    pub use_joint_run: bool,
    pub normalization: Normalization,
    pub perturbation: PerturbationConfig,
    /// Variance below which a sequence is treated as constant
    pub min_variance: f64,
    /// Drop perturbation records with missing raw values before computing metrics
    pub drop_missing: bool,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_PERTURBATIONS,
            use_joint_run: true,
            normalization: Normalization::default(),
            perturbation: PerturbationConfig::default(),
            min_variance: DEFAULT_MIN_VARIANCE,
            drop_missing: true,
        }
    }
}

impl SensitivityConfig {
    #[must_use]
    pub fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::from_joint_flag(self.use_joint_run)
    }

    /// Check the settings that do not depend on the dataset
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(SensitivityError::InvalidPerturbationCount(self.n));
        }
        if !(self.min_variance.is_finite() && self.min_variance >= 0.0) {
            return Err(SensitivityError::InvalidConfig(format!(
                "min_variance must be finite and non-negative, got {}",
                self.min_variance
            )));
        }
        if !(self.perturbation.fraction.is_finite() && self.perturbation.fraction > 0.0) {
            return Err(SensitivityError::InvalidConfig(format!(
                "perturbation fraction must be positive, got {}",
                self.perturbation.fraction
            )));
        }
        if let PerturbationScale::Fixed(scale) = self.perturbation.scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(SensitivityError::InvalidConfig(format!(
                    "fixed perturbation scale must be positive and finite, got {scale}"
                )));
            }
        }
        if !self.perturbation.mean.is_finite() {
            return Err(SensitivityError::InvalidConfig(format!(
                "perturbation mean must be finite, got {}",
                self.perturbation.mean
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perturbation::PerturbationDistribution;

    #[test]
    fn test_defaults() {
        let config = SensitivityConfig::default();
        assert_eq!(config.n, 50);
        assert!(config.use_joint_run);
        assert_eq!(config.execution_mode(), ExecutionMode::Joint);
        assert_eq!(config.normalization, Normalization::DivideAbsoluteByUnperturbed);
        assert_eq!(config.min_variance, 1e-10);
        assert!(config.drop_missing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let json = r#"{
            "n": 100,
            "use_joint_run": false,
            "normalization": { "type": "DivideByStd" },
            "perturbation": { "distribution": "Uniform", "scale": { "type": "Fixed", "value": 0.5 } }
        }"#;
        let config: SensitivityConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.n, 100);
        assert_eq!(config.execution_mode(), ExecutionMode::Looped);
        assert_eq!(config.normalization, Normalization::DivideByStd);
        assert_eq!(
            config.perturbation.distribution,
            PerturbationDistribution::Uniform
        );
        assert_eq!(config.perturbation.scale, PerturbationScale::Fixed(0.5));
        assert_eq!(config.perturbation.fraction, 1.0);
        assert_eq!(config.min_variance, DEFAULT_MIN_VARIANCE);
        assert!(config.drop_missing);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_n = SensitivityConfig {
            n: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_n.validate(),
            Err(SensitivityError::InvalidPerturbationCount(0))
        ));

        let bad_variance = SensitivityConfig {
            min_variance: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            bad_variance.validate(),
            Err(SensitivityError::InvalidConfig(_))
        ));

        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let bad_scale = SensitivityConfig {
                perturbation: PerturbationConfig {
                    scale: PerturbationScale::Fixed(scale),
                    ..Default::default()
                },
                ..Default::default()
            };
            assert!(
                matches!(bad_scale.validate(), Err(SensitivityError::InvalidConfig(_))),
                "Fixed({scale}) should be rejected"
            );
        }
    }
}
