//! Fluent front end for running a sensitivity analysis.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::analysis::sensitivity_analysis;
use crate::error::Result;
use crate::model::{SensitivityResults, Table};
use crate::normalization::Normalization;
use crate::perturbation::PerturbationConfig;
use crate::process::ForwardProcess;

use super::SensitivityConfig;

/// Collects variables and settings, then runs the analysis with a seeded `StdRng`.
#[derive(Debug, Clone, Default)]
pub struct SensitivityBuilder {
    input_variables: Vec<String>,
    output_variables: Vec<String>,
    config: SensitivityConfig,
    seed: Option<u64>,
}

impl SensitivityBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_variables.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_variables
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn config(mut self, config: SensitivityConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn n(mut self, n: usize) -> Self {
        self.config.n = n;
        self
    }

    #[must_use]
    pub fn joint_run(mut self, use_joint_run: bool) -> Self {
        self.config.use_joint_run = use_joint_run;
        self
    }

    #[must_use]
    pub fn normalization(mut self, normalization: Normalization) -> Self {
        self.config.normalization = normalization;
        self
    }

    #[must_use]
    pub fn perturbation(mut self, perturbation: PerturbationConfig) -> Self {
        self.config.perturbation = perturbation;
        self
    }

    #[must_use]
    pub fn min_variance(mut self, min_variance: f64) -> Self {
        self.config.min_variance = min_variance;
        self
    }

    #[must_use]
    pub fn drop_missing(mut self, drop_missing: bool) -> Self {
        self.config.drop_missing = drop_missing;
        self
    }

    /// Fix the random seed; without one the generator is seeded from the OS
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn run<P: ForwardProcess + ?Sized>(
        &self,
        input: &Table,
        process: &mut P,
    ) -> Result<SensitivityResults> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        sensitivity_analysis(
            input,
            &self.input_variables,
            &self.output_variables,
            process,
            &self.config,
            &mut rng,
        )
    }
}
