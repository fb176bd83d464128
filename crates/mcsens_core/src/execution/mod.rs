//! Execution strategies for running perturbed datasets through the forward process.
//!
//! Both strategies consume the same [`PerturbationSet`]s and emit
//! [`PerturbationRecord`]s in the same order (input variable, trial, row,
//! output variable), so downstream aggregation cannot tell them apart.
//!
//! - [`ExecutionMode::Looped`]: one forward call per (variable, trial).
//! - [`ExecutionMode::Joint`]: every trial of every variable stacked into a
//!   single forward call.

mod joint;
mod looped;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{PerturbationRecord, Table};
use crate::normalization::Normalization;
use crate::perturbation::PerturbationSet;
use crate::process::{CheckedProcess, ForwardProcess};

use joint::run_joint;
use looped::run_looped;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Reference semantics: `n_inputs * n + 1` forward calls
    Looped,
    /// Batched: 2 forward calls
    #[default]
    Joint,
}

impl ExecutionMode {
    #[must_use]
    pub fn from_joint_flag(use_joint_run: bool) -> Self {
        if use_joint_run {
            Self::Joint
        } else {
            Self::Looped
        }
    }

    /// Forward process calls this mode makes, including the baseline call
    #[must_use]
    pub fn expected_calls(&self, n_input_variables: usize, n: usize) -> usize {
        match self {
            Self::Looped => n_input_variables * n + 1,
            Self::Joint => 2,
        }
    }
}

/// The unperturbed dataset and the outputs of the single baseline forward call
#[derive(Debug, Clone)]
pub(crate) struct Baseline<'a> {
    pub inputs: &'a Table,
    pub outputs: Table,
}

/// Shared state for one execution: baseline, declared outputs, and normalization
pub(crate) struct ExecutionContext<'a> {
    pub baseline: &'a Baseline<'a>,
    pub output_variables: &'a [String],
    pub normalization: Normalization,
}

impl ExecutionContext<'_> {
    /// Build the records for one (variable, trial) given the perturbed outputs.
    pub(crate) fn trial_records(
        &self,
        set: &PerturbationSet,
        trial: usize,
        perturbed_outputs: &Table,
        records: &mut Vec<PerturbationRecord>,
    ) {
        let inputs = self.baseline.inputs;
        // Variable presence is validated before execution
        let input_unperturbed = inputs.column(&set.variable).unwrap_or_default();
        let input_perturbed = &set.trials[trial];
        let input_change = self.normalization.apply(input_perturbed, input_unperturbed);

        let output_changes: Vec<(&str, &[f64], &[f64], Vec<f64>)> = self
            .output_variables
            .iter()
            .map(|name| {
                let unperturbed = self.baseline.outputs.column(name).unwrap_or_default();
                let perturbed = perturbed_outputs.column(name).unwrap_or_default();
                let change = self.normalization.apply(perturbed, unperturbed);
                (name.as_str(), unperturbed, perturbed, change)
            })
            .collect();

        for row in 0..inputs.n_rows() {
            for (name, unperturbed, perturbed, change) in &output_changes {
                records.push(PerturbationRecord {
                    row_id: row,
                    trial,
                    input_variable: set.variable.clone(),
                    output_variable: (*name).to_string(),
                    input_unperturbed: input_unperturbed[row],
                    input_perturbed: input_perturbed[row],
                    output_unperturbed: unperturbed[row],
                    output_perturbed: perturbed[row],
                    input_perturbation_std: input_change[row],
                    output_perturbation_std: change[row],
                });
            }
        }
    }
}

/// Run every perturbation set through the forward process using `mode`.
pub(crate) fn execute<P: ForwardProcess + ?Sized>(
    mode: ExecutionMode,
    ctx: &ExecutionContext<'_>,
    sets: &[PerturbationSet],
    process: &mut CheckedProcess<'_, P>,
) -> Result<Vec<PerturbationRecord>> {
    match mode {
        ExecutionMode::Looped => run_looped(ctx, sets, process),
        ExecutionMode::Joint => run_joint(ctx, sets, process),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_calls() {
        assert_eq!(ExecutionMode::Looped.expected_calls(3, 50), 151);
        assert_eq!(ExecutionMode::Joint.expected_calls(3, 50), 2);
        assert_eq!(ExecutionMode::from_joint_flag(false), ExecutionMode::Looped);
        assert_eq!(ExecutionMode::default(), ExecutionMode::Joint);
    }
}
