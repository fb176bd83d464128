//! Looped execution: one forward process call per (variable, trial).

use crate::error::Result;
use crate::model::PerturbationRecord;
use crate::perturbation::PerturbationSet;
use crate::process::{CheckedProcess, ForwardProcess};

use super::ExecutionContext;

pub(crate) fn run_looped<P: ForwardProcess + ?Sized>(
    ctx: &ExecutionContext<'_>,
    sets: &[PerturbationSet],
    process: &mut CheckedProcess<'_, P>,
) -> Result<Vec<PerturbationRecord>> {
    let inputs = ctx.baseline.inputs;
    let mut records = Vec::with_capacity(
        sets.iter().map(PerturbationSet::n_trials).sum::<usize>()
            * inputs.n_rows()
            * ctx.output_variables.len(),
    );

    for set in sets {
        tracing::debug!(
            variable = set.variable.as_str(),
            trials = set.n_trials(),
            "Looped run"
        );
        for trial in 0..set.n_trials() {
            let perturbed_inputs = set.trial_table(inputs, trial)?;
            let perturbed_outputs = process.run(&perturbed_inputs)?;
            ctx.trial_records(set, trial, &perturbed_outputs, &mut records);
        }
    }

    Ok(records)
}
