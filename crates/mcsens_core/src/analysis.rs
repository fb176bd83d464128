//! Sensitivity analysis entry point.
//!
//! Runs the full pipeline: validate the inputs, generate perturbations for
//! every input variable, evaluate the baseline once, execute the perturbations
//! with the configured strategy, and aggregate metrics.

use rand::Rng;
use rustc_hash::FxHashSet;

use crate::config::SensitivityConfig;
use crate::error::{Result, SensitivityError};
use crate::execution::{Baseline, ExecutionContext, execute};
use crate::metrics::aggregate_metrics;
use crate::model::{PerturbationTable, SensitivityResults, Table};
use crate::perturbation::{self, PerturbationSet};
use crate::process::{CheckedProcess, ForwardProcess};

fn owned_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|s| s.as_ref().to_string()).collect()
}

/// Check everything that can be checked before the forward process is called
fn validate_inputs(
    input: &Table,
    input_variables: &[String],
    output_variables: &[String],
    config: &SensitivityConfig,
) -> Result<()> {
    if input.is_empty() {
        return Err(SensitivityError::EmptyDataset);
    }
    config.validate()?;
    if input_variables.is_empty() {
        return Err(SensitivityError::NoInputVariables);
    }
    if output_variables.is_empty() {
        return Err(SensitivityError::NoOutputVariables);
    }

    for names in [input_variables, output_variables] {
        let mut seen = FxHashSet::default();
        if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(SensitivityError::DuplicateVariable(dup.clone()));
        }
    }

    if let Some(missing) = input_variables.iter().find(|name| !input.has_column(name)) {
        return Err(SensitivityError::MissingInputVariable(missing.clone()));
    }
    Ok(())
}

/// Estimate how strongly each input variable drives each output variable.
///
/// `process` must be row-independent (see [`ForwardProcess`]). Random draws
/// come only from `rng`, so seeding it makes the perturbations reproducible.
///
/// Input contract violations fail before the forward process is called, with
/// the exception of missing output variables, which are detected on the
/// baseline call. Forward process errors are returned with the caller's
/// error as their source. Statistical degeneracy never fails the run; it
/// produces NaN metrics and entries in [`SensitivityResults::warnings`].
pub fn sensitivity_analysis<S, P, R>(
    input: &Table,
    input_variables: &[S],
    output_variables: &[S],
    process: &mut P,
    config: &SensitivityConfig,
    rng: &mut R,
) -> Result<SensitivityResults>
where
    S: AsRef<str>,
    P: ForwardProcess + ?Sized,
    R: Rng + ?Sized,
{
    let input_variables = owned_names(input_variables);
    let output_variables = owned_names(output_variables);
    validate_inputs(input, &input_variables, &output_variables, config)?;

    // Must precede the first forward call
    let sets = input_variables
        .iter()
        .map(|variable| {
            perturbation::generate(input, variable, config.n, &config.perturbation, rng)
        })
        .collect::<Result<Vec<PerturbationSet>>>()?;

    let mut checked = CheckedProcess::new(process, &output_variables);
    let baseline = Baseline {
        inputs: input,
        outputs: checked.run(input)?,
    };

    let mode = config.execution_mode();
    let ctx = ExecutionContext {
        baseline: &baseline,
        output_variables: &output_variables,
        normalization: config.normalization,
    };
    let mut records = execute(mode, &ctx, &sets, &mut checked)?;

    if config.drop_missing {
        let before = records.len();
        records.retain(|r| r.has_complete_values());
        let dropped = before - records.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped records with missing values");
        }
    }

    let perturbations = PerturbationTable { records };
    let (metrics, warnings) = aggregate_metrics(
        &perturbations,
        &input_variables,
        &output_variables,
        config.min_variance,
    );

    let forward_process_calls = checked.calls();
    tracing::info!(
        mode = ?mode,
        forward_process_calls,
        perturbation_records = perturbations.len(),
        metrics = metrics.len(),
        warnings = warnings.len(),
        "Sensitivity analysis complete"
    );

    Ok(SensitivityResults {
        perturbations,
        metrics,
        warnings,
        forward_process_calls,
    })
}
