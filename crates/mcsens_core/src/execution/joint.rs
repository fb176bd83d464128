//! Joint execution: all trials of all variables in one forward process call.
//!
//! Each perturbed copy of the dataset becomes a contiguous block of the
//! stacked table. The block layout is recorded up front and used to slice the
//! combined outputs back into per-(variable, trial) results.

use crate::error::Result;
use crate::model::{PerturbationRecord, Table};
use crate::perturbation::PerturbationSet;
use crate::process::{CheckedProcess, ForwardProcess};

use super::ExecutionContext;

/// Where one (variable, trial) block lives in the stacked table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockProvenance {
    set_index: usize,
    trial: usize,
    start_row: usize,
}

/// Stack every trial table and record each block's position.
fn stack_trials(
    baseline: &Table,
    sets: &[PerturbationSet],
) -> Result<(Table, Vec<BlockProvenance>)> {
    let n_rows = baseline.n_rows();
    let mut blocks = Vec::new();
    let mut tables = Vec::new();

    for (set_index, set) in sets.iter().enumerate() {
        for trial in 0..set.n_trials() {
            blocks.push(BlockProvenance {
                set_index,
                trial,
                start_row: tables.len() * n_rows,
            });
            tables.push(set.trial_table(baseline, trial)?);
        }
    }

    Ok((Table::concat(&tables)?, blocks))
}

pub(crate) fn run_joint<P: ForwardProcess + ?Sized>(
    ctx: &ExecutionContext<'_>,
    sets: &[PerturbationSet],
    process: &mut CheckedProcess<'_, P>,
) -> Result<Vec<PerturbationRecord>> {
    let inputs = ctx.baseline.inputs;
    let n_rows = inputs.n_rows();

    let (stacked, blocks) = stack_trials(inputs, sets)?;
    tracing::debug!(
        blocks = blocks.len(),
        rows = stacked.n_rows(),
        "Joint run"
    );

    let combined_outputs = process.run(&stacked)?;

    let mut records = Vec::with_capacity(stacked.n_rows() * ctx.output_variables.len());
    for block in &blocks {
        let outputs = combined_outputs.slice_rows(block.start_row, n_rows)?;
        ctx.trial_records(&sets[block.set_index], block.trial, &outputs, &mut records);
    }

    Ok(records)
}
