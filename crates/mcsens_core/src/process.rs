//! The caller-supplied forward process.

use crate::error::{BoxError, Result, SensitivityError};
use crate::model::Table;

/// A model mapping an input table to an output table.
///
/// The result must contain every output variable and exactly one row per
/// input row. Implementations must be row-independent: each output row may
/// depend only on the matching input row. The joint execution mode stacks
/// many perturbed datasets into one call and relies on this; the engine
/// cannot verify it.
pub trait ForwardProcess {
    fn run(&mut self, inputs: &Table) -> std::result::Result<Table, BoxError>;
}

impl<F, E> ForwardProcess for F
where
    F: FnMut(&Table) -> std::result::Result<Table, E>,
    E: Into<BoxError>,
{
    fn run(&mut self, inputs: &Table) -> std::result::Result<Table, BoxError> {
        self(inputs).map_err(Into::into)
    }
}

/// Wraps a forward process, counting calls and checking the shape of each result.
pub(crate) struct CheckedProcess<'a, P: ForwardProcess + ?Sized> {
    inner: &'a mut P,
    output_variables: &'a [String],
    calls: usize,
}

impl<'a, P: ForwardProcess + ?Sized> CheckedProcess<'a, P> {
    pub(crate) fn new(inner: &'a mut P, output_variables: &'a [String]) -> Self {
        Self {
            inner,
            output_variables,
            calls: 0,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls
    }

    /// Run the process once; errors from the process pass through as the error source.
    pub(crate) fn run(&mut self, inputs: &Table) -> Result<Table> {
        self.calls += 1;
        let outputs = self
            .inner
            .run(inputs)
            .map_err(SensitivityError::ForwardProcess)?;

        if outputs.n_rows() != inputs.n_rows() {
            return Err(SensitivityError::RowCountMismatch {
                expected: inputs.n_rows(),
                actual: outputs.n_rows(),
            });
        }
        if let Some(missing) = self
            .output_variables
            .iter()
            .find(|name| !outputs.has_column(name))
        {
            return Err(SensitivityError::MissingOutputVariable(missing.clone()));
        }
        Ok(outputs)
    }
}
