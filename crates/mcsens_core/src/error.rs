use std::fmt;

/// Boxed error returned by a forward process
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors related to table construction and column access
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    DuplicateColumn(String),
    ColumnNotFound(String),
    /// Tables being stacked do not share the same column layout
    IncompatibleColumns,
    RowRangeOutOfBounds {
        start: usize,
        len: usize,
        n_rows: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::ColumnLengthMismatch {
                column,
                expected,
                actual,
            } => write!(
                f,
                "column '{column}' has {actual} rows, expected {expected}"
            ),
            TableError::DuplicateColumn(name) => write!(f, "duplicate column '{name}'"),
            TableError::ColumnNotFound(name) => write!(f, "column '{name}' not found"),
            TableError::IncompatibleColumns => {
                write!(f, "tables do not share the same column layout")
            }
            TableError::RowRangeOutOfBounds { start, len, n_rows } => write!(
                f,
                "row range {start}..{} out of bounds for table with {n_rows} rows",
                start + len
            ),
        }
    }
}

impl std::error::Error for TableError {}

/// Errors that abort a sensitivity analysis.
///
/// Statistical degeneracy is never reported here; it resolves to NaN metrics
/// plus a [`crate::model::MetricWarning`].
#[derive(Debug)]
pub enum SensitivityError {
    EmptyDataset,
    InvalidPerturbationCount(usize),
    NoInputVariables,
    NoOutputVariables,
    DuplicateVariable(String),
    MissingInputVariable(String),
    /// Output variable absent from the forward process result
    MissingOutputVariable(String),
    /// Forward process returned a different number of rows than it was given
    RowCountMismatch {
        expected: usize,
        actual: usize,
    },
    InvalidPerturbation {
        variable: String,
        distribution: &'static str,
        scale: f64,
        reason: &'static str,
    },
    InvalidConfig(String),
    Table(TableError),
    /// The forward process itself failed; the caller's error is kept as the source
    ForwardProcess(BoxError),
}

impl fmt::Display for SensitivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensitivityError::EmptyDataset => write!(f, "input dataset is empty"),
            SensitivityError::InvalidPerturbationCount(n) => {
                write!(f, "perturbation count must be positive, got {n}")
            }
            SensitivityError::NoInputVariables => write!(f, "no input variables given"),
            SensitivityError::NoOutputVariables => write!(f, "no output variables given"),
            SensitivityError::DuplicateVariable(name) => {
                write!(f, "variable '{name}' listed more than once")
            }
            SensitivityError::MissingInputVariable(name) => {
                write!(f, "input variable '{name}' not found in dataset")
            }
            SensitivityError::MissingOutputVariable(name) => {
                write!(
                    f,
                    "output variable '{name}' not produced by forward process"
                )
            }
            SensitivityError::RowCountMismatch { expected, actual } => write!(
                f,
                "forward process returned {actual} rows for {expected} input rows"
            ),
            SensitivityError::InvalidPerturbation {
                variable,
                distribution,
                scale,
                reason,
            } => write!(
                f,
                "invalid {distribution} perturbation for '{variable}' (scale={scale}): {reason}"
            ),
            SensitivityError::InvalidConfig(msg) => write!(f, "configuration error: {msg}"),
            SensitivityError::Table(e) => write!(f, "{e}"),
            SensitivityError::ForwardProcess(e) => write!(f, "forward process failed: {e}"),
        }
    }
}

impl std::error::Error for SensitivityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SensitivityError::Table(e) => Some(e),
            SensitivityError::ForwardProcess(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<TableError> for SensitivityError {
    fn from(e: TableError) -> Self {
        SensitivityError::Table(e)
    }
}

pub type Result<T> = std::result::Result<T, SensitivityError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[derive(Debug)]
    struct ModelCrashed;

    impl fmt::Display for ModelCrashed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "model crashed")
        }
    }

    impl std::error::Error for ModelCrashed {}

    #[test]
    fn test_forward_process_error_keeps_source() {
        let err = SensitivityError::ForwardProcess(Box::new(ModelCrashed));
        assert_eq!(err.to_string(), "forward process failed: model crashed");

        let source = err.source().expect("source should be kept");
        assert!(source.downcast_ref::<ModelCrashed>().is_some());
    }

    #[test]
    fn test_table_error_converts() {
        let err: SensitivityError = TableError::DuplicateColumn("x".into()).into();
        assert!(matches!(err, SensitivityError::Table(_)));
        assert_eq!(err.to_string(), "duplicate column 'x'");
    }
}
