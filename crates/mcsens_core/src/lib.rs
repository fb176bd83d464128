//! Monte Carlo sensitivity analysis library
//!
//! This crate estimates, for every (input variable, output variable) pair, how
//! strongly perturbing the input changes the output of a caller-supplied
//! forward process. It supports:
//! - Seeded Normal/Uniform perturbations scaled to each column's spread
//! - Looped execution (one forward call per trial) and joint execution (one
//!   batched forward call for all trials)
//! - Variance-guarded correlation, R², and mean normalized change that turn
//!   degenerate inputs into NaN plus a warning instead of an error
//!
//! # Builder DSL
//!
//! ```ignore
//! use mcsens_core::{SensitivityBuilder, Table};
//!
//! let dataset = Table::from_columns([
//!     ("x", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
//!     ("y", vec![2.0, 4.0, 6.0, 8.0, 10.0]),
//! ])?;
//!
//! let mut model = |t: &Table| -> Result<Table, mcsens_core::BoxError> {
//!     let x = t.column("x").unwrap();
//!     let y = t.column("y").unwrap();
//!     let mut out = t.clone();
//!     out.push_column("z", x.iter().zip(y).map(|(a, b)| 2.0 * a + b).collect())?;
//!     Ok(out)
//! };
//!
//! let results = SensitivityBuilder::new()
//!     .inputs(["x", "y"])
//!     .outputs(["z"])
//!     .n(100)
//!     .seed(456)
//!     .run(&dataset, &mut model)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod normalization;
pub mod perturbation;
pub mod process;
pub mod stats;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::sensitivity_analysis;
pub use config::{SensitivityBuilder, SensitivityConfig};
pub use error::{BoxError, SensitivityError, TableError};
pub use execution::ExecutionMode;
pub use model::{
    MetricKind, MetricRecord, MetricWarning, MetricsTable, PerturbationRecord, PerturbationTable,
    SensitivityResults, Table,
};
pub use normalization::Normalization;
pub use perturbation::{PerturbationConfig, PerturbationDistribution, PerturbationScale};
pub use process::ForwardProcess;
