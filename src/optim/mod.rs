//! Projection-matrix optimization.
//!
//! - [`evaluate`]: cost and 12-parameter gradient of the current vertices.
//! - [`line_search`]: normalized-gradient backtracking step.
//! - [`optimize_p`]: inner loop to local convergence.
//! - [`optimize`]: outer cycles alternating with the secondary model.
//!
//! Everything runs synchronously on borrowed session data; the only
//! outward channel is the caller's diagnostic callback.

pub mod cost;
pub mod gradient;
pub mod inner;
pub mod line_search;
pub mod outer;
pub mod state;

pub use cost::{CostModel, EdgeAlignmentCost};
pub use gradient::{evaluate, Evaluation};
pub use inner::{optimize_p, InnerOutcome};
pub use line_search::{line_search, LineSearchOutcome};
pub use outer::{optimize, CalibrationProblem};
pub use state::OptimizationState;

use crate::camera::{CalibrationModel, ProjectionModel};
use crate::edges::DiffusedField;
use crate::session::params::{LineSearchParams, OptimizerParams};
use nalgebra::Vector3;

/// Borrowed inputs shared by the evaluation, line search and inner loop.
#[derive(Clone, Copy)]
pub struct OptimizerContext<'a> {
    pub vertices: &'a [Vector3<f64>],
    /// Index-aligned with `vertices`.
    pub weights: &'a [f64],
    pub field: &'a DiffusedField,
    /// Device calibration; supplies what decomposition cannot recover and
    /// the focal lengths restored after every inner loop.
    pub reference: &'a CalibrationModel,
    pub projection: &'a dyn ProjectionModel,
    pub cost: &'a dyn CostModel,
    pub line_search: &'a LineSearchParams,
    pub limits: &'a OptimizerParams,
}
