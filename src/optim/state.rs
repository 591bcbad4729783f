use crate::camera::ProjectionMatrix;
use serde::Serialize;

/// Parameters, cost and gradient of one optimization step.
///
/// Each iteration produces a fresh state; states are never updated in place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationState {
    pub p_matrix: ProjectionMatrix,
    pub cost: f64,
    pub gradient: ProjectionMatrix,
}
