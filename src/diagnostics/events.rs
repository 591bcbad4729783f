use crate::camera::ProjectionMatrix;
use crate::secondary::SecondaryModel;
use nalgebra::Vector3;
use serde::Serialize;

/// One inner-loop step: the state that was evaluated, the line-search
/// internals and the state handed to the next step.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationSnapshot {
    pub cycle: usize,
    pub iteration: usize,
    pub params: ProjectionMatrix,
    pub next_params: ProjectionMatrix,
    pub cost: f64,
    pub next_cost: f64,
    pub gradient: ProjectionMatrix,
    pub normalized_gradient: ProjectionMatrix,
    pub unit_gradient: ProjectionMatrix,
    pub backtrack_iters: usize,
    pub t: f64,
    pub step_size: f64,
    pub accepted: bool,
    /// Vertices that contributed to the gradient.
    pub valid_count: usize,
    /// Colour pixel of every vertex under `params`.
    pub uv: Vec<[f64; 2]>,
    /// Field derivatives at `uv`; `None` where the sample does not exist.
    pub sampled_x: Vec<Option<f64>>,
    pub sampled_y: Vec<Option<f64>>,
}

/// Start of an outer cycle: the candidate secondary model and the vertices
/// recomputed under it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSnapshot {
    pub cycle: usize,
    pub candidate_secondary: SecondaryModel,
    pub vertices: Vec<Vector3<f64>>,
}

/// Diagnostic delivered synchronously to the caller's callback.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagnosticEvent {
    Iteration(IterationSnapshot),
    Cycle(CycleSnapshot),
}
