//! Backtracking line search along the normalized gradient.
//!
//! 1. `g = (∇ / ‖∇‖₂) ./ normalize_mat`, `unit = g / ‖g‖₂` (spectral norms).
//! 2. `t = -control_param · Σ g ⊙ unit`, `step = max_step_size · ‖g‖₂ / ‖unit‖₂`.
//! 3. Candidate `P + step · unit`; shrink `step` by `tau` while the cost
//!    change is not below `step · t`, the step stays above `min_step_size`
//!    and the iteration budget lasts.
//!
//! A step that never satisfies the decrease condition leaves the state
//! untouched.
use super::{OptimizationState, OptimizerContext};
use crate::camera::ProjectionMatrix;

/// Result of one line search.
#[derive(Clone, Debug)]
pub struct LineSearchOutcome {
    /// Accepted state, or the input state when no step was accepted.
    pub state: OptimizationState,
    pub accepted: bool,
    pub backtrack_iters: usize,
    /// Sufficient-decrease slope.
    pub t: f64,
    /// Final step size tried.
    pub step_size: f64,
    pub normalized_gradient: ProjectionMatrix,
    pub unit_gradient: ProjectionMatrix,
}

impl LineSearchOutcome {
    fn rejected(state: &OptimizationState) -> Self {
        Self {
            state: *state,
            accepted: false,
            backtrack_iters: 0,
            t: 0.0,
            step_size: 0.0,
            normalized_gradient: ProjectionMatrix::zeros(),
            unit_gradient: ProjectionMatrix::zeros(),
        }
    }
}

fn cost_at(ctx: &OptimizerContext<'_>, p: &ProjectionMatrix) -> f64 {
    let model = ctx.projection.decompose(p, ctx.reference);
    let uv = ctx.projection.project(ctx.vertices, &model, p);
    ctx.cost.cost(ctx.weights, ctx.field, &uv)
}

/// Search for a sufficient decrease from `current`.
///
/// `current.cost` must be the cost at `current.p_matrix`. The returned
/// state carries the cost at the accepted parameters and the gradient of
/// `current` (the next evaluation replaces it).
pub fn line_search(current: &OptimizationState, ctx: &OptimizerContext<'_>) -> LineSearchOutcome {
    let params = ctx.line_search;
    let grad_norm = current.gradient.matrix_norm();
    if !grad_norm.is_finite() || grad_norm == 0.0 {
        log::debug!("line search: vanishing gradient, keeping state");
        return LineSearchOutcome::rejected(current);
    }
    let grad = (current.gradient / grad_norm).normalize(&params.normalize_mat);
    let norm = grad.matrix_norm();
    let unit = grad / norm;
    let t = (grad * -params.control_param * unit).sum();
    let mut step = params.max_step_size * norm / unit.matrix_norm();

    let mut candidate = current.p_matrix + unit * step;
    let mut cost = cost_at(ctx, &candidate);
    let mut diff = cost - current.cost;

    let mut iters = 0usize;
    while diff >= step * t
        && step.abs() > params.min_step_size
        && iters < params.max_backtrack_iters
    {
        iters += 1;
        log::debug!("    backtracking: cost={cost:.6} step={step:.3e}");
        step *= params.tau;
        candidate = current.p_matrix + unit * step;
        cost = cost_at(ctx, &candidate);
        diff = cost - current.cost;
    }

    let accepted = diff < step * t;
    let state = if accepted {
        OptimizationState {
            p_matrix: candidate,
            cost,
            gradient: current.gradient,
        }
    } else {
        *current
    };
    LineSearchOutcome {
        state,
        accepted,
        backtrack_iters: iters,
        t,
        step_size: step,
        normalized_gradient: grad,
        unit_gradient: unit,
    }
}
