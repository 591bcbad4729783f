//! Inner loop: projection-matrix refinement to local convergence.
use super::{evaluate, line_search, OptimizationState, OptimizerContext};
use crate::camera::{CalibrationModel, Intrinsics};
use crate::diagnostics::{DiagnosticEvent, IterationSnapshot};
use crate::error::Result;

/// Terminal state of one inner-loop run.
#[derive(Clone, Debug)]
pub struct InnerOutcome {
    /// Parameters rebuilt with the device focal lengths; `cost` is the cost
    /// of the last accepted step.
    pub state: OptimizationState,
    /// Decomposed calibration with the device focal lengths restored.
    pub calibration: CalibrationModel,
    /// Depth intrinsics absorbing the focal change of the colour camera.
    pub depth_intrinsics: Intrinsics,
    /// Completed iterations (`<= max_optimization_iters`).
    pub iterations: usize,
}

/// Refine `start.p_matrix` until the step, the cost change or the
/// iteration budget runs out.
///
/// `model` is the calibration decomposed from `start.p_matrix`. After the
/// loop the colour focal change is moved into the depth intrinsics
/// (`fx' = fx_depth · fx_start / fx_new`, same for y) and the colour
/// calibration gets the device focal lengths back.
pub fn optimize_p<F>(
    start: &OptimizationState,
    model: &CalibrationModel,
    depth_k: &Intrinsics,
    cycle: usize,
    ctx: &OptimizerContext<'_>,
    callback: &mut F,
) -> Result<InnerOutcome>
where
    F: FnMut(&DiagnosticEvent),
{
    let limits = ctx.limits;
    let mut curr = *start;
    let mut calibration = *model;
    let mut iterations = 0usize;

    let next = loop {
        let eval = evaluate(ctx, &calibration, &curr.p_matrix)?;
        curr = OptimizationState {
            p_matrix: curr.p_matrix,
            cost: eval.cost,
            gradient: eval.gradient,
        };
        log::debug!("    {iterations}: cost={:.6}", curr.cost);

        let search = line_search(&curr, ctx);
        let next = search.state;
        callback(&DiagnosticEvent::Iteration(IterationSnapshot {
            cycle,
            iteration: iterations,
            params: curr.p_matrix,
            next_params: next.p_matrix,
            cost: curr.cost,
            next_cost: next.cost,
            gradient: curr.gradient,
            normalized_gradient: search.normalized_gradient,
            unit_gradient: search.unit_gradient,
            backtrack_iters: search.backtrack_iters,
            t: search.t,
            step_size: search.step_size,
            accepted: search.accepted,
            valid_count: eval.valid_count,
            uv: eval.uv,
            sampled_x: eval.sampled_x,
            sampled_y: eval.sampled_y,
        }));

        let step_norm = (next.p_matrix - curr.p_matrix).frobenius_norm();
        if step_norm < limits.min_p_matrix_delta {
            log::debug!(
                "... step norm {step_norm:.3e} < {:.3e}, stopping",
                limits.min_p_matrix_delta
            );
            break next;
        }
        let delta = (next.cost - curr.cost).abs();
        if delta < limits.min_cost_delta {
            log::debug!("... cost delta {delta:.3e} < {}, stopping", limits.min_cost_delta);
            break next;
        }
        iterations += 1;
        if iterations >= limits.max_optimization_iters {
            log::debug!("... reached {iterations} iterations, stopping");
            break next;
        }
        curr = next;
        calibration = ctx.projection.decompose(&curr.p_matrix, ctx.reference);
    };

    if iterations == 0 {
        log::info!("calibration not necessary; nothing done");
    } else {
        log::info!(
            "calibration finished after {iterations} iterations; original cost={:.6} optimized cost={:.6}",
            start.cost,
            next.cost
        );
    }

    let refined = ctx.projection.decompose(&next.p_matrix, ctx.reference);
    let initial = ctx.projection.decompose(&start.p_matrix, ctx.reference);
    let depth_intrinsics = depth_k.with_focal(
        depth_k.fx * initial.intrinsics.fx / refined.intrinsics.fx,
        depth_k.fy * initial.intrinsics.fy / refined.intrinsics.fy,
    );
    let calibration = refined.with_focal(ctx.reference.intrinsics.fx, ctx.reference.intrinsics.fy);

    Ok(InnerOutcome {
        state: OptimizationState {
            p_matrix: calibration.to_projection(),
            ..next
        },
        calibration,
        depth_intrinsics,
        iterations,
    })
}
