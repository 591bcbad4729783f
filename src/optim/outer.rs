//! Outer loop: projection-matrix runs alternating with secondary-model
//! conversion.
//!
//! Cycle 1 refines the device calibration on the initial vertices. Every
//! further cycle converts the refined depth intrinsics into a candidate
//! secondary model, swaps in the vertices recomputed under it and reruns
//! the inner loop from the last accepted parameters. A cycle is accepted
//! only if its cost is strictly lower than the accepted one; the first
//! non-improving cycle ends the loop.
use super::{evaluate, optimize_p, CostModel, OptimizationState, OptimizerContext};
use crate::camera::{CalibrationModel, Intrinsics, ProjectionModel};
use crate::diagnostics::{CalibrationOutcome, CycleSnapshot, DiagnosticEvent, TimingBreakdown};
use crate::edges::DiffusedField;
use crate::error::{CalibError, Result};
use crate::features::{sum_per_section, EdgeFeatures};
use crate::secondary::{
    CalibrationMetadata, ConversionInput, SecondaryModel, SecondaryModelConverter,
};
use crate::session::params::CalibrationParams;
use nalgebra::Vector3;
use std::time::Instant;

/// Everything the outer loop reads.
pub struct CalibrationProblem<'a> {
    /// Final edge set; `vertex` and `weight` must be populated.
    pub features: &'a EdgeFeatures,
    pub field: &'a DiffusedField,
    /// Device colour calibration.
    pub original: &'a CalibrationModel,
    /// Device depth intrinsics.
    pub depth_k: &'a Intrinsics,
    /// Device secondary model.
    pub secondary: &'a SecondaryModel,
    pub metadata: &'a CalibrationMetadata,
    pub params: &'a CalibrationParams,
    pub projection: &'a dyn ProjectionModel,
    pub cost: &'a dyn CostModel,
    pub converter: &'a dyn SecondaryModelConverter,
}

fn context<'b>(
    problem: &'b CalibrationProblem<'_>,
    vertices: &'b [Vector3<f64>],
) -> OptimizerContext<'b> {
    OptimizerContext {
        vertices,
        weights: &problem.features.weight,
        field: problem.field,
        reference: problem.original,
        projection: problem.projection,
        cost: problem.cost,
        line_search: &problem.params.line_search,
        limits: &problem.params.optimizer,
    }
}

/// Run the full optimization.
pub fn optimize<F>(
    problem: &CalibrationProblem<'_>,
    callback: &mut F,
) -> Result<CalibrationOutcome>
where
    F: FnMut(&DiagnosticEvent),
{
    let start_time = Instant::now();
    let params = problem.params;
    let features = problem.features;
    if features.is_empty() || features.vertex.len() != features.len() {
        return Err(CalibError::InsufficientFeatures {
            stage: "optimization",
            count: features.vertex.len(),
        });
    }

    let device_p = problem.original.to_projection();
    let reference = problem.projection.decompose(&device_p, problem.original);
    let mut vertices = features.vertex.clone();

    let mut cycle = 1usize;
    let initial = {
        let ctx = context(problem, &vertices);
        let eval = evaluate(&ctx, &reference, &device_p)?;
        OptimizationState {
            p_matrix: device_p,
            cost: eval.cost,
            gradient: eval.gradient,
        }
    };
    let first = optimize_p(
        &initial,
        &reference,
        problem.depth_k,
        cycle,
        &context(problem, &vertices),
        callback,
    )?;
    log::debug!(
        "cycle {cycle}: {} iterations, cost={:.6}",
        first.iterations,
        first.state.cost
    );
    let iterations = first.iterations;

    let mut best = first;
    let mut best_secondary = *problem.secondary;
    let mut last_cost = best.state.cost;

    while cycle < params.optimizer.max_cycles {
        cycle += 1;
        let conversion = problem.converter.convert(&ConversionInput {
            original: problem.secondary,
            metadata: problem.metadata,
            original_depth_k: problem.depth_k,
            refined_depth_k: &best.depth_intrinsics,
            features,
            z_max_sub_mm: params.features.z_max_sub_mm,
        });
        callback(&DiagnosticEvent::Cycle(CycleSnapshot {
            cycle,
            candidate_secondary: conversion.model,
            vertices: conversion.vertices.clone(),
        }));
        if conversion.vertices.len() != features.len() {
            return Err(CalibError::malformed(format!(
                "secondary conversion returned {} vertices for {} edges",
                conversion.vertices.len(),
                features.len()
            )));
        }
        vertices = conversion.vertices;

        let candidate = optimize_p(
            &best.state,
            &best.calibration,
            problem.depth_k,
            cycle,
            &context(problem, &vertices),
            callback,
        )?;
        if candidate.state.cost >= last_cost {
            log::warn!(
                "cycle {cycle} did not improve (cost {:.6} >= {:.6}); keeping previous result",
                candidate.state.cost,
                last_cost
            );
            break;
        }
        log::debug!("cycle {cycle}: accepted, cost={:.6}", candidate.state.cost);
        last_cost = candidate.state.cost;
        best = candidate;
        best_secondary = conversion.model;
    }

    log::info!("calibration converged; cost={last_cost:.6}");

    let (secondary, clipped) =
        best_secondary.clip_scaling(problem.secondary, params.optimizer.max_scaling_step);
    if clipped {
        log::warn!(
            "secondary scales clipped to ±{} of the device model",
            params.optimizer.max_scaling_step
        );
    }

    let section_count = params.features.section_count_x * params.features.section_count_y;
    let mut timing = TimingBreakdown::default();
    timing.record_since("optimize", start_time);

    Ok(CalibrationOutcome {
        calibration: best.calibration,
        secondary,
        cost: last_cost,
        initial_cost: initial.cost,
        iterations,
        cycles: cycle,
        depth_intrinsics: best.depth_intrinsics,
        section_weights: sum_per_section(&features.section, &features.weight, section_count),
        timing,
    })
}
