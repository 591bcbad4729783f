//! Parameter types configuring the calibration stages.
//!
//! Defaults reproduce the device tuning: 640×480-class depth streams with a
//! 2×2 section grid and constant per-vertex weights. Resolution-dependent
//! overrides are applied by [`CalibrationParams::for_depth_resolution`].

use crate::camera::ProjectionMatrix;
use crate::features::WeightPolicy;
use serde::{Deserialize, Serialize};

/// Per-parameter scales of the projection-matrix gradient.
pub const DEFAULT_NORMALIZE_MAT: [f64; 12] = [
    0.35369244,
    0.26619774,
    1.0092601,
    0.00067320449,
    0.35508525,
    0.26627505,
    1.011458,
    0.00067501375,
    414.20557,
    313.34106,
    1187.3459,
    0.79157025,
];

/// Calibration-wide parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    pub features: FeatureParams,
    pub diffusion: DiffusionParams,
    pub line_search: LineSearchParams,
    pub optimizer: OptimizerParams,
}

impl CalibrationParams {
    /// Copy with resolution-dependent thresholds applied.
    pub fn for_depth_resolution(&self, width: usize, height: usize) -> Self {
        let mut params = self.clone();
        if width == 1024 && height == 768 {
            log::debug!(
                "depth resolution {width}x{height}: IR threshold {} -> {}",
                params.features.grad_ir_threshold,
                params.features.xga_grad_ir_threshold
            );
            params.features.grad_ir_threshold = params.features.xga_grad_ir_threshold;
        }
        params
    }
}

/// Edge extraction and vertex construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// IR edge magnitude a pixel must exceed to become a candidate.
    pub grad_ir_threshold: f64,
    /// IR threshold used instead for 1024×768 depth streams.
    pub xga_grad_ir_threshold: f64,
    /// Depth gradient along the edge direction a candidate must exceed.
    pub grad_z_threshold: f64,
    /// Upper clamp of the gradient-derived weights.
    pub grad_z_max: f64,
    /// Raw depth units per millimetre.
    pub z_max_sub_mm: f64,
    pub section_count_x: usize,
    pub section_count_y: usize,
    pub weights: WeightPolicy,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            grad_ir_threshold: 3.5,
            xga_grad_ir_threshold: 2.5,
            grad_z_threshold: 25.0,
            grad_z_max: 1000.0,
            z_max_sub_mm: 4.0,
            section_count_x: 2,
            section_count_y: 2,
            weights: WeightPolicy::default(),
        }
    }
}

/// Colour edge diffusion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionParams {
    /// Decay per propagated pixel, in `(0, 1)`.
    pub gamma: f64,
    /// Weight of the undiffused edges in the blend.
    pub alpha: f64,
}

impl Default for DiffusionParams {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            alpha: 1.0 / 3.0,
        }
    }
}

/// Backtracking line search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSearchParams {
    pub max_step_size: f64,
    pub min_step_size: f64,
    /// Sufficient-decrease factor.
    pub control_param: f64,
    /// Step decay per backtracking iteration.
    pub tau: f64,
    pub max_backtrack_iters: usize,
    pub normalize_mat: ProjectionMatrix,
}

impl Default for LineSearchParams {
    fn default() -> Self {
        Self {
            max_step_size: 1.0,
            min_step_size: 1e-5,
            control_param: 0.5,
            tau: 0.5,
            max_backtrack_iters: 50,
            normalize_mat: ProjectionMatrix::new(DEFAULT_NORMALIZE_MAT),
        }
    }
}

/// Inner (projection matrix) and outer (cycle) loop limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    /// Stop when the parameter step norm falls below this.
    pub min_p_matrix_delta: f64,
    /// Stop when the absolute cost change falls below this.
    pub min_cost_delta: f64,
    pub max_optimization_iters: usize,
    pub max_cycles: usize,
    /// Largest relative scale change of the reported secondary model.
    pub max_scaling_step: f64,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            min_p_matrix_delta: 1e-5,
            min_cost_delta: 1.0,
            max_optimization_iters: 50,
            max_cycles: 10,
            max_scaling_step: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "features": { "grad_ir_threshold": 4.0 }, "optimizer": { "max_cycles": 3 } }"#;
        let params: CalibrationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.features.grad_ir_threshold, 4.0);
        assert_eq!(params.features.grad_z_threshold, 25.0);
        assert_eq!(params.optimizer.max_cycles, 3);
        assert_eq!(params.optimizer.max_optimization_iters, 50);
        assert_eq!(params.line_search.normalize_mat.vals, DEFAULT_NORMALIZE_MAT);
    }

    #[test]
    fn weight_policy_is_tagged() {
        let json = r#"{ "features": { "weights": { "kind": "gradient_clamped" } } }"#;
        let params: CalibrationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.features.weights, WeightPolicy::GradientClamped);
    }

    #[test]
    fn xga_lowers_ir_threshold() {
        let params = CalibrationParams::default();
        assert_eq!(params.for_depth_resolution(1024, 768).features.grad_ir_threshold, 2.5);
        assert_eq!(params.for_depth_resolution(640, 480).features.grad_ir_threshold, 3.5);
    }
}
