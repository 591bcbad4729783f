//! Calibration session: owns one depth/IR/colour snapshot, its derived
//! frame data and edge features, and runs the optimization on them.
//!
//! Typical usage:
//! ```no_run
//! use depth_rgb_calib::session::{CalibrationSession, ColorInput, DepthInput};
//! use depth_rgb_calib::session::params::CalibrationParams;
//! use depth_rgb_calib::camera::CalibrationModel;
//! use depth_rgb_calib::image::RawFrame;
//!
//! # fn example(depth: DepthInput, ir: RawFrame<u8>, color: ColorInput, model: CalibrationModel)
//! #     -> depth_rgb_calib::Result<()> {
//! let session = CalibrationSession::new(CalibrationParams::default(), depth, ir, color, model)?;
//! let outcome = session.optimize(|_event| {})?;
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```

pub mod frames;
pub mod params;

pub use frames::{
    ColorFrame, ColorFrameData, ColorInput, DepthFrameData, DepthInput, IrFrameData,
};
pub use params::CalibrationParams;

use params::OptimizerParams;

use crate::camera::{CalibrationModel, Intrinsics, PinholeProjection, ProjectionModel};
use crate::diagnostics::{CalibrationOutcome, DiagnosticEvent, TimingBreakdown};
use crate::edges::sobel_gradients;
use crate::error::{CalibError, Result};
use crate::features::{
    assign_weights, back_project, extract_candidates, relevant_pixels, retain_inside,
    section_map, validate_depth, EdgeFeatures,
};
use crate::image::RawFrame;
use crate::optim::{optimize, CalibrationProblem, CostModel, EdgeAlignmentCost};
use crate::secondary::{CalibrationMetadata, ScalingConverter, SecondaryModel, SecondaryModelConverter};
use std::path::Path;
use std::time::Instant;

/// Smallest frame side that leaves an interior after the 2-pixel margin.
const MIN_FRAME_SIDE: usize = 5;

/// Pluggable collaborators of the optimizer.
pub struct Collaborators {
    pub projection: Box<dyn ProjectionModel>,
    pub cost: Box<dyn CostModel>,
    pub converter: Box<dyn SecondaryModelConverter>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            projection: Box::new(PinholeProjection),
            cost: Box::new(EdgeAlignmentCost),
            converter: Box::new(ScalingConverter),
        }
    }
}

/// One calibration run over one snapshot.
pub struct CalibrationSession {
    params: CalibrationParams,
    depth: DepthFrameData,
    ir: IrFrameData,
    color: ColorFrameData,
    color_input: ColorInput,
    calibration: CalibrationModel,
    secondary: SecondaryModel,
    metadata: CalibrationMetadata,
    collaborators: Collaborators,
    timing: TimingBreakdown,
}

fn check_frame(name: &str, w: usize, h: usize, len: usize) -> Result<()> {
    if w < MIN_FRAME_SIDE || h < MIN_FRAME_SIDE {
        return Err(CalibError::malformed(format!(
            "{name} frame {w}x{h} is smaller than {MIN_FRAME_SIDE}x{MIN_FRAME_SIDE}"
        )));
    }
    if len != w * h {
        return Err(CalibError::malformed(format!(
            "{name} frame holds {len} samples, expected {w}x{h}"
        )));
    }
    Ok(())
}

fn check_intrinsics(name: &str, k: &Intrinsics) -> Result<()> {
    let usable = |v: f64| v.is_finite() && v != 0.0;
    if !usable(k.fx) || !usable(k.fy) || !k.ppx.is_finite() || !k.ppy.is_finite() {
        return Err(CalibError::malformed(format!(
            "{name} intrinsics are not invertible (fx={}, fy={})",
            k.fx, k.fy
        )));
    }
    Ok(())
}

fn validate_inputs(
    depth: &DepthInput,
    ir: &RawFrame<u8>,
    color: &ColorInput,
    calibration: &CalibrationModel,
) -> Result<()> {
    let (dw, dh) = (depth.frame.width, depth.frame.height);
    check_frame("depth", dw, dh, depth.frame.data.len())?;
    check_frame("IR", ir.width, ir.height, ir.data.len())?;
    if (ir.width, ir.height) != (dw, dh) {
        return Err(CalibError::malformed(format!(
            "IR frame {}x{} does not match depth frame {dw}x{dh}",
            ir.width, ir.height
        )));
    }
    let k = &depth.intrinsics;
    if (k.width, k.height) != (dw, dh) {
        return Err(CalibError::malformed(format!(
            "depth intrinsics describe {}x{}, frame is {dw}x{dh}",
            k.width, k.height
        )));
    }
    check_intrinsics("depth", k)?;

    let ck = &calibration.intrinsics;
    check_intrinsics("colour", ck)?;
    for (name, frame) in [("colour", &color.current), ("previous colour", &color.previous)] {
        let (w, h) = (frame.width(), frame.height());
        if w < MIN_FRAME_SIDE || h < MIN_FRAME_SIDE {
            return Err(CalibError::malformed(format!(
                "{name} frame {w}x{h} is smaller than {MIN_FRAME_SIDE}x{MIN_FRAME_SIDE}"
            )));
        }
        if (w, h) != (ck.width, ck.height) {
            return Err(CalibError::malformed(format!(
                "{name} frame {w}x{h} does not match the colour calibration {}x{}",
                ck.width, ck.height
            )));
        }
    }
    Ok(())
}

fn check_limits(limits: &OptimizerParams) -> Result<()> {
    if limits.max_optimization_iters == 0 || limits.max_cycles == 0 {
        return Err(CalibError::malformed(format!(
            "loop limits must be at least 1 (max_optimization_iters={}, max_cycles={})",
            limits.max_optimization_iters, limits.max_cycles
        )));
    }
    Ok(())
}

fn require_features(features: &EdgeFeatures, stage: &'static str) -> Result<()> {
    log::debug!("{stage}: {} edges", features.len());
    if features.is_empty() {
        return Err(CalibError::InsufficientFeatures { stage, count: 0 });
    }
    Ok(())
}

impl CalibrationSession {
    /// Validate the snapshot and build frame data, edge features and
    /// vertices with the default collaborators.
    pub fn new(
        params: CalibrationParams,
        depth: DepthInput,
        ir: RawFrame<u8>,
        color: ColorInput,
        calibration: CalibrationModel,
    ) -> Result<Self> {
        Self::with_collaborators(params, depth, ir, color, calibration, Collaborators::default())
    }

    pub fn with_collaborators(
        params: CalibrationParams,
        depth: DepthInput,
        ir: RawFrame<u8>,
        color: ColorInput,
        calibration: CalibrationModel,
        collaborators: Collaborators,
    ) -> Result<Self> {
        validate_inputs(&depth, &ir, &color, &calibration)?;
        check_limits(&params.optimizer)?;
        let params = params.for_depth_resolution(depth.frame.width, depth.frame.height);
        let fp = &params.features;
        let mut timing = TimingBreakdown::default();

        let start = Instant::now();
        let color_data = ColorFrameData::build(&color, &params.diffusion)?;
        timing.record_since("colour edges", start);

        let start = Instant::now();
        let ir_data = IrFrameData::build(ir, fp.grad_ir_threshold);
        let depth_f64 = depth.frame.to_f64();
        let depth_grad = sobel_gradients(&depth.frame).with_margin();
        let (w, h) = (depth.frame.width, depth.frame.height);
        let sections = section_map(w, h, fp.section_count_x, fp.section_count_y);
        timing.record_since("depth/IR gradients", start);

        let start = Instant::now();
        let candidates = extract_candidates(&ir_data.grad, &ir_data.valid, &sections);
        require_features(&candidates, "IR threshold")?;
        let validated = validate_depth(candidates, &depth_f64, &depth_grad, fp.grad_z_threshold);
        require_features(&validated, "depth validation")?;
        let weighted = assign_weights(validated, fp.weights, fp.grad_z_threshold, fp.grad_z_max);
        let projected = back_project(weighted, &depth.intrinsics, fp.z_max_sub_mm);
        let features = retain_inside(
            projected,
            collaborators.projection.as_ref(),
            &calibration,
            &calibration.to_projection(),
            calibration.intrinsics.width,
            calibration.intrinsics.height,
        )?;
        require_features(&features, "colour bounds")?;
        let relevant = relevant_pixels(&features, w, h);
        timing.record_since("edge features", start);
        log::info!("{} edge vertices from a {w}x{h} depth frame", features.len());

        let depth_data = DepthFrameData {
            frame: depth.frame,
            depth: depth_f64,
            intrinsics: depth.intrinsics,
            depth_units: depth.depth_units,
            grad: depth_grad,
            sections,
            features,
            relevant,
        };

        Ok(Self {
            params,
            depth: depth_data,
            ir: ir_data,
            color: color_data,
            color_input: color,
            calibration,
            secondary: depth.secondary,
            metadata: depth.metadata,
            collaborators,
            timing,
        })
    }

    /// Run the outer optimization loop; `callback` sees every iteration and
    /// cycle.
    pub fn optimize<F>(&self, mut callback: F) -> Result<CalibrationOutcome>
    where
        F: FnMut(&DiagnosticEvent),
    {
        let problem = CalibrationProblem {
            features: &self.depth.features,
            field: &self.color.idt,
            original: &self.calibration,
            depth_k: &self.depth.intrinsics,
            secondary: &self.secondary,
            metadata: &self.metadata,
            params: &self.params,
            projection: self.collaborators.projection.as_ref(),
            cost: self.collaborators.cost.as_ref(),
            converter: self.collaborators.converter.as_ref(),
        };
        let mut outcome = optimize(&problem, &mut callback)?;
        let mut timing = self.timing.clone();
        timing.extend(&outcome.timing);
        outcome.timing = timing;
        Ok(outcome)
    }

    /// Cost of the device calibration on the session vertices.
    pub fn initial_cost(&self) -> f64 {
        let projection = self.collaborators.projection.as_ref();
        let p = self.calibration.to_projection();
        let uv = projection.project(&self.depth.features.vertex, &self.calibration, &p);
        self.collaborators
            .cost
            .cost(&self.depth.features.weight, &self.color.idt, &uv)
    }

    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    pub fn features(&self) -> &EdgeFeatures {
        &self.depth.features
    }

    /// Depth pixels carrying a retained edge, row-major.
    pub fn relevant_pixels(&self) -> &[bool] {
        &self.depth.relevant
    }

    pub fn depth_data(&self) -> &DepthFrameData {
        &self.depth
    }

    pub fn ir_data(&self) -> &IrFrameData {
        &self.ir
    }

    pub fn color_data(&self) -> &ColorFrameData {
        &self.color
    }

    pub fn color_input(&self) -> &ColorInput {
        &self.color_input
    }

    pub fn calibration(&self) -> &CalibrationModel {
        &self.calibration
    }

    pub fn secondary(&self) -> &SecondaryModel {
        &self.secondary
    }

    pub fn metadata(&self) -> &CalibrationMetadata {
        &self.metadata
    }

    pub fn timing(&self) -> &TimingBreakdown {
        &self.timing
    }

    /// Write the diagnostic dump into `dir`. Failures are logged, never
    /// returned.
    pub fn write_data_to(&self, dir: &Path) {
        crate::dump::write_data_to(self, dir);
    }

    /// Save edge maps, the diffused field and the relevant-pixel mask as
    /// PNGs into `dir`. Failures are logged.
    pub fn save_debug_images(&self, dir: &Path) {
        crate::dump::save_debug_images(self, dir);
    }
}
