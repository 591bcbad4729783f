use super::TimingBreakdown;
use crate::camera::{CalibrationModel, Intrinsics};
use crate::secondary::SecondaryModel;
use serde::Serialize;

/// Result of a calibration run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationOutcome {
    /// Refined colour calibration; focal lengths equal the device values.
    pub calibration: CalibrationModel,
    /// Secondary model after clipping to the scaling envelope.
    pub secondary: SecondaryModel,
    /// Cost of the accepted parameters.
    pub cost: f64,
    /// Cost of the device calibration on the initial vertices.
    pub initial_cost: f64,
    /// Inner-loop iterations of the first cycle.
    pub iterations: usize,
    /// Cycles run, including the first and any rejected one.
    pub cycles: usize,
    /// Depth intrinsics implied by the accepted run.
    pub depth_intrinsics: Intrinsics,
    /// Edge weight per depth section.
    pub section_weights: Vec<f64>,
    pub timing: TimingBreakdown,
}

impl CalibrationOutcome {
    /// One-line human summary.
    pub fn summary(&self) -> String {
        let t = &self.calibration.extrinsics.translation;
        format!(
            "cost {:.3} -> {:.3} | iterations={} cycles={} | ppx={:.3} ppy={:.3} | t=[{:.3}, {:.3}, {:.3}] | h/v scale={:.5}/{:.5} | {:.1} ms",
            self.initial_cost,
            self.cost,
            self.iterations,
            self.cycles,
            self.calibration.intrinsics.ppx,
            self.calibration.intrinsics.ppy,
            t.x,
            t.y,
            t.z,
            self.secondary.h_scale,
            self.secondary.v_scale,
            self.timing.total_ms
        )
    }
}
