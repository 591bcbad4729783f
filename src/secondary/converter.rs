//! Conversion from refined depth intrinsics to a candidate secondary model.
use super::{CalibrationMetadata, SecondaryModel};
use crate::camera::Intrinsics;
use crate::features::{deproject_subpixels, EdgeFeatures};
use nalgebra::Vector3;

/// Everything a converter may look at.
pub struct ConversionInput<'a> {
    /// Device-asserted model.
    pub original: &'a SecondaryModel,
    pub metadata: &'a CalibrationMetadata,
    pub original_depth_k: &'a Intrinsics,
    /// Depth intrinsics implied by the last projection-matrix run.
    pub refined_depth_k: &'a Intrinsics,
    pub features: &'a EdgeFeatures,
    pub z_max_sub_mm: f64,
}

/// Candidate model and the vertices recomputed under it, index-aligned with
/// `ConversionInput::features`.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub model: SecondaryModel,
    pub vertices: Vec<Vector3<f64>>,
}

pub trait SecondaryModelConverter {
    fn convert(&self, input: &ConversionInput<'_>) -> Conversion;
}

/// Folds the focal change of the refined depth intrinsics into the
/// horizontal/vertical scales and back-projects the edges through the
/// refined intrinsics.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalingConverter;

impl SecondaryModelConverter for ScalingConverter {
    fn convert(&self, input: &ConversionInput<'_>) -> Conversion {
        let (orig, refined) = (input.original_depth_k, input.refined_depth_k);
        let ratio = |new: f64, old: f64| if old != 0.0 { new / old } else { 1.0 };
        let model = SecondaryModel {
            h_scale: input.original.h_scale * ratio(refined.fx, orig.fx),
            v_scale: input.original.v_scale * ratio(refined.fy, orig.fy),
            ..*input.original
        };
        let vertices = deproject_subpixels(
            &input.features.subpixel,
            &input.features.closest_depth,
            refined,
            input.z_max_sub_mm,
        );
        Conversion { model, vertices }
    }
}
