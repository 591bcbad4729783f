//! Back-projection of validated edges and the colour in-bounds filter.
use super::EdgeFeatures;
use crate::camera::{CalibrationModel, Intrinsics, ProjectionMatrix, ProjectionModel};
use crate::error::{CalibError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Per-vertex weight assignment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Same weight for every vertex.
    Constant { value: f64 },
    /// `min(max(g - grad_z_threshold, 0), grad_z_max - grad_z_threshold)` of
    /// the depth gradient along the edge direction.
    GradientClamped,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        WeightPolicy::Constant { value: 1000.0 }
    }
}

impl WeightPolicy {
    pub fn weight(&self, grad_in_direction: f64, grad_z_threshold: f64, grad_z_max: f64) -> f64 {
        match *self {
            WeightPolicy::Constant { value } => value,
            WeightPolicy::GradientClamped => (grad_in_direction - grad_z_threshold)
                .max(0.0)
                .min(grad_z_max - grad_z_threshold),
        }
    }
}

/// Camera-space points for sub-pixel depth locations.
///
/// `depth` is in raw sensor units; dividing by `z_max_sub_mm` yields
/// millimetres.
pub fn deproject_subpixels(
    subpixels: &[[f64; 2]],
    depth: &[f64],
    depth_k: &Intrinsics,
    z_max_sub_mm: f64,
) -> Vec<Vector3<f64>> {
    subpixels
        .iter()
        .zip(depth)
        .map(|(&[x, y], &z)| depth_k.deproject(x, y, z / z_max_sub_mm))
        .collect()
}

/// Fill `vertex` from `subpixel` and `closest_depth`.
pub fn back_project(
    mut features: EdgeFeatures,
    depth_k: &Intrinsics,
    z_max_sub_mm: f64,
) -> EdgeFeatures {
    features.vertex = deproject_subpixels(
        &features.subpixel,
        &features.closest_depth,
        depth_k,
        z_max_sub_mm,
    );
    features
}

/// Fill `weight` according to `policy`.
pub fn assign_weights(
    mut features: EdgeFeatures,
    policy: WeightPolicy,
    grad_z_threshold: f64,
    grad_z_max: f64,
) -> EdgeFeatures {
    features.weight = features
        .grad_in_direction
        .iter()
        .map(|&g| policy.weight(g, grad_z_threshold, grad_z_max))
        .collect();
    features
}

/// Project every vertex with `p` and drop edges that land outside the
/// `color_w × color_h` image (`[0, w-1] × [0, h-1]`). Fills `uv`.
///
/// A projection model that does not return one pixel per vertex is
/// [`CalibError::MalformedInput`].
pub fn retain_inside<P: ProjectionModel + ?Sized>(
    mut features: EdgeFeatures,
    projection: &P,
    model: &CalibrationModel,
    p: &ProjectionMatrix,
    color_w: usize,
    color_h: usize,
) -> Result<EdgeFeatures> {
    let uv = projection.project(&features.vertex, model, p);
    if uv.len() != features.len() {
        return Err(CalibError::malformed(format!(
            "projection returned {} pixels for {} edges",
            uv.len(),
            features.len()
        )));
    }
    let (max_u, max_v) = (color_w as f64 - 1.0, color_h as f64 - 1.0);
    let mask: Vec<bool> = uv
        .iter()
        .map(|&[u, v]| u >= 0.0 && u <= max_u && v >= 0.0 && v <= max_v)
        .collect();
    features.uv = uv;
    features.retain_mask(&mask);
    Ok(features)
}

/// Mask of the depth pixels (rounded sub-pixel locations) that carry a
/// retained edge.
pub fn relevant_pixels(features: &EdgeFeatures, w: usize, h: usize) -> Vec<bool> {
    let mut mask = vec![false; w * h];
    for &[x, y] in &features.subpixel {
        let (xr, yr) = (x.round(), y.round());
        if xr < 0.0 || yr < 0.0 {
            continue;
        }
        let (xi, yi) = (xr as usize, yr as usize);
        if xi < w && yi < h {
            mask[yi * w + xi] = true;
        }
    }
    mask
}
