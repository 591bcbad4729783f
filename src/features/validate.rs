//! Depth-domain validation of IR edge candidates.
use super::direction::{fold_direction, DIRECTION_STEPS};
use super::subpixel::profile_taps;
use super::EdgeFeatures;
use crate::edges::Grad;
use crate::image::{ImageF64, ImageView};

/// Keep candidates that are also depth edges.
///
/// A candidate survives when
/// - the depth gradient, averaged over taps `-1` and `0` and projected on
///   the unit direction, exceeds `grad_z_threshold` in absolute value,
/// - it is a local maximum of the IR profile,
/// - the smallest depth over its four taps is positive.
///
/// Fills `grad_in_direction`, `closest_depth` and `folded_direction` before
/// filtering.
pub fn validate_depth(
    mut candidates: EdgeFeatures,
    depth: &ImageF64,
    depth_grad: &Grad,
    grad_z_threshold: f64,
) -> EdgeFeatures {
    let (w, h) = (depth.width(), depth.height());
    let n = candidates.len();
    let mut grad_in_direction = Vec::with_capacity(n);
    let mut closest_depth = Vec::with_capacity(n);
    let mut mask = Vec::with_capacity(n);

    for i in 0..n {
        let [x, y] = candidates.pixel[i];
        let bin = candidates.direction[i];
        let Some(taps) = profile_taps(x, y, bin, w, h) else {
            grad_in_direction.push(0.0);
            closest_depth.push(0.0);
            mask.push(false);
            continue;
        };
        let (dx, dy) = DIRECTION_STEPS[bin as usize];
        let norm = ((dx * dx + dy * dy) as f64).sqrt();
        let [(x0, y0), (x1, y1)] = [taps[1], taps[2]];
        let mean_gx = 0.5 * (depth_grad.gx.get(x0, y0) + depth_grad.gx.get(x1, y1));
        let mean_gy = 0.5 * (depth_grad.gy.get(x0, y0) + depth_grad.gy.get(x1, y1));
        let along = ((mean_gx * dx as f64 + mean_gy * dy as f64) / norm).abs();
        let closest = taps
            .iter()
            .map(|&(tx, ty)| depth.get(tx, ty))
            .fold(f64::INFINITY, f64::min);

        grad_in_direction.push(along);
        closest_depth.push(closest);
        mask.push(along > grad_z_threshold && candidates.suppressed[i] && closest > 0.0);
    }

    candidates.folded_direction = candidates
        .direction
        .iter()
        .map(|&d| fold_direction(d))
        .collect();
    candidates.grad_in_direction = grad_in_direction;
    candidates.closest_depth = closest_depth;
    candidates.retain_mask(&mask);
    candidates
}
