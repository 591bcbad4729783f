//! IR edge candidates with sub-pixel refinement along the gradient.
//!
//! For every pixel of the IR threshold mask:
//! - quantize the gradient direction into one of 8 bins,
//! - read the edge magnitude at 4 taps `{-2, -1, 0, +1}` steps along the bin,
//! - flag a local maximum when tap 0 dominates both neighbours,
//! - fit a parabola through taps `-1, 0, +1` and move the location by its
//!   vertex offset along the bin step.
use super::direction::{quantize_direction, DIRECTION_STEPS};
use super::EdgeFeatures;
use crate::edges::Grad;
use crate::image::{ImageF64, ImageView};

/// Tap offsets along the direction step, in order.
pub const TAP_OFFSETS: [i32; 4] = [-2, -1, 0, 1];

/// Pixel coordinates of the four profile taps of `(x, y)` for direction
/// `bin`, or `None` when any tap leaves the `w × h` frame.
pub(crate) fn profile_taps(
    x: usize,
    y: usize,
    bin: u8,
    w: usize,
    h: usize,
) -> Option<[(usize, usize); 4]> {
    let (dx, dy) = DIRECTION_STEPS[bin as usize];
    let mut taps = [(0usize, 0usize); 4];
    for (tap, &k) in taps.iter_mut().zip(TAP_OFFSETS.iter()) {
        let tx = x as i64 + (dx * k) as i64;
        let ty = y as i64 + (dy * k) as i64;
        if tx < 0 || ty < 0 || tx >= w as i64 || ty >= h as i64 {
            return None;
        }
        *tap = (tx as usize, ty as usize);
    }
    Some(taps)
}

/// Vertex offset of the parabola through `(-1, s1)`, `(0, s2)`, `(1, s3)`;
/// zero for a flat (degenerate) profile.
#[inline]
pub fn parabolic_offset(s1: f64, s2: f64, s3: f64) -> f64 {
    let denom = s3 + s1 - 2.0 * s2;
    if denom == 0.0 {
        0.0
    } else {
        -0.5 * (s3 - s1) / denom
    }
}

/// Pixels whose edge magnitude exceeds `threshold`, row-major.
pub fn threshold_mask(mag: &ImageF64, threshold: f64) -> Vec<bool> {
    mag.data.iter().map(|&m| m > threshold).collect()
}

/// Refine every pixel set in the IR threshold mask `valid`.
///
/// `sections` is the per-pixel section map of the frame. The returned
/// record carries `pixel`, `subpixel`, `direction`, `suppressed` and
/// `section`; candidates whose taps fall outside the frame are dropped.
pub fn extract_candidates(ir: &Grad, valid: &[bool], sections: &[usize]) -> EdgeFeatures {
    let (w, h) = (ir.mag.width(), ir.mag.height());
    let mut out = EdgeFeatures::default();
    for y in 0..h {
        for x in 0..w {
            if valid.get(y * w + x) != Some(&true) {
                continue;
            }
            let bin = quantize_direction(ir.gx.get(x, y), ir.gy.get(x, y));
            let Some(taps) = profile_taps(x, y, bin, w, h) else {
                continue;
            };
            let s = taps.map(|(tx, ty)| ir.mag.get(tx, ty));
            let is_max = s[2] >= s[1] && s[2] >= s[3];
            let step = parabolic_offset(s[1], s[2], s[3]);
            let (dx, dy) = DIRECTION_STEPS[bin as usize];

            out.pixel.push([x, y]);
            out.subpixel
                .push([x as f64 + step * dx as f64, y as f64 + step * dy as f64]);
            out.direction.push(bin);
            out.suppressed.push(is_max);
            out.section.push(sections.get(y * w + x).copied().unwrap_or(0));
        }
    }
    out
}
