//! Bilinear sampling of f64 fields at sub-pixel positions.

use super::ImageF64;

/// Bilinearly interpolate `img` at `(x, y)`.
///
/// Returns `None` (the "no data" value) for non-finite coordinates or
/// positions outside `[0, w-1] × [0, h-1]`.
#[inline]
pub fn bilinear(img: &ImageF64, x: f64, y: f64) -> Option<f64> {
    if !x.is_finite() || !y.is_finite() || img.w == 0 || img.h == 0 {
        return None;
    }
    let max_x = (img.w - 1) as f64;
    let max_y = (img.h - 1) as f64;
    if x < 0.0 || y < 0.0 || x > max_x || y > max_y {
        return None;
    }
    let xf = x.floor();
    let yf = y.floor();
    let x0 = xf as usize;
    let y0 = yf as usize;
    let x1 = (x0 + 1).min(img.w - 1);
    let y1 = (y0 + 1).min(img.h - 1);
    let tx = x - xf;
    let ty = y - yf;

    let v00 = img.get(x0, y0);
    let v10 = img.get(x1, y0);
    let v01 = img.get(x0, y1);
    let v11 = img.get(x1, y1);

    let top = v00 * (1.0 - tx) + v10 * tx;
    let bottom = v01 * (1.0 - tx) + v11 * tx;
    Some(top * (1.0 - ty) + bottom * ty)
}
