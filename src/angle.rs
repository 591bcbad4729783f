//! Angle utilities used by the edge direction quantizer.

/// Bin centres (degrees) of the 8-way direction quantizer, in search order.
pub const DIRECTION_BINS_DEG: [f64; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];

/// Maps `atan2(y, x)` into `[0, 360)` degrees.
#[inline]
pub fn atan2_deg_360(y: f64, x: f64) -> f64 {
    let deg = y.atan2(x).to_degrees();
    let wrapped = if deg < 0.0 { deg + 360.0 } else { deg };
    // -0.0 and tiny negatives can round up to exactly 360.
    wrapped % 360.0
}

/// Index of the bin centre closest to `angle_deg` by plain absolute
/// difference (no wrap-around), the first bin winning ties.
#[inline]
pub fn nearest_bin(angle_deg: f64, bins: &[f64]) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, &centre) in bins.iter().enumerate() {
        let dist = (angle_deg - centre).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
