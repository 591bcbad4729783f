//! 8-way gradient direction quantization.
use crate::angle::{atan2_deg_360, nearest_bin, DIRECTION_BINS_DEG};

/// Unit pixel step `(dx, dy)` per direction bin, bin `k` pointing at
/// `45°·k` measured from +x towards +y.
pub const DIRECTION_STEPS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Direction bin of the gradient `(gx, gy)`.
///
/// The angle `atan2(gy, gx)` in `[0, 360)` goes to the nearest of
/// `{0, 45, …, 315}` by plain distance; on ties the lower bin wins.
#[inline]
pub fn quantize_direction(gx: f64, gy: f64) -> u8 {
    nearest_bin(atan2_deg_360(gy, gx), &DIRECTION_BINS_DEG) as u8
}

/// Folds opposite bins together (`0..8 → 0..4`).
#[inline]
pub fn fold_direction(bin: u8) -> u8 {
    bin % 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_and_diagonal_gradients() {
        assert_eq!(quantize_direction(1.0, 0.0), 0);
        assert_eq!(quantize_direction(1.0, 1.0), 1);
        assert_eq!(quantize_direction(0.0, 1.0), 2);
        assert_eq!(quantize_direction(-1.0, 1.0), 3);
        assert_eq!(quantize_direction(-1.0, 0.0), 4);
        assert_eq!(quantize_direction(-1.0, -1.0), 5);
        assert_eq!(quantize_direction(0.0, -1.0), 6);
        assert_eq!(quantize_direction(1.0, -1.0), 7);
    }

    #[test]
    fn quantization_is_total_and_wraps_at_360() {
        let mut deg = 0.0f64;
        while deg < 360.0 {
            let r = deg.to_radians();
            let bin = quantize_direction(r.cos(), r.sin());
            assert!(bin < 8);
            deg += 0.25;
        }
        // 0° and 360° describe the same gradient.
        let full = 360.0f64.to_radians();
        assert_eq!(quantize_direction(full.cos(), full.sin()), 0);
        assert_eq!(quantize_direction(1.0, 0.0), 0);
    }

    #[test]
    fn steps_match_bin_angles() {
        for (k, &(dx, dy)) in DIRECTION_STEPS.iter().enumerate() {
            assert_eq!(quantize_direction(dx as f64, dy as f64) as usize, k);
        }
    }

    #[test]
    fn folding_merges_opposites() {
        for k in 0..4u8 {
            assert_eq!(fold_direction(k), fold_direction(k + 4));
        }
    }
}
