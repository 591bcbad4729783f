//! Secondary (depth-remapping) calibration model and its clipping envelope.
//!
//! The model is refined between projection-matrix runs of the outer loop;
//! the conversion from refined depth intrinsics to a candidate model is a
//! collaborator, see [`SecondaryModelConverter`].

pub mod converter;

pub use converter::{Conversion, ConversionInput, ScalingConverter, SecondaryModelConverter};

use serde::{Deserialize, Serialize};

/// Depth-sensor remapping parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecondaryModel {
    pub h_scale: f64,
    pub v_scale: f64,
    pub h_offset: f64,
    pub v_offset: f64,
    /// Round-trip-distance offset (mm).
    pub rtd_offset: f64,
}

impl Default for SecondaryModel {
    fn default() -> Self {
        Self {
            h_scale: 1.0,
            v_scale: 1.0,
            h_offset: 0.0,
            v_offset: 0.0,
            rtd_offset: 0.0,
        }
    }
}

impl SecondaryModel {
    /// As `[h_scale, v_scale, h_offset, v_offset, rtd_offset]`.
    pub fn to_array(&self) -> [f64; 5] {
        [
            self.h_scale,
            self.v_scale,
            self.h_offset,
            self.v_offset,
            self.rtd_offset,
        ]
    }

    pub fn from_array(v: [f64; 5]) -> Self {
        Self {
            h_scale: v[0],
            v_scale: v[1],
            h_offset: v[2],
            v_offset: v[3],
            rtd_offset: v[4],
        }
    }

    /// Constrain the scales of `self` to `|scale / original - 1| <= max_step`.
    ///
    /// Offsets pass through. Returns the clipped model and whether any scale
    /// moved.
    pub fn clip_scaling(&self, original: &SecondaryModel, max_step: f64) -> (Self, bool) {
        let clamp = |s: f64, o: f64| {
            let lo = o * (1.0 - max_step);
            let hi = o * (1.0 + max_step);
            s.clamp(lo.min(hi), lo.max(hi))
        };
        let clipped = Self {
            h_scale: clamp(self.h_scale, original.h_scale),
            v_scale: clamp(self.v_scale, original.v_scale),
            ..*self
        };
        let moved = clipped.h_scale != self.h_scale || clipped.v_scale != self.v_scale;
        (clipped, moved)
    }
}

/// Opaque device calibration blobs that accompany the secondary model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMetadata {
    pub info: Vec<u8>,
    pub registers: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_scales_in_envelope() {
        let original = SecondaryModel {
            h_scale: 1.0,
            v_scale: 0.98,
            ..Default::default()
        };
        let candidate = SecondaryModel {
            h_scale: 1.05,
            v_scale: 0.97,
            h_offset: 3.0,
            ..original
        };
        let (clipped, moved) = candidate.clip_scaling(&original, 0.02);
        assert!(moved);
        assert!((clipped.h_scale - 1.02).abs() < 1e-12);
        assert!((clipped.v_scale - 0.97).abs() < 1e-12);
        assert_eq!(clipped.h_offset, 3.0);

        let (same, moved) = original.clip_scaling(&original, 0.02);
        assert!(!moved);
        assert_eq!(same, original);
    }
}
