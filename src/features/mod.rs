//! Edge feature extraction on the depth/IR pair.
//!
//! The pipeline is strictly ordered:
//! - [`threshold_mask`] and [`extract_candidates`]: IR magnitude threshold,
//!   direction quantization,
//!   4-tap profile, local-maximum flag and parabolic sub-pixel offset.
//! - [`validate_depth`]: depth gradient along the direction, suppression and
//!   closest-depth tests; folds the direction to 4 ways.
//! - [`back_project`] and [`retain_inside`]: camera-space vertices and the
//!   colour in-bounds filter.
//!
//! Every stage narrows one [`EdgeFeatures`] record through
//! [`EdgeFeatures::retain_mask`], so all per-edge attributes stay
//! index-aligned.

pub mod direction;
pub mod section;
pub mod subpixel;
pub mod validate;
pub mod vertices;

pub use direction::{quantize_direction, DIRECTION_STEPS};
pub use section::{section_map, sum_per_section};
pub use subpixel::{extract_candidates, threshold_mask};
pub use validate::validate_depth;
pub use vertices::{
    assign_weights, back_project, deproject_subpixels, relevant_pixels, retain_inside, WeightPolicy,
};

use nalgebra::Vector3;
use serde::Serialize;

/// Struct-of-arrays record of edge pixels.
///
/// Attributes are filled stage by stage; an attribute that has not been
/// produced yet is empty. Populated attributes always share one length.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EdgeFeatures {
    /// Integer pixel `(x, y)` of the IR edge.
    pub pixel: Vec<[usize; 2]>,
    /// Sub-pixel location `(x, y)` after the parabolic refinement.
    pub subpixel: Vec<[f64; 2]>,
    /// 8-way direction bin (index into [`DIRECTION_STEPS`]).
    pub direction: Vec<u8>,
    /// Direction folded to 4 orientations (`direction % 4`).
    pub folded_direction: Vec<u8>,
    /// Local maximum of the IR edge profile along the direction.
    pub suppressed: Vec<bool>,
    /// Depth gradient projected on the unit direction, absolute value.
    pub grad_in_direction: Vec<f64>,
    /// Smallest depth sample over the four profile taps.
    pub closest_depth: Vec<f64>,
    /// Section id of the integer pixel.
    pub section: Vec<usize>,
    /// Per-vertex weight from the configured [`WeightPolicy`].
    pub weight: Vec<f64>,
    /// Camera-space point in the depth frame.
    pub vertex: Vec<Vector3<f64>>,
    /// Projection into the colour frame with the model used for filtering.
    pub uv: Vec<[f64; 2]>,
}

fn compact<T>(values: &mut Vec<T>, mask: &[bool]) {
    if values.is_empty() {
        return;
    }
    assert_eq!(
        values.len(),
        mask.len(),
        "edge attribute out of step with the feature record"
    );
    let mut keep = mask.iter();
    values.retain(|_| keep.next().copied().unwrap_or(false));
}

impl EdgeFeatures {
    /// Number of edges in the record.
    pub fn len(&self) -> usize {
        self.pixel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixel.is_empty()
    }

    /// Keep the edges whose mask entry is `true`, preserving order, across
    /// every populated attribute.
    ///
    /// Panics when the mask or a populated attribute disagrees with the
    /// record length.
    pub fn retain_mask(&mut self, mask: &[bool]) {
        assert_eq!(mask.len(), self.len(), "mask length differs from record");
        compact(&mut self.pixel, mask);
        compact(&mut self.subpixel, mask);
        compact(&mut self.direction, mask);
        compact(&mut self.folded_direction, mask);
        compact(&mut self.suppressed, mask);
        compact(&mut self.grad_in_direction, mask);
        compact(&mut self.closest_depth, mask);
        compact(&mut self.section, mask);
        compact(&mut self.weight, mask);
        compact(&mut self.vertex, mask);
        compact(&mut self.uv, mask);
    }
}
