//! Alignment cost between projected depth edges and the colour edge field.
use crate::edges::DiffusedField;
use crate::image::bilinear;

/// Scalar misalignment of projected vertices; lower is better.
pub trait CostModel {
    fn cost(&self, weights: &[f64], field: &DiffusedField, uv: &[[f64; 2]]) -> f64;
}

/// `-Σ wᵢ·F(uvᵢ) / n` over the `n` vertices whose bilinear sample of the
/// diffused field `F` exists. Zero when nothing can be sampled.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeAlignmentCost;

impl CostModel for EdgeAlignmentCost {
    fn cost(&self, weights: &[f64], field: &DiffusedField, uv: &[[f64; 2]]) -> f64 {
        let mut sum = 0.0;
        let mut n = 0usize;
        for (&w, &[u, v]) in weights.iter().zip(uv) {
            if let Some(value) = bilinear(&field.field, u, v) {
                sum += w * value;
                n += 1;
            }
        }
        if n == 0 {
            return 0.0;
        }
        -sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF64;

    fn field() -> DiffusedField {
        let mut edges = ImageF64::new(8, 8);
        edges.set(4, 4, 90.0);
        DiffusedField::build(&edges, 0.5, 1.0 / 3.0)
    }

    #[test]
    fn closer_to_edge_costs_less() {
        let f = field();
        let on = EdgeAlignmentCost.cost(&[1.0], &f, &[[4.0, 4.0]]);
        let near = EdgeAlignmentCost.cost(&[1.0], &f, &[[5.0, 4.0]]);
        let far = EdgeAlignmentCost.cost(&[1.0], &f, &[[1.0, 1.0]]);
        assert!(on < near && near < far);
        assert!((on + 90.0).abs() < 1e-9);
    }

    #[test]
    fn unsampled_vertices_are_ignored() {
        let f = field();
        let c = EdgeAlignmentCost.cost(&[2.0, 5.0], &f, &[[4.0, 4.0], [-3.0, 100.0]]);
        assert!((c + 180.0).abs() < 1e-9);
        assert_eq!(EdgeAlignmentCost.cost(&[1.0], &f, &[[f64::NAN, 0.0]]), 0.0);
    }
}
