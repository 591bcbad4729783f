//! Row-major 3×4 projection matrix treated as a 12-parameter vector.
use nalgebra::{Matrix3x4, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// `P = K·[R | t]` flattened row-major; also used for gradients and
/// per-parameter scale tables of the same shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionMatrix {
    pub vals: [f64; 12],
}

impl ProjectionMatrix {
    pub const fn new(vals: [f64; 12]) -> Self {
        Self { vals }
    }

    pub fn zeros() -> Self {
        Self { vals: [0.0; 12] }
    }

    pub fn to_matrix(&self) -> Matrix3x4<f64> {
        Matrix3x4::from_row_slice(&self.vals)
    }

    pub fn from_matrix(m: &Matrix3x4<f64>) -> Self {
        let mut vals = [0.0; 12];
        for r in 0..3 {
            for c in 0..4 {
                vals[r * 4 + c] = m[(r, c)];
            }
        }
        Self { vals }
    }

    /// Homogeneous image point `P · [v; 1]`.
    #[inline]
    pub fn transform(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let p = &self.vals;
        Vector3::new(
            p[0] * v.x + p[1] * v.y + p[2] * v.z + p[3],
            p[4] * v.x + p[5] * v.y + p[6] * v.z + p[7],
            p[8] * v.x + p[9] * v.y + p[10] * v.z + p[11],
        )
    }

    pub fn sum(&self) -> f64 {
        self.vals.iter().sum()
    }

    /// Euclidean norm of the 12 entries.
    pub fn frobenius_norm(&self) -> f64 {
        self.vals.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Spectral norm (largest singular value) of the 3×4 matrix.
    pub fn matrix_norm(&self) -> f64 {
        self.to_matrix()
            .singular_values()
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }

    /// Element-wise division by a per-parameter scale table.
    pub fn normalize(&self, scales: &ProjectionMatrix) -> Self {
        *self / *scales
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            vals: self.vals.map(f),
        }
    }
}

impl Add for ProjectionMatrix {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            vals: std::array::from_fn(|i| self.vals[i] + rhs.vals[i]),
        }
    }
}

impl Sub for ProjectionMatrix {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            vals: std::array::from_fn(|i| self.vals[i] - rhs.vals[i]),
        }
    }
}

/// Element-wise product.
impl Mul for ProjectionMatrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            vals: std::array::from_fn(|i| self.vals[i] * rhs.vals[i]),
        }
    }
}

impl Mul<f64> for ProjectionMatrix {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        self.map(|v| v * rhs)
    }
}

/// Element-wise quotient.
impl Div for ProjectionMatrix {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self {
            vals: std::array::from_fn(|i| self.vals[i] / rhs.vals[i]),
        }
    }
}

impl Div<f64> for ProjectionMatrix {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        self.map(|v| v / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectral_norm_of_scaled_identity() {
        let p = ProjectionMatrix::new([
            3.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        ]);
        assert!((p.matrix_norm() - 3.0).abs() < 1e-12);
        assert!((p.frobenius_norm() - 14f64.sqrt()).abs() < 1e-12);
        assert!((p.sum() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn elementwise_ops() {
        let a = ProjectionMatrix::new([2.0; 12]);
        let b = ProjectionMatrix::new([4.0; 12]);
        assert_eq!((a + b).vals, [6.0; 12]);
        assert_eq!((b - a).vals, [2.0; 12]);
        assert_eq!((a * b).vals, [8.0; 12]);
        assert_eq!(b.normalize(&a).vals, [2.0; 12]);
        assert_eq!((a * 0.5).vals, [1.0; 12]);
    }

    #[test]
    fn transform_uses_row_major_layout() {
        let mut vals = [0.0; 12];
        vals[0] = 1.0;
        vals[3] = 10.0;
        vals[5] = 1.0;
        vals[10] = 1.0;
        vals[11] = 2.0;
        let p = ProjectionMatrix::new(vals);
        let h = p.transform(&Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(h, Vector3::new(11.0, 2.0, 5.0));
        let m = p.to_matrix();
        assert_eq!(ProjectionMatrix::from_matrix(&m), p);
    }
}
