//! Pinhole intrinsics with Brown–Conrady distortion.
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics of a sensor stream.
///
/// `coeffs` follows the `[k1, k2, p1, p2, k3]` Brown–Conrady layout. The
/// depth stream is treated as rectilinear (its coefficients are carried but
/// never applied); the colour stream applies them on forward projection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub width: usize,
    pub height: usize,
    pub fx: f64,
    pub fy: f64,
    pub ppx: f64,
    pub ppy: f64,
    #[serde(default)]
    pub coeffs: [f64; 5],
}

impl Intrinsics {
    pub fn k_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.ppx, 0.0, self.fy, self.ppy, 0.0, 0.0, 1.0,
        )
    }

    pub fn k_inverse(&self) -> Option<Matrix3<f64>> {
        self.k_matrix().try_inverse()
    }

    /// Pixel `(x, y)` (0-based) at `depth` to a camera-space point.
    pub fn deproject(&self, x: f64, y: f64, depth: f64) -> Vector3<f64> {
        Vector3::new(
            (x - self.ppx) / self.fx * depth,
            (y - self.ppy) / self.fy * depth,
            depth,
        )
    }

    /// Rectilinear projection of a camera-space point.
    pub fn project_rectilinear(&self, p: &Vector3<f64>) -> [f64; 2] {
        [
            p.x / p.z * self.fx + self.ppx,
            p.y / p.z * self.fy + self.ppy,
        ]
    }

    /// Apply lens distortion to normalized image coordinates.
    #[inline]
    pub fn distort(&self, a: f64, b: f64) -> [f64; 2] {
        let [k1, k2, p1, p2, k3] = self.coeffs;
        let r2 = a * a + b * b;
        let rc = 1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2;
        [
            a * rc + 2.0 * p1 * a * b + p2 * (r2 + 2.0 * a * a),
            b * rc + 2.0 * p2 * a * b + p1 * (r2 + 2.0 * b * b),
        ]
    }

    /// Jacobian of [`Intrinsics::distort`] with respect to `(a, b)`,
    /// row-major `[[dxd/da, dxd/db], [dyd/da, dyd/db]]`.
    #[inline]
    pub fn distortion_jacobian(&self, a: f64, b: f64) -> [[f64; 2]; 2] {
        let [k1, k2, p1, p2, k3] = self.coeffs;
        let r2 = a * a + b * b;
        let rc = 1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2;
        let drc = k1 + 2.0 * k2 * r2 + 3.0 * k3 * r2 * r2;
        let cross = 2.0 * a * b * drc;
        [
            [
                rc + 2.0 * a * a * drc + 2.0 * p1 * b + 6.0 * p2 * a,
                cross + 2.0 * p1 * a + 2.0 * p2 * b,
            ],
            [
                cross + 2.0 * p2 * b + 2.0 * p1 * a,
                rc + 2.0 * b * b * drc + 2.0 * p2 * a + 6.0 * p1 * b,
            ],
        ]
    }

    /// Same intrinsics with replaced focal lengths.
    pub fn with_focal(&self, fx: f64, fy: f64) -> Self {
        Self { fx, fy, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_k() -> Intrinsics {
        Intrinsics {
            width: 640,
            height: 480,
            fx: 380.0,
            fy: 381.5,
            ppx: 318.2,
            ppy: 241.7,
            coeffs: [0.0; 5],
        }
    }

    #[test]
    fn deproject_inverts_projection() {
        let k = depth_k();
        let points = [
            Vector3::new(120.0, -40.0, 900.0),
            Vector3::new(-310.5, 222.25, 1450.0),
            Vector3::new(0.0, 0.0, 500.0),
        ];
        for p in points {
            let [u, v] = k.project_rectilinear(&p);
            let back = k.deproject(u, v, p.z);
            assert!((back - p).norm() < 1e-9, "{back:?} vs {p:?}");
        }
    }

    #[test]
    fn deproject_matches_inverse_k() {
        let k = depth_k();
        let kinv = k.k_inverse().unwrap();
        let via_matrix = kinv * Vector3::new(100.5, 50.25, 1.0) * 700.0;
        let direct = k.deproject(100.5, 50.25, 700.0);
        assert!((via_matrix - direct).norm() < 1e-9);
    }

    #[test]
    fn distortion_jacobian_matches_finite_differences() {
        let k = Intrinsics {
            coeffs: [0.12, -0.05, 0.001, -0.002, 0.01],
            ..depth_k()
        };
        let (a, b) = (0.31, -0.22);
        let jac = k.distortion_jacobian(a, b);
        let h = 1e-6;
        let da_p = k.distort(a + h, b);
        let da_m = k.distort(a - h, b);
        let db_p = k.distort(a, b + h);
        let db_m = k.distort(a, b - h);
        for row in 0..2 {
            let num_a = (da_p[row] - da_m[row]) / (2.0 * h);
            let num_b = (db_p[row] - db_m[row]) / (2.0 * h);
            assert!((jac[row][0] - num_a).abs() < 1e-6);
            assert!((jac[row][1] - num_b).abs() < 1e-6);
        }
    }
}
