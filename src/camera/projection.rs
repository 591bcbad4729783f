//! Projection-matrix algebra behind a narrow trait.
//!
//! The optimizer only ever talks to [`ProjectionModel`]: decompose a
//! 12-parameter matrix back into a calibration, project vertices into the
//! colour image, and report the per-vertex derivatives of the projected
//! pixel with respect to the 12 parameters.
use super::calibration::{CalibrationModel, Extrinsics};
use super::intrinsics::Intrinsics;
use super::pmatrix::ProjectionMatrix;
use nalgebra::{Matrix3, Vector3};

/// Per-vertex derivatives `(du/dP, dv/dP)`, each row-major like `P`.
pub type PixelCoefficients = ([f64; 12], [f64; 12]);

pub trait ProjectionModel {
    /// Recover intrinsics and extrinsics from `p`. Quantities `p` cannot
    /// carry (resolution, distortion) come from `reference`.
    fn decompose(&self, p: &ProjectionMatrix, reference: &CalibrationModel) -> CalibrationModel;

    /// Colour pixel of every vertex under `p`, distorted with `model`.
    fn project(
        &self,
        vertices: &[Vector3<f64>],
        model: &CalibrationModel,
        p: &ProjectionMatrix,
    ) -> Vec<[f64; 2]>;

    /// Derivatives of the projected pixel of `vertex` with respect to `p`.
    fn coefficients(
        &self,
        vertex: &Vector3<f64>,
        model: &CalibrationModel,
        p: &ProjectionMatrix,
    ) -> PixelCoefficients;
}

/// Pinhole camera `P = K·[R | t]` with Brown–Conrady distortion applied in
/// the normalized plane of the model intrinsics.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinholeProjection;

/// Closest proper rotation (Frobenius sense) to `m`.
pub fn nearest_rotation(m: &Matrix3<f64>) -> Matrix3<f64> {
    let svd = m.svd(true, true);
    let (Some(mut u), Some(v_t)) = (svd.u, svd.v_t) else {
        return *m;
    };
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        for i in 0..3 {
            u[(i, 2)] = -u[(i, 2)];
        }
        r = u * v_t;
    }
    r
}

impl PinholeProjection {
    #[inline]
    fn project_one(&self, v: &Vector3<f64>, k: &Intrinsics, p: &ProjectionMatrix) -> [f64; 2] {
        let h = p.transform(v);
        if h.z <= 0.0 {
            return [f64::NAN, f64::NAN];
        }
        let a = (h.x / h.z - k.ppx) / k.fx;
        let b = (h.y / h.z - k.ppy) / k.fy;
        let [xd, yd] = k.distort(a, b);
        [xd * k.fx + k.ppx, yd * k.fy + k.ppy]
    }
}

impl ProjectionModel for PinholeProjection {
    fn decompose(&self, p: &ProjectionMatrix, reference: &CalibrationModel) -> CalibrationModel {
        let m = p.to_matrix();
        let row = |r: usize| Vector3::new(m[(r, 0)], m[(r, 1)], m[(r, 2)]);
        let scale = row(2).norm();
        if !scale.is_finite() || scale <= 0.0 {
            return *reference;
        }
        let r2 = row(2) / scale;
        let m0 = row(0) / scale;
        let m1 = row(1) / scale;
        let ppx = m0.dot(&r2);
        let ppy = m1.dot(&r2);
        let v0 = m0 - r2 * ppx;
        let v1 = m1 - r2 * ppy;
        let (fx, fy) = (v0.norm(), v1.norm());
        if fx == 0.0 || fy == 0.0 {
            return *reference;
        }
        let raw = Matrix3::from_rows(&[
            (v0 / fx).transpose(),
            (v1 / fy).transpose(),
            r2.transpose(),
        ]);
        let rotation = nearest_rotation(&raw);

        let intrinsics = Intrinsics {
            fx,
            fy,
            ppx,
            ppy,
            ..reference.intrinsics
        };
        let p3 = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]) / scale;
        let translation = intrinsics
            .k_inverse()
            .map(|kinv| kinv * p3)
            .unwrap_or(reference.extrinsics.translation);

        CalibrationModel {
            intrinsics,
            extrinsics: Extrinsics {
                rotation,
                translation,
            },
        }
    }

    fn project(
        &self,
        vertices: &[Vector3<f64>],
        model: &CalibrationModel,
        p: &ProjectionMatrix,
    ) -> Vec<[f64; 2]> {
        vertices
            .iter()
            .map(|v| self.project_one(v, &model.intrinsics, p))
            .collect()
    }

    fn coefficients(
        &self,
        vertex: &Vector3<f64>,
        model: &CalibrationModel,
        p: &ProjectionMatrix,
    ) -> PixelCoefficients {
        let k = &model.intrinsics;
        let h = p.transform(vertex);
        let (x1, y1, z1) = (h.x, h.y, h.z);
        let a = (x1 / z1 - k.ppx) / k.fx;
        let b = (y1 / z1 - k.ppy) / k.fy;
        let [[dxd_da, dxd_db], [dyd_da, dyd_db]] = k.distortion_jacobian(a, b);

        // Chain through the undistorted pixel (x_in, y_in).
        let du_dxin = dxd_da;
        let du_dyin = k.fx / k.fy * dxd_db;
        let dv_dxin = k.fy / k.fx * dyd_da;
        let dv_dyin = dyd_db;

        let vh = [vertex.x, vertex.y, vertex.z, 1.0];
        let mut xc = [0.0; 12];
        let mut yc = [0.0; 12];
        for (j, &c) in vh.iter().enumerate() {
            let dxin_row0 = c / z1;
            let dyin_row1 = c / z1;
            let dxin_row2 = -x1 / (z1 * z1) * c;
            let dyin_row2 = -y1 / (z1 * z1) * c;

            xc[j] = du_dxin * dxin_row0;
            yc[j] = dv_dxin * dxin_row0;
            xc[4 + j] = du_dyin * dyin_row1;
            yc[4 + j] = dv_dyin * dyin_row1;
            xc[8 + j] = du_dxin * dxin_row2 + du_dyin * dyin_row2;
            yc[8 + j] = dv_dxin * dxin_row2 + dv_dyin * dyin_row2;
        }
        (xc, yc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(coeffs: [f64; 5]) -> CalibrationModel {
        CalibrationModel {
            intrinsics: Intrinsics {
                width: 640,
                height: 480,
                fx: 605.0,
                fy: 603.5,
                ppx: 321.0,
                ppy: 238.5,
                coeffs,
            },
            extrinsics: Extrinsics::from_euler(0.004, -0.01, 0.02, Vector3::new(15.0, -0.3, 0.8)),
        }
    }

    #[test]
    fn decompose_recovers_model() {
        let m = model([0.1, -0.2, 0.0, 0.0, 0.05]);
        let p = m.to_projection();
        let back = PinholeProjection.decompose(&p, &m);
        assert!((back.intrinsics.fx - m.intrinsics.fx).abs() < 1e-9);
        assert!((back.intrinsics.fy - m.intrinsics.fy).abs() < 1e-9);
        assert!((back.intrinsics.ppx - m.intrinsics.ppx).abs() < 1e-9);
        assert!((back.intrinsics.ppy - m.intrinsics.ppy).abs() < 1e-9);
        assert_eq!(back.intrinsics.coeffs, m.intrinsics.coeffs);
        assert!((back.extrinsics.rotation - m.extrinsics.rotation).norm() < 1e-9);
        assert!((back.extrinsics.translation - m.extrinsics.translation).norm() < 1e-9);
    }

    #[test]
    fn decompose_is_scale_invariant() {
        let m = model([0.0; 5]);
        let p = m.to_projection() * 2.5;
        let back = PinholeProjection.decompose(&p, &m);
        assert!((back.intrinsics.fx - m.intrinsics.fx).abs() < 1e-9);
        assert!((back.extrinsics.translation - m.extrinsics.translation).norm() < 1e-9);
    }

    #[test]
    fn rectilinear_projection_matches_pinhole() {
        let m = model([0.0; 5]);
        let v = Vector3::new(-80.0, 45.0, 950.0);
        let uv = PinholeProjection.project(&[v], &m, &m.to_projection())[0];
        let c = m.extrinsics.apply(&v);
        let expect = m.intrinsics.project_rectilinear(&c);
        assert!((uv[0] - expect[0]).abs() < 1e-9);
        assert!((uv[1] - expect[1]).abs() < 1e-9);
    }

    #[test]
    fn points_behind_camera_are_not_finite() {
        let m = model([0.0; 5]);
        let behind = [Vector3::new(0.0, 0.0, -500.0)];
        let uv = PinholeProjection.project(&behind, &m, &m.to_projection());
        assert!(!uv[0][0].is_finite());
    }

    #[test]
    fn coefficients_match_finite_differences() {
        let m = model([0.08, -0.03, 0.002, -0.001, 0.01]);
        let p = m.to_projection();
        let v = Vector3::new(210.0, -130.0, 1100.0);
        let (xc, yc) = PinholeProjection.coefficients(&v, &m, &p);
        for j in 0..12 {
            let h = 1e-6 * p.vals[j].abs().max(1.0);
            let mut plus = p;
            let mut minus = p;
            plus.vals[j] += h;
            minus.vals[j] -= h;
            let up = PinholeProjection.project(&[v], &m, &plus)[0];
            let um = PinholeProjection.project(&[v], &m, &minus)[0];
            let du = (up[0] - um[0]) / (2.0 * h);
            let dv = (up[1] - um[1]) / (2.0 * h);
            let tol_u = 1e-5 * du.abs().max(1.0);
            let tol_v = 1e-5 * dv.abs().max(1.0);
            assert!((xc[j] - du).abs() < tol_u, "u[{j}]: {} vs {du}", xc[j]);
            assert!((yc[j] - dv).abs() < tol_v, "v[{j}]: {} vs {dv}", yc[j]);
        }
    }
}
