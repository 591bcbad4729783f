//! Colour-camera calibration: intrinsics plus depth→colour extrinsics.
use super::intrinsics::Intrinsics;
use super::pmatrix::ProjectionMatrix;
use nalgebra::{Matrix3, Matrix3x4, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid transform taking depth-camera points into the colour camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extrinsics {
    pub rotation: Matrix3<f64>,
    /// Translation in millimetres.
    pub translation: Vector3<f64>,
}

impl Default for Extrinsics {
    fn default() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }
}

impl Extrinsics {
    /// Build from roll/pitch/yaw (radians) and a translation.
    pub fn from_euler(roll: f64, pitch: f64, yaw: f64, translation: Vector3<f64>) -> Self {
        Self {
            rotation: Rotation3::from_euler_angles(roll, pitch, yaw).into_inner(),
            translation,
        }
    }

    pub fn apply(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Geodesic angle in degrees between the two rotations.
    pub fn rotation_error_deg(&self, other: &Extrinsics) -> f64 {
        let rel = self.rotation * other.rotation.transpose();
        let cos = ((rel.trace() - 1.0) * 0.5).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }
}

/// Full colour calibration in both representations' source form.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub intrinsics: Intrinsics,
    pub extrinsics: Extrinsics,
}

impl CalibrationModel {
    /// `P = K · [R | t]`.
    pub fn to_projection(&self) -> ProjectionMatrix {
        let mut rt = Matrix3x4::zeros();
        rt.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.extrinsics.rotation);
        rt.set_column(3, &self.extrinsics.translation);
        ProjectionMatrix::from_matrix(&(self.intrinsics.k_matrix() * rt))
    }

    /// Same model with the colour focal lengths replaced.
    pub fn with_focal(&self, fx: f64, fy: f64) -> Self {
        Self {
            intrinsics: self.intrinsics.with_focal(fx, fy),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CalibrationModel {
        CalibrationModel {
            intrinsics: Intrinsics {
                width: 640,
                height: 480,
                fx: 600.0,
                fy: 601.0,
                ppx: 320.0,
                ppy: 240.0,
                coeffs: [0.0; 5],
            },
            extrinsics: Extrinsics::from_euler(0.01, -0.02, 0.005, Vector3::new(20.0, 1.0, -0.5)),
        }
    }

    #[test]
    fn projection_matches_k_r_t() {
        let m = model();
        let p = m.to_projection();
        let v = Vector3::new(100.0, -50.0, 1200.0);
        let direct = m.intrinsics.k_matrix() * m.extrinsics.apply(&v);
        let via_p = p.transform(&v);
        assert!((direct - via_p).norm() < 1e-9);
    }

    #[test]
    fn rotation_error_of_known_roll() {
        let a = Extrinsics::default();
        let b = Extrinsics::from_euler(0.0, 0.0, 1f64.to_radians(), Vector3::zeros());
        assert!((a.rotation_error_deg(&b) - 1.0).abs() < 1e-9);
        assert!(a.rotation_error_deg(&a).abs() < 1e-6);
    }
}
