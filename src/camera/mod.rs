//! Camera models: intrinsics, depth→colour calibration, the 12-parameter
//! projection matrix and the projection collaborator used by the optimizer.

pub mod calibration;
pub mod intrinsics;
pub mod pmatrix;
pub mod projection;

pub use calibration::{CalibrationModel, Extrinsics};
pub use intrinsics::Intrinsics;
pub use pmatrix::ProjectionMatrix;
pub use projection::{nearest_rotation, PinholeProjection, PixelCoefficients, ProjectionModel};

/// Depth-stream intrinsics (rectilinear).
pub type DepthIntrinsics = Intrinsics;
/// Colour-stream intrinsics (Brown–Conrady).
pub type ColorIntrinsics = Intrinsics;
