#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod camera;
pub mod config;
pub mod diagnostics;
pub mod dump;
pub mod error;
pub mod session;

// Pipeline stages; public for tools and tests.
pub mod angle;
pub mod edges;
pub mod features;
pub mod image;
pub mod optim;
pub mod secondary;

// --- High-level re-exports -------------------------------------------------

pub use crate::camera::{CalibrationModel, Extrinsics, Intrinsics, ProjectionMatrix};
pub use crate::diagnostics::{CalibrationOutcome, DiagnosticEvent};
pub use crate::error::{CalibError, Result};
pub use crate::secondary::{CalibrationMetadata, SecondaryModel};
pub use crate::session::{CalibrationParams, CalibrationSession};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use depth_rgb_calib::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> depth_rgb_calib::Result<()> {
/// let snapshot = load_dump(Path::new("dump"))?;
/// let session = CalibrationSession::new(
///     CalibrationParams::default(),
///     snapshot.depth,
///     snapshot.ir,
///     snapshot.color,
///     snapshot.calibration,
/// )?;
/// let outcome = session.optimize(|_| {})?;
/// println!("{}", outcome.summary());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::dump::load_dump;
    pub use crate::session::{ColorFrame, ColorInput, DepthInput};
    pub use crate::{
        CalibrationModel, CalibrationOutcome, CalibrationParams, CalibrationSession,
        DiagnosticEvent, Intrinsics,
    };
}
