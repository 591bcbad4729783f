//! Diagnostics delivered during and after a calibration run.
//!
//! [`DiagnosticEvent`]s reach the caller through the synchronous callback of
//! [`CalibrationSession::optimize`](crate::session::CalibrationSession::optimize),
//! one per inner-loop iteration and one per outer cycle. The final
//! [`CalibrationOutcome`] bundles the refined models with a timing trace.

pub mod events;
pub mod report;
pub mod timing;

pub use events::{CycleSnapshot, DiagnosticEvent, IterationSnapshot};
pub use report::CalibrationOutcome;
pub use timing::{StageTiming, TimingBreakdown};
