//! Crate-wide error type.
//!
//! Numeric degeneracies inside the feature pipeline (flat parabola fits,
//! rejected line-search steps, non-improving cycles) are policy, not errors,
//! and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a calibration session.
#[derive(Debug, Error)]
pub enum CalibError {
    /// Input frames or models violate the session contract.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A filtering stage or the gradient accumulation ran out of edges.
    #[error("insufficient features after {stage}: {count} remaining")]
    InsufficientFeatures { stage: &'static str, count: usize },
    /// Reading or writing a dump file failed.
    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CalibError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CalibError>;
