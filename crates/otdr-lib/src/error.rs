//! Error types for trace calibration and projection.

use thiserror::Error;

/// Deterministic, input-derived failures. Every variant names the offending
/// field so the caller can point at the broken part of the decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("missing required record block: {block}")]
    MissingInput { block: &'static str },

    #[error("invalid calibration: {field} = {value}")]
    InvalidCalibration { field: &'static str, value: i64 },

    #[error("degenerate scale factor: scale_factor = {value}")]
    DegenerateScaleFactor { value: i64 },

    #[error("n_points = {n_points} but only {available} samples are available")]
    IndexInconsistency { n_points: i64, available: usize },

    #[error("unsupported multi-regime trace: {field} has {count} entries, expected 1")]
    UnsupportedMultiRegimeTrace { field: &'static str, count: usize },
}

pub type Result<T> = std::result::Result<T, TraceError>;
