//! Error types for frame normalisation and motion detection.

use thiserror::Error;

/// Errors produced by the motion detector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MotionError {
    /// The frame could not be converted into the canonical 24-bit BGR layout.
    #[error("invalid frame format: {0}")]
    InvalidFrameFormat(String),
    /// The new frame and the background frame differ in size.
    #[error("frame is {got:?} but the background frame is {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        got: (u32, u32),
    },
    /// Motion detection was requested before a background frame was set.
    #[error("no background frame has been set")]
    NoBackground,
}

/// Errors produced when reading stored incidents back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncidentError {
    #[error("incident folder name {0:?} does not have the expected #date#camera#count#trigger layout")]
    MalformedName(String),
    #[error("invalid incident timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("invalid camera count {0:?}")]
    InvalidCameraCount(String),
}
