//! Frame-differencing motion detection for surveillance cameras.
//!
//! A [`MotionDetector`] compares every frame a camera delivers against a
//! stored background frame, highlights the pixels that changed, and notifies
//! its [`TriggerListener`]s when enough of the picture moved. Objects that
//! enter the view and stay put are absorbed into the background after a
//! while so they stop triggering.
//!
//! The [`integration`] module wires a detector to a [`FrameSource`] and to an
//! [`IncidentRecorder`] that tracks recording windows.

pub mod detector;
pub mod error;
pub mod integration;

pub use detector::{
    Detection, DetectorConfig, Frame, IntoFrame, MotionDetector, MotionTrigger, PixelFormat,
    RawFrame, TriggerListener, TriggerState, Triggered,
};
pub use error::{IncidentError, MotionError};
pub use integration::{
    CameraPipeline, FrameSource, Incident, IncidentRecorder, IncidentTrigger, PipelineError,
    ProcessedFrame, VecFrameSource,
};
