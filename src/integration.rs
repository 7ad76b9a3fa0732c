//! Integration module for connecting cameras and recorders to the detector.
//!
//! This module provides the frame source abstraction, a per-camera pipeline
//! that seeds and drives a motion trigger, and incident bookkeeping for the
//! recording side.

mod incident;
mod pipeline;
mod recorder;
mod source;

pub use incident::{FOLDER_TIME_FORMAT, Incident, IncidentTrigger};
pub use pipeline::{CameraPipeline, PipelineError, ProcessedFrame};
pub use recorder::{IncidentRecorder, RECORDING_WINDOW_SECS};
pub use source::{FrameSource, VecFrameSource};
