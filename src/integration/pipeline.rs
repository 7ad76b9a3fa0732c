//! CameraPipeline for routing a camera's frames through a motion trigger.

use log::{debug, warn};
use thiserror::Error;

use crate::detector::{Frame, IntoFrame, MotionDetector, MotionTrigger};
use crate::error::MotionError;

use super::FrameSource;

/// Error raised while processing a camera's frames.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
    /// The frame source failed to deliver a frame.
    #[error("frame source failed: {0}")]
    Source(E),
    /// The frame was rejected by the motion trigger.
    #[error(transparent)]
    Motion(#[from] MotionError),
}

/// A frame ready to be displayed or recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFrame {
    /// The annotated frame when the trigger evaluated it, the input otherwise.
    pub frame: Frame,
    /// Whether this frame set off the trigger.
    pub triggered: bool,
    /// Changed-pixel count, if the frame was evaluated.
    pub changed_pixels: Option<usize>,
}

/// Couples one camera's frame source with its motion trigger.
///
/// The first frame a camera delivers is kept and becomes the background as
/// soon as a second frame arrives. From then on frames are compared while
/// the trigger is armed and passed through unchanged while it is idle.
pub struct CameraPipeline<S: FrameSource, T: MotionTrigger = MotionDetector> {
    source: S,
    trigger: T,
    previous: Option<Frame>,
    frames_processed: u64,
}

impl<S: FrameSource> CameraPipeline<S> {
    /// Create a pipeline with a default, idle [`MotionDetector`].
    pub fn with_default_detector(source: S) -> Self {
        Self::new(source, MotionDetector::new())
    }
}

impl<S: FrameSource, T: MotionTrigger> CameraPipeline<S, T> {
    pub fn new(source: S, trigger: T) -> Self {
        Self {
            source,
            trigger,
            previous: None,
            frames_processed: 0,
        }
    }

    /// Pull the next frame from the source and process it.
    ///
    /// # Returns
    /// `Ok(None)` once the source is exhausted.
    pub fn process_next(&mut self) -> Result<Option<ProcessedFrame>, PipelineError<S::Error>> {
        match self.source.next_frame().map_err(PipelineError::Source)? {
            Some(raw) => Ok(Some(self.process_frame(raw)?)),
            None => Ok(None),
        }
    }

    /// Process a frame delivered outside the source.
    pub fn process_frame<F: IntoFrame>(&mut self, frame: F) -> Result<ProcessedFrame, MotionError> {
        let frame = frame.into_frame().inspect_err(|e| warn!("dropping frame: {e}"))?;

        if !self.trigger.has_background() {
            if let Some(previous) = self.previous.take() {
                debug!("seeding background from {:?} frame", previous.dimensions());
                self.trigger.reset_background(previous);
            }
        }

        let processed = if self.trigger.is_active() && self.trigger.has_background() {
            let detection = self.trigger.detect(frame.clone())?;
            ProcessedFrame {
                frame: detection.frame,
                triggered: detection.triggered,
                changed_pixels: Some(detection.changed_pixels),
            }
        } else {
            ProcessedFrame {
                frame: frame.clone(),
                triggered: false,
                changed_pixels: None,
            }
        };

        self.previous = Some(frame);
        self.frames_processed += 1;
        Ok(processed)
    }

    /// Drain the source, returning how many frames set off the trigger.
    pub fn run(&mut self) -> Result<usize, PipelineError<S::Error>> {
        let mut triggers = 0;
        while let Some(processed) = self.process_next()? {
            if processed.triggered {
                triggers += 1;
            }
        }
        Ok(triggers)
    }

    /// Replace the background, e.g. after the camera changed resolution.
    pub fn reseed(&mut self, frame: Frame) {
        self.trigger.reset_background(frame);
        self.previous = None;
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Get a reference to the underlying frame source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the underlying frame source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Get a reference to the underlying motion trigger.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Get a mutable reference to the underlying motion trigger.
    pub fn trigger_mut(&mut self) -> &mut T {
        &mut self.trigger
    }
}
