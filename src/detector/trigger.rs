//! Capability interface shared by motion triggers.

use crate::detector::frame::Frame;
use crate::detector::motion_detector::Detection;
use crate::error::MotionError;

/// A trigger that can be armed and fed frames.
///
/// [`MotionDetector`](crate::MotionDetector) is the only implementation in
/// this crate; the trait lets a camera pipeline drive alternative strategies
/// without knowing their internals.
pub trait MotionTrigger {
    /// Flip between armed and idle.
    fn activate(&mut self);

    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;

    /// Whether a reference frame is available for comparison.
    fn has_background(&self) -> bool;

    /// Replace the reference frame.
    fn reset_background(&mut self, frame: Frame);

    /// Evaluate a frame against the reference frame.
    fn detect(&mut self, frame: Frame) -> Result<Detection, MotionError>;
}
