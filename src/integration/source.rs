//! Trait for frame-producing collaborators.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::mpsc::Receiver;

use crate::detector::RawFrame;

/// Trait for anything that produces camera frames in order.
///
/// Implement this trait to connect a capture backend to a
/// [`CameraPipeline`](super::CameraPipeline).
///
/// # Example
///
/// ```ignore
/// use motion_trigger::{FrameSource, PixelFormat, RawFrame};
///
/// struct MyCamera {
///     // Your capture handle here
/// }
///
/// impl FrameSource for MyCamera {
///     type Error = std::io::Error;
///
///     fn next_frame(&mut self) -> Result<Option<RawFrame>, Self::Error> {
///         // Grab a frame from the device
///         Ok(None)
///     }
/// }
/// ```
pub trait FrameSource {
    /// Error type for capture failures.
    type Error;

    /// Fetch the next frame.
    ///
    /// # Returns
    /// `Ok(None)` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<RawFrame>, Self::Error>;
}

/// Replays a fixed list of frames.
#[derive(Debug, Clone, Default)]
pub struct VecFrameSource {
    frames: VecDeque<RawFrame>,
}

impl VecFrameSource {
    pub fn new(frames: impl IntoIterator<Item = RawFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for VecFrameSource {
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<RawFrame>, Self::Error> {
        Ok(self.frames.pop_front())
    }
}

/// Frames handed over from a capture thread.
///
/// Serialises frames from a capture callback into one consumer, so a
/// detector is never called concurrently. The stream ends when every sender
/// has been dropped.
impl FrameSource for Receiver<RawFrame> {
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<RawFrame>, Self::Error> {
        Ok(self.recv().ok())
    }
}
