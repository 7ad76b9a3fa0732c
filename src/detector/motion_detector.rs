//! Frame-differencing motion detector.

use std::cmp::Ordering;
use std::fmt;

use log::{debug, trace};
use ndarray::{Axis, Zip};

use crate::detector::config::DetectorConfig;
use crate::detector::frame::{CHANNELS, Frame, IntoFrame};
use crate::detector::listener::{Callback, TriggerListener};
use crate::detector::trigger::MotionTrigger;
use crate::detector::trigger_state::TriggerState;
use crate::error::MotionError;

/// Colour painted over every changed pixel: channel 2 at full intensity, the
/// other two channels cleared.
pub const HIGHLIGHT: [u8; CHANNELS] = [0, 0, 255];

/// Result of evaluating one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// The new frame with changed pixels painted in [`HIGHLIGHT`].
    pub frame: Frame,
    /// Whether motion crossed the trigger threshold.
    pub triggered: bool,
    /// Number of pixels that differ from the background.
    pub changed_pixels: usize,
}

/// Compares frames against a stored background and reports motion.
///
/// A detector is created once per camera and fed frames in order from a
/// single thread. The background is seeded with
/// [`set_background_frame`](Self::set_background_frame) and afterwards only
/// replaced when the scene has stalled: if more than
/// [`stall_streak_limit`](DetectorConfig::stall_streak_limit) consecutive
/// motion events change a similar number of pixels, an object has most likely
/// entered the view and stopped, so the current frame becomes the background.
pub struct MotionDetector {
    config: DetectorConfig,
    background: Option<Frame>,
    state: TriggerState,
    no_movement_streak: u32,
    previous_changed_count: usize,
    listeners: Vec<Box<dyn TriggerListener + Send>>,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MotionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionDetector")
            .field("config", &self.config)
            .field("has_background", &self.background.is_some())
            .field("state", &self.state)
            .field("no_movement_streak", &self.no_movement_streak)
            .field("previous_changed_count", &self.previous_changed_count)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MotionDetector {
    /// Create an idle detector with the default thresholds.
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            config,
            background: None,
            state: TriggerState::Idle,
            no_movement_streak: 0,
            previous_changed_count: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener invoked on every triggered frame.
    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: TriggerListener + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Register a closure invoked on every triggered frame.
    pub fn on_trigger<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.add_listener(Callback(callback));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Normalise `frame` and adopt it as the reference frame, discarding the
    /// previous one.
    pub fn set_background_frame<F: IntoFrame>(&mut self, frame: F) -> Result<(), MotionError> {
        let frame = frame.into_frame()?;
        self.adopt_background(frame);
        Ok(())
    }

    #[inline]
    pub fn has_background_frame(&self) -> bool {
        self.background.is_some()
    }

    pub fn background(&self) -> Option<&Frame> {
        self.background.as_ref()
    }

    pub fn set_active(&mut self, active: bool) {
        self.state = if active {
            TriggerState::Armed
        } else {
            TriggerState::Idle
        };
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TriggerState::Armed
    }

    #[inline]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Flip between armed and idle.
    pub fn activate_motion_trigger(&mut self) {
        self.state = self.state.toggled();
    }

    #[inline]
    pub fn no_movement_streak(&self) -> u32 {
        self.no_movement_streak
    }

    /// Changed-pixel count of the most recent triggered frame.
    #[inline]
    pub fn previous_changed_count(&self) -> usize {
        self.previous_changed_count
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Compare `frame` against the background.
    ///
    /// Every pixel with a channel outside the tolerance band is painted in
    /// [`HIGHLIGHT`] on a copy of the frame. When more pixels than the trigger
    /// count changed, listeners are notified and the stall tracking runs.
    ///
    /// Does not check [`is_active`](Self::is_active); callers only feed armed
    /// detectors.
    pub fn detect_motion<F: IntoFrame>(&mut self, frame: F) -> Result<Detection, MotionError> {
        let current = frame.into_frame()?;
        let background = self.background.as_ref().ok_or(MotionError::NoBackground)?;
        if current.dimensions() != background.dimensions() {
            return Err(MotionError::DimensionMismatch {
                expected: background.dimensions(),
                got: current.dimensions(),
            });
        }

        let mut annotated = current.clone();
        let changed_pixels =
            highlight_changes(&mut annotated, background, self.config.channel_tolerance);
        let triggered = changed_pixels > self.config.trigger_pixel_count;
        trace!("{changed_pixels} pixels changed, triggered: {triggered}");

        if triggered {
            debug!("motion detected: {changed_pixels} pixels changed");
            for listener in &mut self.listeners {
                listener.triggered();
            }
            self.track_stall(changed_pixels, current);
        }

        Ok(Detection {
            frame: annotated,
            triggered,
            changed_pixels,
        })
    }

    /// Update the stalled-motion streak after a triggered frame and swap in
    /// `current` as the background once the streak runs out.
    fn track_stall(&mut self, changed_pixels: usize, current: Frame) {
        let previous = self.previous_changed_count;
        let similar = self.config.similarity_delta;

        match previous.cmp(&changed_pixels) {
            Ordering::Greater => {
                if previous - changed_pixels < similar {
                    self.no_movement_streak += 1;
                }
            }
            Ordering::Less => {
                if changed_pixels - previous < similar {
                    self.no_movement_streak += 1;
                }
            }
            // Identical counts reset the streak.
            Ordering::Equal => self.no_movement_streak = 0,
        }

        if self.no_movement_streak > self.config.stall_streak_limit {
            debug!(
                "motion stalled for {} frames, replacing background",
                self.no_movement_streak
            );
            self.adopt_background(current);
            self.no_movement_streak = 0;
        }

        self.previous_changed_count = changed_pixels;
    }

    fn adopt_background(&mut self, frame: Frame) {
        trace!("background set to {:?} frame", frame.dimensions());
        self.background = Some(frame);
    }
}

impl MotionTrigger for MotionDetector {
    fn activate(&mut self) {
        self.activate_motion_trigger();
    }

    fn set_active(&mut self, active: bool) {
        MotionDetector::set_active(self, active);
    }

    fn is_active(&self) -> bool {
        self.state == TriggerState::Armed
    }

    fn has_background(&self) -> bool {
        self.has_background_frame()
    }

    fn reset_background(&mut self, frame: Frame) {
        self.adopt_background(frame);
    }

    fn detect(&mut self, frame: Frame) -> Result<Detection, MotionError> {
        self.detect_motion(frame)
    }
}

#[inline]
fn channel_differs(value: u8, reference: u8, tolerance: u8) -> bool {
    let (value, reference, tolerance) = (
        i16::from(value),
        i16::from(reference),
        i16::from(tolerance),
    );
    value < reference - tolerance || value > reference + tolerance
}

/// Paint every pixel of `frame` that differs from `background` and return
/// how many were painted. Both frames must have the same dimensions.
fn highlight_changes(frame: &mut Frame, background: &Frame, tolerance: u8) -> usize {
    let mut changed = 0;
    Zip::from(frame.pixels_mut().lanes_mut(Axis(2)))
        .and(background.pixels().lanes(Axis(2)))
        .for_each(|mut px, bg| {
            // Channels are checked in storage order; the first mismatch decides.
            if (0..CHANNELS).any(|c| channel_differs(px[c], bg[c], tolerance)) {
                for (c, value) in HIGHLIGHT.into_iter().enumerate() {
                    px[c] = value;
                }
                changed += 1;
            }
        });
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    /// Frame of `width`x`height` black pixels with the first `changed` pixels
    /// (row-major) raised to 200 in channel 2.
    fn frame_with_changes(width: u32, height: u32, changed: usize) -> Frame {
        let mut bytes = vec![0u8; (width * height) as usize * CHANNELS];
        for px in bytes.chunks_exact_mut(CHANNELS).take(changed) {
            px[2] = 200;
        }
        Frame::new(width, height, bytes).unwrap()
    }

    fn armed_detector() -> MotionDetector {
        let mut detector = MotionDetector::new();
        detector.set_active(true);
        detector
            .set_background_frame(Frame::filled(100, 100, [0, 0, 0]))
            .unwrap();
        detector
    }

    #[test]
    fn test_channel_tolerance_is_inclusive() {
        assert!(!channel_differs(165, 100, 65));
        assert!(channel_differs(166, 100, 65));
        assert!(!channel_differs(35, 100, 65));
        assert!(channel_differs(34, 100, 65));
        assert!(!channel_differs(0, 30, 65));
        assert!(!channel_differs(255, 200, 65));
    }

    #[test]
    fn test_identical_frame_has_no_changes() {
        let mut detector = armed_detector();
        let result = detector
            .detect_motion(Frame::filled(100, 100, [0, 0, 0]))
            .unwrap();
        assert_eq!(result.changed_pixels, 0);
        assert!(!result.triggered);
        assert_eq!(result.frame, Frame::filled(100, 100, [0, 0, 0]));
    }

    #[test]
    fn test_changed_pixels_are_highlighted() {
        let mut detector = MotionDetector::new();
        detector
            .set_background_frame(Frame::filled(2, 1, [100, 100, 100]))
            .unwrap();

        let mut frame = Frame::filled(2, 1, [100, 100, 100]);
        frame.set_pixel(1, 0, [100, 100, 170]);
        let result = detector.detect_motion(&frame).unwrap();

        assert_eq!(result.changed_pixels, 1);
        assert_eq!(result.frame.pixel(0, 0), Some([100, 100, 100]));
        assert_eq!(result.frame.pixel(1, 0), Some(HIGHLIGHT));
        // The caller's frame is untouched
        assert_eq!(frame.pixel(1, 0), Some([100, 100, 170]));
    }

    #[test]
    fn test_trigger_threshold_is_exclusive() {
        let mut detector = armed_detector();
        let at = detector.detect_motion(frame_with_changes(100, 100, 6500)).unwrap();
        assert_eq!(at.changed_pixels, 6500);
        assert!(!at.triggered);
        assert_eq!(detector.previous_changed_count(), 0);

        let over = detector.detect_motion(frame_with_changes(100, 100, 6501)).unwrap();
        assert!(over.triggered);
        assert_eq!(detector.previous_changed_count(), 6501);
    }

    #[test]
    fn test_listeners_fire_once_per_triggered_frame() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut detector = armed_detector();
        let counter = Arc::clone(&count);
        detector.on_trigger(move || {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });

        detector.detect_motion(frame_with_changes(100, 100, 8000)).unwrap();
        detector.detect_motion(frame_with_changes(100, 100, 10)).unwrap();
        detector.detect_motion(frame_with_changes(100, 100, 9000)).unwrap();
        assert_eq!(count.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_similar_counts_grow_streak() {
        let mut detector = armed_detector();
        detector.detect_motion(frame_with_changes(100, 100, 8000)).unwrap();
        // 0 -> 8000 is not similar
        assert_eq!(detector.no_movement_streak(), 0);

        detector.detect_motion(frame_with_changes(100, 100, 8100)).unwrap();
        assert_eq!(detector.no_movement_streak(), 1);
        detector.detect_motion(frame_with_changes(100, 100, 7900)).unwrap();
        assert_eq!(detector.no_movement_streak(), 2);

        // A large jump leaves the streak alone
        detector.detect_motion(frame_with_changes(100, 100, 9500)).unwrap();
        assert_eq!(detector.no_movement_streak(), 2);

        // Non-triggering frames touch nothing
        detector.detect_motion(frame_with_changes(100, 100, 100)).unwrap();
        assert_eq!(detector.no_movement_streak(), 2);
        assert_eq!(detector.previous_changed_count(), 9500);
    }

    #[test]
    fn test_equal_counts_reset_streak() {
        let mut detector = armed_detector();
        detector.detect_motion(frame_with_changes(100, 100, 8000)).unwrap();
        detector.detect_motion(frame_with_changes(100, 100, 8001)).unwrap();
        detector.detect_motion(frame_with_changes(100, 100, 8002)).unwrap();
        assert_eq!(detector.no_movement_streak(), 2);

        detector.detect_motion(frame_with_changes(100, 100, 8002)).unwrap();
        assert_eq!(detector.no_movement_streak(), 0);
    }

    #[test]
    fn test_missing_background() {
        let mut detector = MotionDetector::new();
        assert!(!detector.has_background_frame());
        assert_eq!(
            detector.detect_motion(Frame::filled(4, 4, [0, 0, 0])),
            Err(MotionError::NoBackground)
        );
    }

    #[test]
    fn test_empty_background_is_rejected() {
        let mut detector = MotionDetector::new();
        assert!(matches!(
            detector.set_background_frame(Frame::filled(0, 0, [0, 0, 0])),
            Err(MotionError::InvalidFrameFormat(_))
        ));
        assert!(!detector.has_background_frame());
    }

    #[test]
    fn test_dimension_mismatch_leaves_state_alone() {
        let mut detector = armed_detector();
        let err = detector
            .detect_motion(Frame::filled(50, 50, [255, 255, 255]))
            .unwrap_err();
        assert_eq!(
            err,
            MotionError::DimensionMismatch {
                expected: (100, 100),
                got: (50, 50)
            }
        );
        assert_eq!(detector.previous_changed_count(), 0);
        assert_eq!(detector.background().unwrap().dimensions(), (100, 100));
    }

    #[test]
    fn test_activate_toggles() {
        let mut detector = MotionDetector::new();
        assert_eq!(detector.state(), TriggerState::Idle);
        detector.activate_motion_trigger();
        assert!(detector.is_active());
        detector.activate_motion_trigger();
        assert!(!detector.is_active());
    }
}
