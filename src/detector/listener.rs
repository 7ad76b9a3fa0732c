//! Observers notified when motion crosses the trigger threshold.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

/// Message sent over a channel for every triggered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triggered;

/// Receives a notification each time the detector reports motion.
///
/// Listeners are called synchronously from inside
/// [`MotionDetector::detect_motion`](crate::MotionDetector::detect_motion),
/// exactly once per triggered frame, on the thread delivering frames.
/// Keep them short.
pub trait TriggerListener {
    fn triggered(&mut self);
}

/// Adapter turning a closure into a listener.
pub(crate) struct Callback<F>(pub(crate) F);

impl<F: FnMut()> TriggerListener for Callback<F> {
    fn triggered(&mut self) {
        (self.0)()
    }
}

impl TriggerListener for Sender<Triggered> {
    fn triggered(&mut self) {
        if self.send(Triggered).is_err() {
            log::debug!("trigger receiver has been dropped");
        }
    }
}

impl<L: TriggerListener> TriggerListener for Arc<Mutex<L>> {
    fn triggered(&mut self) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .triggered();
    }
}
