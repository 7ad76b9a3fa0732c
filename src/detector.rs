mod config;
mod frame;
mod listener;
mod motion_detector;
mod trigger;
mod trigger_state;

pub use config::DetectorConfig;
pub use frame::{CHANNELS, Frame, IntoFrame, PixelFormat, RawFrame};
pub use listener::{TriggerListener, Triggered};
pub use motion_detector::{Detection, HIGHLIGHT, MotionDetector};
pub use trigger::MotionTrigger;
pub use trigger_state::TriggerState;
