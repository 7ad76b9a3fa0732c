/// Thresholds for the motion detector.
///
/// The defaults were tuned empirically for a single webcam resolution and
/// are what [`MotionDetector::new`](crate::MotionDetector::new) uses.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    /// A channel differs when it lies outside `background ± channel_tolerance`.
    pub channel_tolerance: u8,
    /// Motion is reported when strictly more pixels than this differ.
    pub trigger_pixel_count: usize,
    /// Consecutive motion events whose changed-pixel counts differ by less
    /// than this are considered stalled.
    pub similarity_delta: usize,
    /// The background is replaced once the stalled streak exceeds this.
    pub stall_streak_limit: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            channel_tolerance: 65,
            trigger_pixel_count: 6500,
            similarity_delta: 350,
            stall_streak_limit: 75,
        }
    }
}
