/// Whether a motion trigger is evaluating frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    /// Frames are passed through without evaluation
    #[default]
    Idle,
    /// Frames are compared against the background
    Armed,
}

impl TriggerState {
    /// The opposite state.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Self::Idle => Self::Armed,
            Self::Armed => Self::Idle,
        }
    }
}
