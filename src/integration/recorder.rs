//! Incident bookkeeping for a single camera.

use chrono::{Duration, Local, NaiveDateTime};
use log::{debug, info};

use crate::detector::TriggerListener;

use super::incident::{Incident, IncidentTrigger};

/// How long a camera records after being triggered.
pub const RECORDING_WINDOW_SECS: i64 = 30;

#[derive(Debug, Clone)]
struct Recording {
    incident: Incident,
    until: NaiveDateTime,
}

/// Opens an incident when its camera's detector triggers and keeps the
/// camera recording for a fixed window.
///
/// Triggers arriving while a recording is in progress are ignored; the
/// window is never extended. Share it with a detector through an
/// `Arc<Mutex<IncidentRecorder>>` so the recording side can
/// [`poll`](Self::poll) it.
#[derive(Debug, Clone)]
pub struct IncidentRecorder {
    camera_name: String,
    window: Duration,
    current: Option<Recording>,
}

impl IncidentRecorder {
    pub fn new(camera_name: impl Into<String>) -> Self {
        Self {
            camera_name: camera_name.into(),
            window: Duration::seconds(RECORDING_WINDOW_SECS),
            current: None,
        }
    }

    /// Set the recording window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    /// The incident currently being recorded.
    pub fn current(&self) -> Option<&Incident> {
        self.current.as_ref().map(|r| &r.incident)
    }

    /// Start a motion incident at `now` unless already recording.
    ///
    /// # Returns
    /// Whether a new recording was started.
    pub fn motion_at(&mut self, now: NaiveDateTime) -> bool {
        let incident = Incident::new(
            now,
            self.camera_name.clone(),
            1,
            IncidentTrigger::MotionDetection,
            self.camera_name.clone(),
        );
        self.start(incident)
    }

    /// Start a manually requested incident at `now` unless already recording.
    ///
    /// `triggering_camera` and `number_of_cameras` describe the whole group
    /// of cameras asked to record together.
    pub fn start_manual(
        &mut self,
        now: NaiveDateTime,
        triggering_camera: impl Into<String>,
        number_of_cameras: u32,
    ) -> bool {
        let incident = Incident::new(
            now,
            triggering_camera,
            number_of_cameras,
            IncidentTrigger::Manual,
            self.camera_name.clone(),
        );
        self.start(incident)
    }

    fn start(&mut self, incident: Incident) -> bool {
        if self.is_recording() {
            debug!("{}: already recording, trigger ignored", self.camera_name);
            return false;
        }

        info!(
            "{}: recording incident {}",
            self.camera_name,
            incident.folder_name()
        );
        let until = incident.event_time + self.window;
        self.current = Some(Recording { incident, until });
        true
    }

    /// Finish the recording if its window has elapsed at `now`.
    ///
    /// # Returns
    /// The incident that just completed, if any.
    pub fn poll(&mut self, now: NaiveDateTime) -> Option<Incident> {
        if self.current.as_ref()?.until > now {
            return None;
        }

        let incident = self.current.take()?.incident;
        info!("{}: incident {} complete", self.camera_name, incident.folder_name());
        Some(incident)
    }
}

impl TriggerListener for IncidentRecorder {
    fn triggered(&mut self) {
        self.motion_at(Local::now().naive_local());
    }
}
