//! Recorded incidents and their on-disk folder names.
//!
//! Every incident is stored in a folder named
//! `#<dd,MM,yyyy,HH,mm,ss>#<triggering camera>#<camera count>#<trigger>`
//! under the output root, with one sub-folder per recording camera.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::IncidentError;

/// Timestamp layout used in incident folder names.
pub const FOLDER_TIME_FORMAT: &str = "%d,%m,%Y,%H,%M,%S";

const SEPARATOR: char = '#';

/// What caused an incident to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IncidentTrigger {
    MotionDetection,
    Manual,
    /// A trigger name read from disk that this crate does not produce.
    Other(String),
}

impl IncidentTrigger {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MotionDetection => "Motion Detection",
            Self::Manual => "Manual",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for IncidentTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for IncidentTrigger {
    fn from(name: &str) -> Self {
        match name {
            "Motion Detection" => Self::MotionDetection,
            "Manual" => Self::Manual,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// A period of recording started by a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Incident {
    /// Local wall-clock time the incident was triggered
    pub event_time: NaiveDateTime,
    /// Camera that set off the incident
    pub triggering_camera: String,
    /// Number of cameras recording the incident
    pub number_of_cameras: u32,
    pub trigger: IncidentTrigger,
    /// Camera whose recording this is; unknown for incidents read from disk
    pub camera_name: Option<String>,
    /// Folder the incident was read from
    pub directory: Option<PathBuf>,
}

impl Incident {
    pub fn new(
        event_time: NaiveDateTime,
        triggering_camera: impl Into<String>,
        number_of_cameras: u32,
        trigger: IncidentTrigger,
        camera_name: impl Into<String>,
    ) -> Self {
        Self {
            event_time,
            triggering_camera: triggering_camera.into(),
            number_of_cameras,
            trigger,
            camera_name: Some(camera_name.into()),
            directory: None,
        }
    }

    /// Name of the folder the incident is stored in.
    pub fn folder_name(&self) -> String {
        format!(
            "{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.event_time.format(FOLDER_TIME_FORMAT),
            self.triggering_camera,
            self.number_of_cameras,
            self.trigger
        )
    }

    /// Path of this camera's recording below `root`.
    pub fn output_path(&self, root: impl AsRef<Path>) -> PathBuf {
        let camera = self
            .camera_name
            .as_deref()
            .unwrap_or(&self.triggering_camera);
        root.as_ref().join(self.folder_name()).join(camera)
    }

    /// Read an incident back from its folder path.
    pub fn from_folder_name(path: impl AsRef<Path>) -> Result<Self, IncidentError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut fields = name.split(SEPARATOR);
        let (Some(""), Some(time), Some(camera), Some(count), Some(trigger), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(IncidentError::MalformedName(name));
        };

        let event_time = NaiveDateTime::parse_from_str(time, FOLDER_TIME_FORMAT)
            .map_err(|_| IncidentError::InvalidTimestamp(time.to_owned()))?;
        let number_of_cameras = count
            .parse()
            .map_err(|_| IncidentError::InvalidCameraCount(count.to_owned()))?;

        Ok(Self {
            event_time,
            triggering_camera: camera.to_owned(),
            number_of_cameras,
            trigger: IncidentTrigger::from(trigger),
            camera_name: None,
            directory: Some(path.to_path_buf()),
        })
    }
}
