//! Core enums and value types shared across ladderforge.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status shared by jobs and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    New,
    Running,
    Done,
    Error,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid workflow status: {}", s)),
        }
    }
}

/// Kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Encoding,
    Packaging,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding => write!(f, "encoding"),
            Self::Packaging => write!(f, "packaging"),
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encoding" => Ok(Self::Encoding),
            "packaging" => Ok(Self::Packaging),
            _ => Err(format!("Invalid task type: {}", s)),
        }
    }
}

/// A video resolution as a structured width/height pair.
///
/// Rotation correction swaps the components as a pure operation on this
/// type; the `"WxH"` string form exists only at the ffmpeg boundary and in
/// serialized records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The same size with width and height exchanged.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Half-resolution variant, used for thumbnail extraction.
    #[must_use]
    pub fn halved(self) -> Self {
        Self {
            width: self.width / 2,
            height: self.height / 2,
        }
    }
}

impl std::fmt::Display for VideoSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for VideoSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("Invalid video size: {}", s))?;
        let width = w
            .parse()
            .map_err(|_| format!("Invalid video width: {}", w))?;
        let height = h
            .parse()
            .map_err(|_| format!("Invalid video height: {}", h))?;
        Ok(Self { width, height })
    }
}

impl Serialize for VideoSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VideoSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The codec families the encode dispatcher knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderFamily {
    X264,
    X265,
    Vp9,
}

impl EncoderFamily {
    /// Classify an ffmpeg video encoder name. Unknown names return `None`;
    /// callers decide whether that is a default or an error.
    pub fn from_encoder(name: &str) -> Option<Self> {
        match name {
            "libx264" => Some(Self::X264),
            "libx265" => Some(Self::X265),
            "libvpx-vp9" => Some(Self::Vp9),
            _ => None,
        }
    }
}

/// Container extension for a video encoder name.
///
/// Total and deterministic: x264/x265 map to mp4, vp9 to webm, and anything
/// unrecognized falls back to mp4.
pub fn container_extension(video_encoder: &str) -> &'static str {
    match EncoderFamily::from_encoder(video_encoder) {
        Some(EncoderFamily::Vp9) => "webm",
        Some(EncoderFamily::X264) | Some(EncoderFamily::X265) | None => "mp4",
    }
}
