//! FFprobe-based stream probing and classification.
//!
//! Probing shells out to ffprobe and parses its JSON stream listing. The
//! classification predicates are pure functions over the fetched metadata;
//! nothing is cached, so every [`probe_streams`] call re-invokes the tool.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result, ToolCommand};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

/// One stream as reported by ffprobe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamInfo {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Duration in seconds, as a decimal string.
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: StreamTags,
}

/// Per-stream tags ffprobe surfaces; only the ones the workflow reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamTags {
    pub rotate: Option<String>,
    /// Matroska-style duration tag, either plain seconds or `HH:MM:SS.frac`.
    #[serde(rename = "DURATION")]
    pub duration: Option<String>,
}

impl StreamInfo {
    /// Whether this is a video stream.
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }

    /// Whether this is an audio stream.
    pub fn is_audio(&self) -> bool {
        self.codec_type.as_deref() == Some("audio")
    }

    /// Whether the stored frame is landscape (width >= height).
    pub fn is_horizontal(&self) -> bool {
        self.width.unwrap_or(0) >= self.height.unwrap_or(0)
    }

    /// Whether the stored frame is portrait (width < height).
    pub fn is_vertical(&self) -> bool {
        self.width.unwrap_or(0) < self.height.unwrap_or(0)
    }

    /// Whether the frame is stored landscape but tagged for 90/270-degree
    /// display rotation. Only an explicit rotate tag counts.
    pub fn is_rotated(&self) -> bool {
        if self.width.unwrap_or(0) > self.height.unwrap_or(0) {
            matches!(self.tags.rotate.as_deref(), Some("90") | Some("270"))
        } else {
            false
        }
    }

    /// Stream duration in seconds, preferring the primary `duration` field
    /// and falling back to the `DURATION` tag.
    pub fn duration_secs(&self) -> Option<f64> {
        if let Some(secs) = self.duration.as_deref().and_then(parse_duration_value) {
            return Some(secs);
        }
        self.tags.duration.as_deref().and_then(parse_duration_value)
    }
}

/// Parse a duration that is either plain seconds (`"40.5"`) or a Matroska
/// timestamp (`"00:24:00.416000000"`).
fn parse_duration_value(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return Some(secs);
    }

    let mut parts = s.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Probe a media file's streams using ffprobe.
pub async fn probe_streams(ffprobe: &Path, input: &Path) -> Result<Vec<StreamInfo>> {
    let output = ToolCommand::new(ffprobe.to_path_buf())
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(input.to_string_lossy())
        .execute()
        .await?;

    let parsed: FfprobeOutput = serde_json::from_str(&output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", e.to_string()))?;

    Ok(parsed.streams)
}
