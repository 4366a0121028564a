//! Authoring profile registry: bitrate/resolution ladders for encoding.
//!
//! Profiles are defined in code and registered once at startup; the registry
//! is read-only afterwards and shared by reference, so concurrent lookups
//! need no locking. Adding a resolution/bitrate rung is a data change here,
//! not a code change in the splitter.

use ladderforge_common::VideoSize;
use std::collections::HashMap;

/// One rung of an authoring ladder.
#[derive(Debug, Clone)]
pub struct EncodeTrack {
    pub video_encoder: String,
    pub video_size: VideoSize,
    /// Video bitrate in kbit/s.
    pub video_bitrate: u32,
    pub video_fps: u32,
    pub audio_encoder: String,
    pub audio_bitrate: String,
    pub audio_frequency: String,
    pub audio_channels: u32,
    /// Extract preview images after a successful encode.
    pub screenshots: bool,
    /// Present on packaging tracks only (e.g. "mpd", "hls-fmp4").
    pub packager: Option<String>,
}

/// Immutable ladder definition for one profile key.
#[derive(Debug, Clone)]
pub struct AuthoringSpec {
    /// Inclusive source-duration ceiling in seconds, if the profile is only
    /// valid for short-form media.
    pub video_max_duration: Option<f64>,
    pub encoding_tracks: Vec<EncodeTrack>,
    pub packaging_tracks: Vec<EncodeTrack>,
}

/// Process-wide mapping from profile key to authoring spec.
#[derive(Debug)]
pub struct AuthoringRegistry {
    specs: HashMap<String, AuthoringSpec>,
}

/// A ladder rung with the shared defaults (25 fps, 320k/48kHz stereo audio).
fn rung(video_encoder: &str, width: u32, height: u32, bitrate: u32, audio_encoder: &str) -> EncodeTrack {
    EncodeTrack {
        video_encoder: video_encoder.to_string(),
        video_size: VideoSize::new(width, height),
        video_bitrate: bitrate,
        video_fps: 25,
        audio_encoder: audio_encoder.to_string(),
        audio_bitrate: "320k".to_string(),
        audio_frequency: "48000".to_string(),
        audio_channels: 2,
        screenshots: false,
        packager: None,
    }
}

impl AuthoringRegistry {
    /// Build the registry with the built-in profiles.
    pub fn builtin() -> Self {
        let mut specs = HashMap::new();

        specs.insert(
            "sb-x265-medium".to_string(),
            AuthoringSpec {
                video_max_duration: None,
                encoding_tracks: vec![
                    rung("libx265", 768, 432, 300, "copy"),
                    rung("libx265", 960, 540, 900, "copy"),
                    rung("libx265", 1280, 720, 2400, "copy"),
                ],
                packaging_tracks: vec![],
            },
        );

        // Short-form profile: sources longer than 31 s are rejected.
        specs.insert(
            "sb-x264-medium".to_string(),
            AuthoringSpec {
                video_max_duration: Some(31.0),
                encoding_tracks: vec![
                    EncodeTrack {
                        screenshots: true,
                        ..rung("libx264", 960, 540, 900, "aac")
                    },
                    rung("libx264", 1280, 720, 2400, "aac"),
                ],
                packaging_tracks: vec![],
            },
        );

        specs.insert(
            "sb-vp9-medium".to_string(),
            AuthoringSpec {
                video_max_duration: None,
                encoding_tracks: vec![
                    rung("libvpx-vp9", 768, 432, 300, "libopus"),
                    rung("libvpx-vp9", 960, 540, 900, "libopus"),
                    rung("libvpx-vp9", 1280, 720, 2400, "libopus"),
                ],
                packaging_tracks: vec![EncodeTrack {
                    packager: Some("mpd".to_string()),
                    ..rung("libvpx-vp9", 1280, 720, 2400, "libopus")
                }],
            },
        );

        Self { specs }
    }

    /// Look up a profile. Unknown keys are a sentinel `None`, never a panic:
    /// the splitter turns them into a job-level error.
    pub fn resolve(&self, key: &str) -> Option<&AuthoringSpec> {
        self.specs.get(key)
    }

    /// Registered profile keys, sorted for stable listing.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
