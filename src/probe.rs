//! Media probe seam.
//!
//! The splitter and workers depend on [`MediaProbe`]; production code uses
//! the ffprobe-backed adapter from ladderforge-av. Results are never cached:
//! callers that need fresh metadata re-probe.

use async_trait::async_trait;
use ladderforge_av::probe::{probe_streams, StreamInfo};
use std::path::{Path, PathBuf};

/// Stream inspection boundary.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Probe a file's streams. Fails on unreadable or unparseable input.
    async fn streams(&self, path: &Path) -> ladderforge_av::Result<Vec<StreamInfo>>;
}

/// ffprobe-backed probe adapter.
pub struct FfprobeAdapter {
    ffprobe: PathBuf,
}

impl FfprobeAdapter {
    pub fn new(ffprobe: PathBuf) -> Self {
        Self { ffprobe }
    }
}

#[async_trait]
impl MediaProbe for FfprobeAdapter {
    async fn streams(&self, path: &Path) -> ladderforge_av::Result<Vec<StreamInfo>> {
        probe_streams(&self.ffprobe, path).await
    }
}

/// Maximum duration across a file's video and audio streams, if any stream
/// reports one. Other stream kinds (subtitles, data) are ignored.
pub fn max_av_duration(streams: &[StreamInfo]) -> Option<f64> {
    streams
        .iter()
        .filter(|s| s.is_video() || s.is_audio())
        .filter_map(|s| s.duration_secs())
        .fold(None, |acc, d| Some(acc.map_or(d, |m: f64| m.max(d))))
}
