//! Transcoding engine seam.
//!
//! Workers drive encodes through [`EncodeEngine`]; the production
//! implementation shells out to ffmpeg via ladderforge-av. Tests substitute
//! a scripted engine, which is how the worker protocol is exercised without
//! real media.

use async_trait::async_trait;
use ladderforge_av::{encode, EncodeParams};
use ladderforge_common::{EncoderFamily, VideoSize};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Progress callback: percent complete, 0..=100.
pub type ProgressFn = Box<dyn FnMut(f64) + Send>;

/// External transcoding engine boundary.
#[async_trait]
pub trait EncodeEngine: Send + Sync {
    /// Run one encode to completion. Progress is reported through
    /// `on_progress`; `cancel` aborts the engine process.
    #[allow(clippy::too_many_arguments)]
    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        params: &EncodeParams,
        family: EncoderFamily,
        duration_secs: Option<f64>,
        on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> ladderforge_av::Result<()>;

    /// Extract `count` preview frames named `<base_name>-NN.png` at `size`.
    async fn screenshots(
        &self,
        input: &Path,
        output_folder: &Path,
        count: u32,
        base_name: &str,
        size: VideoSize,
        duration_secs: Option<f64>,
    ) -> ladderforge_av::Result<()>;
}

/// ffmpeg-backed engine.
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
}

impl FfmpegEngine {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }
}

#[async_trait]
impl EncodeEngine for FfmpegEngine {
    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        params: &EncodeParams,
        family: EncoderFamily,
        duration_secs: Option<f64>,
        mut on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> ladderforge_av::Result<()> {
        encode::run_encode(
            &self.ffmpeg,
            input,
            output,
            params,
            family,
            duration_secs,
            |pct| on_progress(pct),
            Some(cancel),
        )
        .await
    }

    async fn screenshots(
        &self,
        input: &Path,
        output_folder: &Path,
        count: u32,
        base_name: &str,
        size: VideoSize,
        duration_secs: Option<f64>,
    ) -> ladderforge_av::Result<()> {
        encode::take_screenshots(
            &self.ffmpeg,
            input,
            output_folder,
            count,
            base_name,
            size,
            duration_secs,
        )
        .await
    }
}
