//! Worker unit: isolated execution of one task's encode.
//!
//! A worker receives its instructions once at spawn, runs probe → encode →
//! (screenshots) strictly in sequence, and communicates only through its
//! message stream: zero or more PROGRESS messages followed by exactly one
//! terminal DONE or ERROR. A worker never returns an error to its caller.
//!
//! Stopping a running worker is supported through the handle's cancellation
//! token; an unstopped worker runs to natural completion or failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use ladderforge_av::EncodeParams;
use ladderforge_common::{EncoderFamily, VideoSize};
use ladderforge_db::models::Task;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::EncodeEngine;
use crate::probe::{max_av_duration, MediaProbe};

/// Frames extracted per screenshot pass.
const SCREENSHOT_COUNT: u32 = 6;

/// Protocol value emitted by a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// Percent complete, non-decreasing within one run.
    Progress { percent: f64 },
    /// Terminal: the encode (and any screenshots) finished.
    Done { elapsed_secs: f64 },
    /// Terminal: the task failed.
    Error { reason: String },
}

impl WorkerMessage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

impl std::fmt::Display for WorkerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Progress { percent } => write!(f, "Encoding: {}%", percent.round()),
            Self::Done { elapsed_secs } => {
                write!(f, "Encoding finished after {elapsed_secs:.1} s")
            }
            Self::Error { reason } => {
                write!(f, "An error occurred during encoding. {reason}")
            }
        }
    }
}

/// Everything a worker needs, captured at spawn time.
#[derive(Debug, Clone)]
pub struct EncodingInstructions {
    pub input_folder: PathBuf,
    pub input_asset: String,
    pub output_folder: PathBuf,
    pub output_asset: String,
    pub params: EncodeParams,
    pub screenshots: bool,
}

impl From<&Task> for EncodingInstructions {
    fn from(task: &Task) -> Self {
        Self {
            input_folder: PathBuf::from(&task.input_folder),
            input_asset: task.input_asset.clone(),
            output_folder: PathBuf::from(&task.output_folder),
            output_asset: task.output_asset.clone(),
            params: EncodeParams {
                video_encoder: task.video_encoder.clone(),
                video_size: task.video_size,
                video_bitrate: task.video_bitrate,
                video_fps: task.video_fps,
                audio_encoder: task.audio_encoder.clone(),
                audio_bitrate: task.audio_bitrate.clone(),
                audio_frequency: task.audio_frequency.clone(),
                audio_channels: task.audio_channels,
            },
            screenshots: task.screenshots,
        }
    }
}

/// Caller's end of a spawned worker.
pub struct WorkerHandle {
    /// The worker's message stream; closes after the terminal message.
    pub messages: mpsc::Receiver<WorkerMessage>,
    stop: CancellationToken,
}

impl WorkerHandle {
    /// Ask the worker to stop its encode. The worker still terminates
    /// through its message stream.
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

/// Spawns isolated workers over the probe/engine seams.
#[derive(Clone)]
pub struct WorkerUnit {
    probe: Arc<dyn MediaProbe>,
    engine: Arc<dyn EncodeEngine>,
}

impl WorkerUnit {
    pub fn new(probe: Arc<dyn MediaProbe>, engine: Arc<dyn EncodeEngine>) -> Self {
        Self { probe, engine }
    }

    /// Start one worker. Returns immediately; the run proceeds in its own
    /// tokio task and reports through the handle's message stream.
    pub fn spawn(&self, instructions: EncodingInstructions) -> WorkerHandle {
        let (tx, rx) = mpsc::channel(64);
        let stop = CancellationToken::new();

        let probe = Arc::clone(&self.probe);
        let engine = Arc::clone(&self.engine);
        let token = stop.clone();
        tokio::spawn(async move {
            run(probe, engine, instructions, tx, token).await;
        });

        WorkerHandle { messages: rx, stop }
    }
}

async fn run(
    probe: Arc<dyn MediaProbe>,
    engine: Arc<dyn EncodeEngine>,
    instructions: EncodingInstructions,
    tx: mpsc::Sender<WorkerMessage>,
    cancel: CancellationToken,
) {
    let started = Instant::now();
    let input = instructions.input_folder.join(&instructions.input_asset);
    let output = instructions.output_folder.join(&instructions.output_asset);

    tracing::debug!(input = %input.display(), output = %output.display(), "worker started");

    let configured_size = instructions.params.video_size;
    let mut resolved_size = configured_size;
    let mut duration_secs = None;

    // Probing is a refinement: it feeds rotation correction and progress
    // percentages. Its failure is non-fatal; a missing video stream is not.
    match probe.streams(&input).await {
        Ok(streams) => {
            let Some(video) = streams.iter().find(|s| s.is_video()) else {
                let _ = tx
                    .send(WorkerMessage::Error {
                        reason: format!("No video stream in {}", instructions.input_asset),
                    })
                    .await;
                return;
            };

            if video.is_rotated() || video.is_vertical() {
                resolved_size = resolved_size.swapped();
                tracing::info!("video will be rotated 90 degrees");
            }

            duration_secs = max_av_duration(&streams);
        }
        Err(e) => {
            tracing::error!("probe error: {e}");
        }
    }

    let Some(family) = EncoderFamily::from_encoder(&instructions.params.video_encoder) else {
        let _ = tx
            .send(WorkerMessage::Error {
                reason: format!(
                    "unsupported video encoder: {}",
                    instructions.params.video_encoder
                ),
            })
            .await;
        return;
    };

    let mut params = instructions.params.clone();
    params.video_size = resolved_size;

    // Forward engine progress without blocking the encode. Sends are
    // non-blocking (a full channel drops the update) and percentages are
    // clamped to be non-decreasing.
    let progress_tx = tx.clone();
    let mut last_percent = 0.0_f64;
    let on_progress = Box::new(move |percent: f64| {
        if percent < last_percent {
            return;
        }
        last_percent = percent;
        let _ = progress_tx.try_send(WorkerMessage::Progress { percent });
    });

    match engine
        .encode(
            &input,
            &output,
            &params,
            family,
            duration_secs,
            on_progress,
            &cancel,
        )
        .await
    {
        Ok(()) => {
            if instructions.screenshots {
                if let Err(e) = take_screenshots(
                    engine.as_ref(),
                    &output,
                    &instructions,
                    configured_size,
                    resolved_size,
                    duration_secs,
                )
                .await
                {
                    // Best-effort: a thumbnailing error never invalidates a
                    // finished encode.
                    tracing::error!("screenshots error: {e}");
                }
            }

            let _ = tx
                .send(WorkerMessage::Done {
                    elapsed_secs: started.elapsed().as_secs_f64(),
                })
                .await;
        }
        Err(e) => {
            tracing::error!("encode failed: {e}");
            let _ = tx
                .send(WorkerMessage::Error {
                    reason: e.to_string(),
                })
                .await;
        }
    }
}

/// Derive the screenshot base name from the known size/bitrate instead of
/// re-deriving it from the output filename, then extract one full-size and
/// one half-size set of frames.
async fn take_screenshots(
    engine: &dyn EncodeEngine,
    encoded_output: &Path,
    instructions: &EncodingInstructions,
    configured_size: VideoSize,
    resolved_size: VideoSize,
    duration_secs: Option<f64>,
) -> ladderforge_av::Result<()> {
    let base = screenshot_base_name(
        &instructions.output_asset,
        configured_size,
        instructions.params.video_bitrate,
    );

    tracing::info!(base = %base, "taking video thumbnails");

    engine
        .screenshots(
            encoded_output,
            &instructions.output_folder,
            SCREENSHOT_COUNT,
            &base,
            resolved_size,
            duration_secs,
        )
        .await?;

    engine
        .screenshots(
            encoded_output,
            &instructions.output_folder,
            SCREENSHOT_COUNT,
            &format!("{base}-thumb"),
            resolved_size.halved(),
            duration_secs,
        )
        .await
}

/// Strip the `_<width>_<height>_<bitrate>` suffix the splitter appended,
/// using the known values rather than pattern-matching the filename.
fn screenshot_base_name(output_asset: &str, size: VideoSize, bitrate: u32) -> String {
    let stem = Path::new(output_asset)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| output_asset.to_string());

    let suffix = format!("_{}_{}_{}", size.width, size.height, bitrate);
    stem.strip_suffix(suffix.as_str())
        .map(|s| s.to_string())
        .unwrap_or(stem)
}
